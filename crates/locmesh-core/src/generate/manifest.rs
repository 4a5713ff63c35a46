//! Manifest describing the last generation run.
//!
//! Written to `{root}/sitemap-manifest.json` after every run that reached the
//! commit phase. Deploy tooling diffs it to find changed documents without
//! hashing the tree itself.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::orchestrator::GenerationReport;
use super::publisher::PublishStatus;
use crate::{Error, Result};

/// The current schema version for [`PublishManifest`].
///
/// Bump this when making breaking changes to the manifest structure.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// File name of the manifest under the output root.
pub const MANIFEST_FILE: &str = "sitemap-manifest.json";

/// One published document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestDocument {
    /// Path relative to the output root.
    pub path: String,
    /// Entries in the document.
    pub entry_count: usize,
    /// Hex SHA-256 of the content.
    pub sha256: String,
    /// Whether this run changed the file.
    pub status: PublishStatus,
}

/// Manifest of a generation run.
///
/// ```rust
/// use chrono::NaiveDate;
/// use locmesh_core::generate::PublishManifest;
///
/// let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
/// let manifest = PublishManifest::new("20250601T000000-1", date);
/// assert!(manifest.is_compatible());
/// assert!(manifest.documents.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishManifest {
    /// Manifest schema version.
    pub schema_version: String,
    /// Generation date used for `<lastmod>`.
    pub generated_on: NaiveDate,
    /// Run identifier.
    pub run_id: String,
    /// Whether every locale and the master index were published.
    pub complete: bool,
    /// Documents committed by the run, sorted by path.
    pub documents: Vec<ManifestDocument>,
}

impl PublishManifest {
    /// Empty manifest for a run.
    pub fn new(run_id: impl Into<String>, generated_on: NaiveDate) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            generated_on,
            run_id: run_id.into(),
            complete: true,
            documents: Vec::new(),
        }
    }

    /// Manifest describing a finished run.
    pub fn from_report(report: &GenerationReport) -> Self {
        let mut documents: Vec<ManifestDocument> = report
            .documents
            .iter()
            .map(|doc| ManifestDocument {
                path: doc.location.relative_path(),
                entry_count: doc.entry_count,
                sha256: doc.sha256.clone(),
                status: doc.status,
            })
            .collect();
        documents.sort_by(|a, b| a.path.cmp(&b.path));

        Self {
            complete: report.is_complete(),
            documents,
            ..Self::new(report.run_id.clone(), report.generated_on)
        }
    }

    /// Whether this manifest was written by a compatible version.
    pub fn is_compatible(&self) -> bool {
        self.schema_version.split('.').next() == SCHEMA_VERSION.split('.').next()
    }

    /// Manifest path under `root`.
    pub fn path(root: &Path) -> PathBuf {
        root.join(MANIFEST_FILE)
    }

    /// Load the manifest under `root`, if one exists.
    pub fn load(root: &Path) -> Result<Option<Self>> {
        let path = Self::path(root);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path)?;
        let manifest: Self = serde_json::from_str(&json)?;
        Ok(Some(manifest))
    }

    /// Write the manifest under `root` via temp file and rename.
    pub fn save(&self, root: &Path) -> Result<()> {
        fs::create_dir_all(root)?;
        let path = Self::path(root);
        let json = serde_json::to_string_pretty(self)?;

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, format!("{json}\n"))
            .map_err(|e| Error::Publish(format!("Failed to write manifest: {e}")))?;

        #[cfg(target_os = "windows")]
        if path.exists() {
            fs::remove_file(&path)
                .map_err(|e| Error::Publish(format!("Failed to remove existing manifest: {e}")))?;
        }

        fs::rename(&tmp_path, &path)
            .map_err(|e| Error::Publish(format!("Failed to commit manifest: {e}")))?;

        debug!(path = %path.display(), documents = self.documents.len(), "Saved manifest");
        Ok(())
    }
}
