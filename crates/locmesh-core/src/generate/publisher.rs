//! Staged, atomic publishing of sitemap documents.
//!
//! Documents are first written under `{root}/.staging/{run_id}/` mirroring
//! their final layout, then moved into place one `rename` at a time. A
//! reader of the published tree sees either the previous file or the new
//! one, never a partial write. The staging directory is removed when the
//! [`StagingArea`] is dropped, so an aborted run leaves nothing behind.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::sitemap::{SitemapDocument, SitemapLocation};
use crate::{Error, Result};

/// Directory under the output root holding in-flight runs.
pub const STAGING_DIR: &str = ".staging";

/// Hex SHA-256 of a byte slice.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Outcome of committing one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishStatus {
    /// The file was created or replaced.
    Written,
    /// The published file already had identical bytes.
    Unchanged,
}

/// A document written to staging, ready to commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedDocument {
    /// Final location.
    pub location: SitemapLocation,
    /// Path of the staged file.
    pub staged_path: PathBuf,
    /// Hex SHA-256 of the content.
    pub sha256: String,
    /// Entries in the document.
    pub entry_count: usize,
}

/// A document that is now live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommittedDocument {
    /// Published location.
    pub location: SitemapLocation,
    /// Hex SHA-256 of the content.
    pub sha256: String,
    /// Entries in the document.
    pub entry_count: usize,
    /// Whether the file changed.
    pub status: PublishStatus,
}

/// Scratch directory for one generation run.
#[derive(Debug)]
pub struct StagingArea {
    dir: PathBuf,
    run_id: String,
}

impl StagingArea {
    /// Staging directory of this run.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Run identifier.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Write a document into staging.
    pub fn stage(&self, document: &SitemapDocument) -> Result<StagedDocument> {
        let staged_path = document.location.file_path(&self.dir);
        if let Some(parent) = staged_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Publish(format!("Failed to create staging directory: {e}"))
            })?;
        }
        fs::write(&staged_path, document.xml.as_bytes())
            .map_err(|e| Error::Publish(format!("Failed to stage {}: {e}", document.location)))?;

        debug!(location = %document.location, "Staged sitemap document");
        Ok(StagedDocument {
            location: document.location.clone(),
            staged_path,
            sha256: sha256_hex(document.xml.as_bytes()),
            entry_count: document.entry_count,
        })
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.dir) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(dir = %self.dir.display(), error = %e, "Failed to remove staging directory");
            }
        }
        // Only succeeds once no other run is staging.
        if let Some(parent) = self.dir.parent() {
            let _ = fs::remove_dir(parent);
        }
    }
}

/// Publishes staged documents under an output root.
#[derive(Debug, Clone)]
pub struct SitemapPublisher {
    root: PathBuf,
}

impl SitemapPublisher {
    /// Create a publisher for `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Output root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Open a fresh staging area for `run_id`.
    pub fn begin(&self, run_id: &str) -> Result<StagingArea> {
        if run_id.is_empty() || run_id.contains(['/', '\\']) || run_id.starts_with('.') {
            return Err(Error::InvalidInput(format!("invalid run id '{run_id}'")));
        }
        let dir = self.root.join(STAGING_DIR).join(run_id);
        if dir.exists() {
            fs::remove_dir_all(&dir)
                .map_err(|e| Error::Publish(format!("Failed to clear stale staging: {e}")))?;
        }
        fs::create_dir_all(&dir)
            .map_err(|e| Error::Publish(format!("Failed to create staging directory: {e}")))?;
        Ok(StagingArea {
            dir,
            run_id: run_id.to_string(),
        })
    }

    /// Move one staged document into place.
    ///
    /// Identical published bytes are left untouched.
    pub fn commit(&self, staged: &StagedDocument) -> Result<CommittedDocument> {
        let path = staged.location.file_path(&self.root);

        let status = if fs::read(&path).is_ok_and(|bytes| sha256_hex(&bytes) == staged.sha256) {
            PublishStatus::Unchanged
        } else {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| {
                    Error::Publish(format!("Failed to create {}: {e}", parent.display()))
                })?;
            }

            // Handle Windows: remove target before rename
            #[cfg(target_os = "windows")]
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    Error::Publish(format!("Failed to remove existing {}: {e}", staged.location))
                })?;
            }

            fs::rename(&staged.staged_path, &path)
                .map_err(|e| Error::Publish(format!("Failed to commit {}: {e}", staged.location)))?;
            PublishStatus::Written
        };

        debug!(location = %staged.location, ?status, "Committed sitemap document");
        Ok(CommittedDocument {
            location: staged.location.clone(),
            sha256: staged.sha256.clone(),
            entry_count: staged.entry_count,
            status,
        })
    }

    /// Commit several documents, partitions before indexes before the master.
    pub fn commit_all(&self, staged: &[StagedDocument]) -> Result<Vec<CommittedDocument>> {
        let mut ordered: Vec<&StagedDocument> = staged.iter().collect();
        ordered.sort_by_key(|doc| doc.location.tier());
        ordered.into_iter().map(|doc| self.commit(doc)).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::LocaleCode;
    use tempfile::TempDir;

    fn doc(location: SitemapLocation, xml: &str) -> SitemapDocument {
        SitemapDocument {
            location,
            xml: xml.to_string(),
            entry_count: 1,
        }
    }

    fn partition() -> SitemapLocation {
        SitemapLocation::partition(&LocaleCode::new("US", "en"), "city")
    }

    #[test]
    fn stage_then_commit_moves_file_into_place() {
        let temp = TempDir::new().unwrap();
        let publisher = SitemapPublisher::new(temp.path());
        let staging = publisher.begin("run-1").unwrap();

        let staged = staging.stage(&doc(partition(), "<urlset/>")).unwrap();
        assert!(staged.staged_path.starts_with(temp.path().join(".staging/run-1")));
        assert!(!partition().file_path(temp.path()).exists());

        let committed = publisher.commit(&staged).unwrap();
        assert_eq!(committed.status, PublishStatus::Written);
        assert_eq!(
            fs::read_to_string(temp.path().join("sitemaps/us-en/city.xml")).unwrap(),
            "<urlset/>"
        );
    }

    #[test]
    fn identical_bytes_are_not_rewritten() {
        let temp = TempDir::new().unwrap();
        let publisher = SitemapPublisher::new(temp.path());

        for expected in [PublishStatus::Written, PublishStatus::Unchanged] {
            let staging = publisher.begin("run").unwrap();
            let staged = staging.stage(&doc(SitemapLocation::Master, "<x/>")).unwrap();
            assert_eq!(publisher.commit(&staged).unwrap().status, expected);
        }

        let staging = publisher.begin("run").unwrap();
        let staged = staging.stage(&doc(SitemapLocation::Master, "<y/>")).unwrap();
        assert_eq!(publisher.commit(&staged).unwrap().status, PublishStatus::Written);
    }

    #[test]
    fn dropping_staging_leaves_no_trace() {
        let temp = TempDir::new().unwrap();
        let publisher = SitemapPublisher::new(temp.path());
        {
            let staging = publisher.begin("aborted").unwrap();
            staging.stage(&doc(partition(), "<urlset/>")).unwrap();
        }
        assert!(!temp.path().join(STAGING_DIR).exists());
        assert!(!partition().file_path(temp.path()).exists());
    }

    #[test]
    fn commit_all_orders_by_tier() {
        let temp = TempDir::new().unwrap();
        let publisher = SitemapPublisher::new(temp.path());
        let staging = publisher.begin("ordered").unwrap();
        let us_en = LocaleCode::new("US", "en");
        let staged = vec![
            staging.stage(&doc(SitemapLocation::Master, "m")).unwrap(),
            staging.stage(&doc(SitemapLocation::locale_index(&us_en), "i")).unwrap(),
            staging.stage(&doc(partition(), "p")).unwrap(),
        ];

        let committed = publisher.commit_all(&staged).unwrap();
        let tiers: Vec<u8> = committed.iter().map(|c| c.location.tier()).collect();
        assert_eq!(tiers, [0, 1, 2]);
    }

    #[test]
    fn rejects_path_like_run_ids() {
        let temp = TempDir::new().unwrap();
        let publisher = SitemapPublisher::new(temp.path());
        for id in ["", "../x", "a/b", ".hidden"] {
            assert!(publisher.begin(id).is_err(), "{id}");
        }
    }

    #[test]
    fn sha256_is_lower_hex() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
