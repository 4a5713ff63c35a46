//! Configuration for locmesh.
//!
//! Settings live in a TOML file with three sections:
//!
//! ```toml
//! [site]
//! base_url = "https://haulcommand.com"
//! name = "Haul Command"
//!
//! [store]
//! snapshot = "data/snapshot.json"
//!
//! [sitemap]
//! output_dir = "public"
//! concurrency = 4
//! ```
//!
//! ## Resolution order
//!
//! 1. An explicit path (`--config`)
//! 2. `LOCMESH_CONFIG`
//! 3. `global.toml` in the platform config directory
//!    (e.g. `~/.config/locmesh/global.toml` on Linux)
//! 4. Built-in defaults
//!
//! Explicit paths must exist; a missing global file falls back to defaults.
//! Relative paths inside a file are resolved against the file's directory.
//! `LOCMESH_BASE_URL` and `LOCMESH_OUTPUT_DIR` override whatever was loaded.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::route::SiteUrl;
use crate::{Error, Result};

/// Environment variable naming a config file.
pub const ENV_CONFIG: &str = "LOCMESH_CONFIG";
/// Environment override for `site.base_url`.
pub const ENV_BASE_URL: &str = "LOCMESH_BASE_URL";
/// Environment override for `sitemap.output_dir`.
pub const ENV_OUTPUT_DIR: &str = "LOCMESH_OUTPUT_DIR";

const DEFAULT_BASE_URL: &str = "https://haulcommand.com";
const DEFAULT_SITE_NAME: &str = "Haul Command";
const MAX_CONCURRENCY: usize = 32;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Public site identity.
    pub site: SiteConfig,
    /// Where variant data comes from.
    pub store: StoreConfig,
    /// Sitemap generation settings.
    pub sitemap: SitemapConfig,
}

/// `[site]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Absolute origin prefixed to every path.
    pub base_url: SiteUrl,
    /// Brand name used in titles and `og:site_name`.
    pub name: String,
}

/// `[store]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON snapshot of locales, concepts and variants.
    pub snapshot: PathBuf,
}

/// `[sitemap]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SitemapConfig {
    /// Root of the published tree.
    pub output_dir: PathBuf,
    /// Locales rendered concurrently.
    pub concurrency: usize,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: SiteUrl::from_trusted(DEFAULT_BASE_URL),
            name: DEFAULT_SITE_NAME.to_string(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            snapshot: directories::ProjectDirs::from("com", "haulcommand", "locmesh").map_or_else(
                || PathBuf::from("snapshot.json"),
                |dirs| dirs.data_dir().join("snapshot.json"),
            ),
        }
    }
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("public"),
            concurrency: 4,
        }
    }
}

impl Config {
    /// Load configuration following the resolution order, then apply
    /// environment overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = explicit {
            Self::from_file(path)?
        } else if let Some(path) = std::env::var_os(ENV_CONFIG).filter(|v| !v.is_empty()) {
            Self::from_file(Path::new(&path))?
        } else {
            match Self::global_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => {
                    debug!("No config file found; using defaults");
                    Self::default()
                },
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file. Relative paths are resolved against its directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        let mut config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {e}")))?;

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            config.store.snapshot = resolve(dir, &config.store.snapshot);
            config.sitemap.output_dir = resolve(dir, &config.sitemap.output_dir);
        }
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Platform location of `global.toml`, when one can be determined.
    pub fn global_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "haulcommand", "locmesh")
            .map(|dirs| dirs.config_dir().join("global.toml"))
    }

    /// Apply `LOCMESH_BASE_URL` and `LOCMESH_OUTPUT_DIR` as read by `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(base_url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            self.site.base_url = SiteUrl::parse(&base_url)
                .map_err(|e| Error::Config(format!("{ENV_BASE_URL}: {e}")))?;
        }
        if let Some(output_dir) = lookup(ENV_OUTPUT_DIR).filter(|v| !v.trim().is_empty()) {
            self.sitemap.output_dir = PathBuf::from(output_dir);
        }
        Ok(())
    }

    /// Reject settings no run could use.
    pub fn validate(&self) -> Result<()> {
        if self.site.name.trim().is_empty() {
            return Err(Error::Config("site.name must not be empty".into()));
        }
        if !(1..=MAX_CONCURRENCY).contains(&self.sitemap.concurrency) {
            return Err(Error::Config(format!(
                "sitemap.concurrency must be between 1 and {MAX_CONCURRENCY}, got {}",
                self.sitemap.concurrency
            )));
        }
        Ok(())
    }
}

fn resolve(dir: &Path, path: &Path) -> PathBuf {
    if path.is_relative() {
        dir.join(path)
    } else {
        path.to_path_buf()
    }
}
