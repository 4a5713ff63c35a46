//! Command implementations for the locmesh CLI.

pub mod generate;
pub mod health;
pub mod mesh;
pub mod meta;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use locmesh_core::{Config, SnapshotStore};

use crate::cli::Cli;
use crate::output::OutputFormat;

/// Settings every command needs.
pub struct Context {
    pub config: Config,
    pub format: OutputFormat,
}

impl Context {
    /// Resolve configuration and apply global flags.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
        if let Some(snapshot) = &cli.snapshot {
            config.store.snapshot.clone_from(snapshot);
        }
        Ok(Self {
            config,
            format: cli.format,
        })
    }

    /// Load the configured store snapshot.
    pub async fn store(&self) -> Result<Arc<SnapshotStore>> {
        let path = &self.config.store.snapshot;
        let store = SnapshotStore::load(path)
            .await
            .with_context(|| format!("Failed to load store snapshot {}", path.display()))?;
        Ok(Arc::new(store))
    }

    /// Output root, preferring a command-line override.
    pub fn output_dir(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.unwrap_or_else(|| self.config.sitemap.output_dir.clone())
    }
}
