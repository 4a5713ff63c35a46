//! Batch generation and publishing of the sitemap tree.
//!
//! [`SitemapGenerator`] drives a [`crate::sitemap::SitemapPartitioner`] over
//! every active locale, stages the rendered documents with a
//! [`SitemapPublisher`], commits them in dependency order and records the run
//! in a [`PublishManifest`].
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use chrono::NaiveDate;
//! use locmesh_core::generate::{SitemapGenerator, SitemapPublisher};
//! use locmesh_core::route::SiteUrl;
//! use locmesh_core::sitemap::SitemapPartitioner;
//! use locmesh_core::store::SnapshotStore;
//!
//! # async fn demo() -> locmesh_core::Result<()> {
//! let store = Arc::new(SnapshotStore::load("snapshot.json".as_ref()).await?);
//! let site = SiteUrl::parse("https://haulcommand.com")?;
//! let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap_or_default();
//!
//! let report = SitemapGenerator::new(
//!     SitemapPartitioner::new(store, site, date),
//!     SitemapPublisher::new("public"),
//! )
//! .with_concurrency(8)
//! .run()
//! .await?;
//! assert!(report.is_complete());
//! # Ok(())
//! # }
//! ```

mod manifest;
mod orchestrator;
mod publisher;

pub use manifest::{MANIFEST_FILE, ManifestDocument, PublishManifest, SCHEMA_VERSION};
pub use orchestrator::{CancelFlag, GenerationFailure, GenerationReport, SitemapGenerator};
pub use publisher::{
    CommittedDocument, PublishStatus, STAGING_DIR, SitemapPublisher, StagedDocument, StagingArea,
    sha256_hex,
};
