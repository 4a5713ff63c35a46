//! # locmesh-core
//!
//! Multi-locale SEO plumbing for a programmatic page catalogue: resolving a
//! URL path to its localized variant, building the hreflang mesh that links
//! every translation of a concept, assembling the metadata contract a page
//! renders into `<head>`, and publishing a partitioned, hreflang-annotated
//! sitemap tree.
//!
//! ## Architecture
//!
//! - **Store**: [`store::VariantStore`] is the only way data comes in. Rows
//!   are validated once by [`store::StoreReader`].
//! - **Request path**: [`resolver::VariantResolver`] →
//!   [`mesh::HreflangMeshBuilder`] → [`metadata::MetadataAssembler`], wrapped
//!   by [`metadata::MetadataService`], which never fails.
//! - **Batch path**: [`sitemap::SitemapPartitioner`] renders documents,
//!   [`generate::SitemapGenerator`] fans out over locales and publishes them
//!   atomically, and [`health`] checks what was published.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use locmesh_core::metadata::MetadataService;
//! use locmesh_core::route::SiteUrl;
//! use locmesh_core::store::{Snapshot, SnapshotStore};
//!
//! # async fn demo() -> locmesh_core::Result<()> {
//! let store = Arc::new(SnapshotStore::new(Snapshot::default()));
//! let site = SiteUrl::parse("https://haulcommand.com")?;
//! let service = MetadataService::new(store, site, "Haul Command");
//!
//! let contract = service.metadata_for_path("/us/en/city/miami").await;
//! assert!(!contract.robots.index);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Absent data is never an error: unknown paths resolve to `None` and unknown
//! concepts to an empty mesh. Store failures surface as
//! [`Error::StoreUnavailable`] on the batch path and as a minimal `noindex`
//! contract on the request path.

/// Configuration loading and environment overrides
pub mod config;
/// Error types and result aliases
pub mod error;
/// Batch generation and atomic publishing of the sitemap tree
pub mod generate;
/// Health checks over a published sitemap tree
pub mod health;
/// hreflang mesh construction
pub mod mesh;
/// Metadata contract assembly
pub mod metadata;
/// Path to variant resolution
pub mod resolver;
/// Site URLs and path conventions
pub mod route;
/// Sitemap rendering, reading and locations
pub mod sitemap;
/// Store access seam and the snapshot store
pub mod store;
/// Core data types
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use generate::{CancelFlag, GenerationReport, SitemapGenerator, SitemapPublisher};
pub use health::{HealthReport, HealthStatus, check_published};
pub use mesh::HreflangMeshBuilder;
pub use metadata::{MetadataAssembler, MetadataContract, MetadataService};
pub use resolver::VariantResolver;
pub use route::SiteUrl;
pub use sitemap::{SitemapLocation, SitemapPartitioner};
pub use store::{SnapshotStore, VariantStore};
pub use types::*;
