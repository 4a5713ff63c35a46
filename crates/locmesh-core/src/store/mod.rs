//! Store-access seam.
//!
//! The content pipeline owns the data; this crate only reads it through
//! [`VariantStore`]. Implementations hand back loosely-typed rows and
//! [`StoreReader`] turns them into validated [`crate::Variant`] and
//! [`crate::Locale`] values, so schema drift is caught at one boundary.
//!
//! ## Ordering contract
//!
//! [`VariantStore::variants_for_concept`] returns rows ordered by
//! `(country_code, language_code, path)` ascending. The `x-default` fallback
//! ("first variant if none is flagged") depends on it, so [`StoreReader`]
//! re-sorts rows rather than trusting incidental query order.
//!
//! ## Example
//!
//! ```rust
//! use locmesh_core::store::{SnapshotStore, StoreReader, Snapshot};
//! use std::sync::Arc;
//!
//! # async fn demo() -> locmesh_core::Result<()> {
//! let store = Arc::new(SnapshotStore::new(Snapshot::default()));
//! let reader = StoreReader::new(store);
//! assert!(reader.variant_by_path("/us/en/city/miami").await?.is_none());
//! # Ok(())
//! # }
//! ```

mod reader;
mod snapshot;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{ConceptId, LocaleCode, Result};

pub(crate) use reader::parse_timestamp;
#[cfg(test)]
pub(crate) use reader::parse_variant;
pub use reader::{RowOutcome, StoreReader};
pub use snapshot::{Snapshot, SnapshotStore};

/// A variant row exactly as the store returns it.
///
/// Every field is optional; [`StoreReader`] decides what is required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawVariantRow {
    /// Owning concept id.
    pub concept_id: Option<i64>,
    /// Country of the variant's locale.
    pub country_code: Option<String>,
    /// Language of the variant's locale.
    pub language_code: Option<String>,
    /// hreflang tag of the variant's locale.
    pub hreflang: Option<String>,
    /// URL path.
    pub path: Option<String>,
    /// Canonical path override.
    pub canonical_path: Option<String>,
    /// Page title.
    pub title: Option<String>,
    /// Meta description.
    pub meta_description: Option<String>,
    /// `preview`, `noindex` or `index`.
    pub indexing_mode: Option<String>,
    /// Pipeline quality score.
    pub quality_score: Option<f64>,
    /// RFC 3339 timestamp or `YYYY-MM-DD`.
    pub updated_at: Option<String>,
    /// Sitemap partition key.
    pub template_key: Option<String>,
    /// Default flag for `x-default`.
    pub is_default: Option<bool>,
    /// `default_eligible` of the variant's locale, joined in by the store.
    /// Absent means eligible.
    pub default_eligible: Option<bool>,
}

/// A locale row exactly as the store returns it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawLocaleRow {
    /// Country code.
    pub country_code: Option<String>,
    /// Language code.
    pub language_code: Option<String>,
    /// hreflang tag.
    pub hreflang: Option<String>,
    /// Active flag.
    pub is_active: Option<bool>,
    /// Whether the locale may serve `x-default`.
    pub default_eligible: Option<bool>,
}

/// Read-only query surface of the content store.
///
/// Construct one per process (or per request scope) and share it behind an
/// `Arc`. Absent rows are `Ok(None)` / empty vectors; only transport failures
/// are errors, reported as [`crate::Error::StoreUnavailable`].
#[async_trait]
pub trait VariantStore: Send + Sync {
    /// Fetch one variant by exact `path` (no normalization).
    async fn variant_by_path(&self, path: &str) -> Result<Option<RawVariantRow>>;

    /// Fetch every variant of a concept, ordered by
    /// `(country_code, language_code, path)`.
    async fn variants_for_concept(&self, concept_id: ConceptId) -> Result<Vec<RawVariantRow>>;

    /// Fetch every variant of several concepts in one round trip.
    ///
    /// The default issues one query per concept; stores that can filter on a
    /// set of ids should override it.
    async fn variants_for_concepts(&self, concept_ids: &[ConceptId]) -> Result<Vec<RawVariantRow>> {
        let mut rows = Vec::new();
        for id in concept_ids {
            rows.extend(self.variants_for_concept(*id).await?);
        }
        Ok(rows)
    }

    /// Fetch indexable variants of a locale, optionally narrowed to one
    /// template, ordered by `path`.
    async fn indexable_variants(
        &self,
        locale: &LocaleCode,
        template_key: Option<&str>,
    ) -> Result<Vec<RawVariantRow>>;

    /// Fetch every active locale.
    async fn active_locales(&self) -> Result<Vec<RawLocaleRow>>;
}

#[async_trait]
impl<S: VariantStore + ?Sized> VariantStore for std::sync::Arc<S> {
    async fn variant_by_path(&self, path: &str) -> Result<Option<RawVariantRow>> {
        (**self).variant_by_path(path).await
    }

    async fn variants_for_concept(&self, concept_id: ConceptId) -> Result<Vec<RawVariantRow>> {
        (**self).variants_for_concept(concept_id).await
    }

    async fn variants_for_concepts(&self, concept_ids: &[ConceptId]) -> Result<Vec<RawVariantRow>> {
        (**self).variants_for_concepts(concept_ids).await
    }

    async fn indexable_variants(
        &self,
        locale: &LocaleCode,
        template_key: Option<&str>,
    ) -> Result<Vec<RawVariantRow>> {
        (**self).indexable_variants(locale, template_key).await
    }

    async fn active_locales(&self) -> Result<Vec<RawLocaleRow>> {
        (**self).active_locales().await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fakes shared by unit tests across the crate.

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::Error;

    /// Build a variant row with sensible defaults.
    pub fn row(concept: i64, country: &str, language: &str, path: &str) -> RawVariantRow {
        RawVariantRow {
            concept_id: Some(concept),
            country_code: Some(country.to_string()),
            language_code: Some(language.to_string()),
            hreflang: Some(format!("{language}-{}", country.to_ascii_uppercase())),
            path: Some(path.to_string()),
            title: Some(String::new()),
            indexing_mode: Some("index".to_string()),
            quality_score: Some(0.5),
            template_key: Some(
                path.split('/')
                    .nth(3)
                    .unwrap_or("misc")
                    .to_string(),
            ),
            is_default: Some(false),
            ..RawVariantRow::default()
        }
    }

    /// Build an active locale row.
    pub fn locale(country: &str, language: &str) -> RawLocaleRow {
        RawLocaleRow {
            country_code: Some(country.to_string()),
            language_code: Some(language.to_string()),
            hreflang: Some(format!("{language}-{}", country.to_ascii_uppercase())),
            is_active: Some(true),
            default_eligible: Some(true),
        }
    }

    /// Counts calls per query so tests can assert on fan-out.
    pub struct CountingStore<S> {
        pub inner: S,
        pub by_path: AtomicUsize,
        pub for_concept: AtomicUsize,
        pub for_concepts: AtomicUsize,
        pub indexable: AtomicUsize,
    }

    impl<S> CountingStore<S> {
        pub fn new(inner: S) -> Arc<Self> {
            Arc::new(Self {
                inner,
                by_path: AtomicUsize::new(0),
                for_concept: AtomicUsize::new(0),
                for_concepts: AtomicUsize::new(0),
                indexable: AtomicUsize::new(0),
            })
        }

        pub fn mesh_queries(&self) -> usize {
            self.for_concept.load(Ordering::SeqCst) + self.for_concepts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl<S: VariantStore> VariantStore for CountingStore<S> {
        async fn variant_by_path(&self, path: &str) -> Result<Option<RawVariantRow>> {
            self.by_path.fetch_add(1, Ordering::SeqCst);
            self.inner.variant_by_path(path).await
        }

        async fn variants_for_concept(&self, concept_id: ConceptId) -> Result<Vec<RawVariantRow>> {
            self.for_concept.fetch_add(1, Ordering::SeqCst);
            self.inner.variants_for_concept(concept_id).await
        }

        async fn variants_for_concepts(
            &self,
            concept_ids: &[ConceptId],
        ) -> Result<Vec<RawVariantRow>> {
            self.for_concepts.fetch_add(1, Ordering::SeqCst);
            self.inner.variants_for_concepts(concept_ids).await
        }

        async fn indexable_variants(
            &self,
            locale: &LocaleCode,
            template_key: Option<&str>,
        ) -> Result<Vec<RawVariantRow>> {
            self.indexable.fetch_add(1, Ordering::SeqCst);
            self.inner.indexable_variants(locale, template_key).await
        }

        async fn active_locales(&self) -> Result<Vec<RawLocaleRow>> {
            self.inner.active_locales().await
        }
    }

    /// A store that only implements the per-concept query, so the default
    /// batch implementation is exercised.
    pub struct PerConceptOnly<S>(pub S);

    #[async_trait]
    impl<S: VariantStore> VariantStore for PerConceptOnly<S> {
        async fn variant_by_path(&self, path: &str) -> Result<Option<RawVariantRow>> {
            self.0.variant_by_path(path).await
        }

        async fn variants_for_concept(&self, concept_id: ConceptId) -> Result<Vec<RawVariantRow>> {
            self.0.variants_for_concept(concept_id).await
        }

        async fn indexable_variants(
            &self,
            locale: &LocaleCode,
            template_key: Option<&str>,
        ) -> Result<Vec<RawVariantRow>> {
            self.0.indexable_variants(locale, template_key).await
        }

        async fn active_locales(&self) -> Result<Vec<RawLocaleRow>> {
            self.0.active_locales().await
        }
    }

    fn down() -> Error {
        Error::StoreUnavailable("connection refused".to_string())
    }

    /// A store whose every query fails.
    pub struct DownStore;

    #[async_trait]
    impl VariantStore for DownStore {
        async fn variant_by_path(&self, _path: &str) -> Result<Option<RawVariantRow>> {
            Err(down())
        }

        async fn variants_for_concept(&self, _concept_id: ConceptId) -> Result<Vec<RawVariantRow>> {
            Err(down())
        }

        async fn indexable_variants(
            &self,
            _locale: &LocaleCode,
            _template_key: Option<&str>,
        ) -> Result<Vec<RawVariantRow>> {
            Err(down())
        }

        async fn active_locales(&self) -> Result<Vec<RawLocaleRow>> {
            Err(down())
        }
    }

    /// Delegates everything except partition queries for one template.
    pub struct FailingPartition {
        pub inner: SnapshotStore,
        pub locale: LocaleCode,
        pub template_key: String,
    }

    #[async_trait]
    impl VariantStore for FailingPartition {
        async fn variant_by_path(&self, path: &str) -> Result<Option<RawVariantRow>> {
            self.inner.variant_by_path(path).await
        }

        async fn variants_for_concept(&self, concept_id: ConceptId) -> Result<Vec<RawVariantRow>> {
            self.inner.variants_for_concept(concept_id).await
        }

        async fn variants_for_concepts(
            &self,
            concept_ids: &[ConceptId],
        ) -> Result<Vec<RawVariantRow>> {
            self.inner.variants_for_concepts(concept_ids).await
        }

        async fn indexable_variants(
            &self,
            locale: &LocaleCode,
            template_key: Option<&str>,
        ) -> Result<Vec<RawVariantRow>> {
            if *locale == self.locale && template_key == Some(self.template_key.as_str()) {
                return Err(down());
            }
            self.inner.indexable_variants(locale, template_key).await
        }

        async fn active_locales(&self) -> Result<Vec<RawLocaleRow>> {
            self.inner.active_locales().await
        }
    }
}
