//! In-memory store loaded from a JSON export.

use std::collections::BTreeSet;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{RawLocaleRow, RawVariantRow, VariantStore};
use crate::{Concept, ConceptId, Error, LocaleCode, Result};

/// A JSON export of the content store.
///
/// ```json
/// {
///   "locales":  [{ "country_code": "US", "language_code": "en", "hreflang": "en-US", "is_active": true }],
///   "concepts": [{ "id": 1, "key": "corridor:i-75" }],
///   "variants": [{ "concept_id": 1, "country_code": "US", "language_code": "en", "path": "/us/en/corridor/i-75" }]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    /// Locale rows.
    pub locales: Vec<RawLocaleRow>,
    /// Concept rows.
    pub concepts: Vec<Concept>,
    /// Variant rows.
    pub variants: Vec<RawVariantRow>,
}

/// In-memory [`VariantStore`] backed by a [`Snapshot`].
///
/// Used by the CLI for offline builds and by tests as the reference store.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    snapshot: Snapshot,
}

fn eq_ignore_case(value: Option<&String>, expected: &str) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case(expected))
}

fn matches_locale(row: &RawVariantRow, locale: &LocaleCode) -> bool {
    eq_ignore_case(row.country_code.as_ref(), &locale.country_code)
        && eq_ignore_case(row.language_code.as_ref(), &locale.language_code)
}

fn same_locale(locale: &RawLocaleRow, row: &RawVariantRow) -> bool {
    match (&locale.country_code, &locale.language_code) {
        (Some(country), Some(language)) => {
            eq_ignore_case(row.country_code.as_ref(), country.trim())
                && eq_ignore_case(row.language_code.as_ref(), language.trim())
        },
        _ => false,
    }
}

fn sort_key(row: &RawVariantRow) -> (String, String, String) {
    (
        row.country_code
            .as_deref()
            .unwrap_or_default()
            .to_ascii_uppercase(),
        row.language_code
            .as_deref()
            .unwrap_or_default()
            .to_ascii_lowercase(),
        row.path.clone().unwrap_or_default(),
    )
}

impl SnapshotStore {
    /// Wrap a snapshot.
    pub const fn new(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }

    /// Parse a snapshot from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        Ok(Self::new(snapshot))
    }

    /// Load a snapshot file.
    pub async fn load(path: &Path) -> Result<Self> {
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::StoreUnavailable(format!("cannot read snapshot {}: {e}", path.display()))
        })?;
        let store = Self::from_json(&json)?;
        info!(
            path = %path.display(),
            locales = store.snapshot.locales.len(),
            concepts = store.snapshot.concepts.len(),
            variants = store.snapshot.variants.len(),
            "Loaded store snapshot"
        );
        Ok(store)
    }

    /// The wrapped snapshot.
    pub const fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Look up a concept by its stable key, e.g. `corridor:i-75`.
    pub fn concept_by_key(&self, key: &str) -> Option<&Concept> {
        self.snapshot.concepts.iter().find(|c| c.key == key)
    }

    /// Join the locale's `default_eligible` flag onto a variant row, unless
    /// the row already carries one. A locale row without the flag is not
    /// eligible.
    fn joined(&self, row: &RawVariantRow) -> RawVariantRow {
        let mut row = row.clone();
        if row.default_eligible.is_none() {
            row.default_eligible = self
                .snapshot
                .locales
                .iter()
                .find(|locale| same_locale(locale, &row))
                .map(|locale| locale.default_eligible.unwrap_or(false));
        }
        row
    }

    fn concept_rows(&self, keep: impl Fn(ConceptId) -> bool) -> Vec<RawVariantRow> {
        let mut rows: Vec<RawVariantRow> = self
            .snapshot
            .variants
            .iter()
            .filter(|row| row.concept_id.is_some_and(|id| keep(ConceptId(id))))
            .map(|row| self.joined(row))
            .collect();
        rows.sort_by_cached_key(sort_key);
        rows
    }
}

#[async_trait]
impl VariantStore for SnapshotStore {
    async fn variant_by_path(&self, path: &str) -> Result<Option<RawVariantRow>> {
        Ok(self
            .snapshot
            .variants
            .iter()
            .find(|row| row.path.as_deref() == Some(path))
            .map(|row| self.joined(row)))
    }

    async fn variants_for_concept(&self, concept_id: ConceptId) -> Result<Vec<RawVariantRow>> {
        Ok(self.concept_rows(|id| id == concept_id))
    }

    async fn variants_for_concepts(&self, concept_ids: &[ConceptId]) -> Result<Vec<RawVariantRow>> {
        let wanted: BTreeSet<ConceptId> = concept_ids.iter().copied().collect();
        let rows = self.concept_rows(|id| wanted.contains(&id));
        debug!(concepts = wanted.len(), rows = rows.len(), "Batched mesh query");
        Ok(rows)
    }

    async fn indexable_variants(
        &self,
        locale: &LocaleCode,
        template_key: Option<&str>,
    ) -> Result<Vec<RawVariantRow>> {
        let mut rows: Vec<RawVariantRow> = self
            .snapshot
            .variants
            .iter()
            .filter(|row| matches_locale(row, locale))
            .filter(|row| template_key.is_none_or(|key| row.template_key.as_deref() == Some(key)))
            .filter(|row| eq_ignore_case(row.indexing_mode.as_ref(), "index"))
            .map(|row| self.joined(row))
            .collect();
        rows.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(rows)
    }

    async fn active_locales(&self) -> Result<Vec<RawLocaleRow>> {
        Ok(self
            .snapshot
            .locales
            .iter()
            .filter(|row| row.is_active == Some(true))
            .cloned()
            .collect())
    }
}
