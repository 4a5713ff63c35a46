//! Validation boundary between raw store rows and typed values.

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use tracing::{instrument, warn};

use super::{RawLocaleRow, RawVariantRow, VariantStore};
use crate::{ConceptId, IndexingMode, Locale, LocaleCode, Result, Variant, X_DEFAULT};

#[allow(clippy::unwrap_used)]
static HREFLANG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2,3}(-[A-Z][a-z]{3})?(-([A-Z]{2}|\d{3}))?$").unwrap());

#[allow(clippy::unwrap_used)]
static TEMPLATE_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9_-]{0,63}$").unwrap());

/// Partition files sit next to `sitemap-index.xml`, so no template may take
/// that name.
const RESERVED_TEMPLATE_KEY: &str = "sitemap-index";

/// Result of parsing one store row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome<T> {
    /// The row passed validation.
    Valid(T),
    /// The row failed validation and must not be used.
    Malformed {
        /// Best available identifier of the row (path or locale).
        key: String,
        /// What was wrong.
        reason: String,
    },
}

impl<T> RowOutcome<T> {
    /// Keep valid rows, log and drop malformed ones.
    pub fn into_valid(self, query: &'static str) -> Option<T> {
        match self {
            Self::Valid(value) => Some(value),
            Self::Malformed { key, reason } => {
                warn!(query, key = %key, reason = %reason, "Skipping malformed store row");
                None
            },
        }
    }

    /// Whether the row passed validation.
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

fn malformed<T>(key: &str, reason: impl Into<String>) -> RowOutcome<T> {
    RowOutcome::Malformed {
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn valid_country(code: &str) -> bool {
    code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic())
}

fn valid_language(code: &str) -> bool {
    (2..=3).contains(&code.len()) && code.chars().all(|c| c.is_ascii_alphabetic())
}

fn valid_hreflang(tag: &str) -> bool {
    tag != X_DEFAULT && HREFLANG_RE.is_match(tag)
}

/// Parse an `updated_at` value: RFC 3339, naive datetime, or a bare date.
pub(crate) fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Paths end up verbatim in `<loc>` and `href`, so they may not carry
/// whitespace or control characters.
fn has_unsafe_chars(path: &str) -> bool {
    path.chars().any(|c| c.is_whitespace() || c.is_control())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Validate a raw variant row.
pub(crate) fn parse_variant(raw: RawVariantRow) -> RowOutcome<Variant> {
    let Some(path) = non_blank(raw.path) else {
        return malformed("<no path>", "missing path");
    };
    if !path.starts_with('/') {
        return malformed(&path, "path must start with '/'");
    }
    if has_unsafe_chars(&path) {
        return malformed(
            &path.escape_debug().to_string(),
            "path contains whitespace or control characters",
        );
    }
    let Some(concept_id) = raw.concept_id else {
        return malformed(&path, "missing concept_id");
    };

    let country = raw.country_code.unwrap_or_default();
    let language = raw.language_code.unwrap_or_default();
    if !valid_country(country.trim()) || !valid_language(language.trim()) {
        return malformed(&path, format!("invalid locale '{country}-{language}'"));
    }

    let hreflang = raw.hreflang.unwrap_or_default();
    if !valid_hreflang(&hreflang) {
        return malformed(&path, format!("invalid hreflang '{hreflang}'"));
    }

    let indexing_mode = match raw.indexing_mode.as_deref().map(str::parse::<IndexingMode>) {
        Some(Ok(mode)) => mode,
        Some(Err(e)) => return malformed(&path, e.to_string()),
        None => return malformed(&path, "missing indexing_mode"),
    };

    let template_key = raw.template_key.unwrap_or_default();
    if !TEMPLATE_KEY_RE.is_match(&template_key) {
        return malformed(&path, format!("invalid template_key '{template_key}'"));
    }
    if template_key == RESERVED_TEMPLATE_KEY {
        return malformed(&path, format!("reserved template_key '{template_key}'"));
    }

    let quality_score = raw.quality_score.unwrap_or(0.0);
    if !quality_score.is_finite() {
        return malformed(&path, "quality_score is not finite");
    }

    let updated_at = match non_blank(raw.updated_at) {
        Some(text) => match parse_timestamp(text.trim()) {
            Some(ts) => Some(ts),
            None => return malformed(&path, format!("unparseable updated_at '{text}'")),
        },
        None => None,
    };

    let canonical_path = non_blank(raw.canonical_path).unwrap_or_else(|| path.clone());
    if has_unsafe_chars(&canonical_path) {
        return malformed(&path, "canonical_path contains whitespace or control characters");
    }

    RowOutcome::Valid(Variant {
        concept_id: ConceptId(concept_id),
        locale: LocaleCode::new(&country, &language),
        hreflang,
        path,
        canonical_path,
        title: raw.title.unwrap_or_default(),
        meta_description: raw.meta_description.unwrap_or_default(),
        indexing_mode,
        quality_score,
        updated_at,
        template_key,
        is_default: raw.is_default.unwrap_or(false),
        default_eligible: raw.default_eligible.unwrap_or(true),
    })
}

/// Validate a raw locale row.
pub(crate) fn parse_locale(raw: RawLocaleRow) -> RowOutcome<Locale> {
    let country = raw.country_code.unwrap_or_default();
    let language = raw.language_code.unwrap_or_default();
    let key = format!("{country}-{language}");
    if !valid_country(country.trim()) || !valid_language(language.trim()) {
        return malformed(&key, "invalid locale code");
    }
    let hreflang = raw.hreflang.unwrap_or_default();
    if !valid_hreflang(&hreflang) {
        return malformed(&key, format!("invalid hreflang '{hreflang}'"));
    }
    RowOutcome::Valid(Locale {
        code: LocaleCode::new(&country, &language),
        hreflang,
        is_active: raw.is_active.unwrap_or(false),
        default_eligible: raw.default_eligible.unwrap_or(false),
    })
}

fn contract_order(a: &Variant, b: &Variant) -> std::cmp::Ordering {
    a.locale.cmp(&b.locale).then_with(|| a.path.cmp(&b.path))
}

/// Typed, validated view over a [`VariantStore`].
///
/// Cheap to clone; all clones share the same store handle.
pub struct StoreReader<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for StoreReader<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: VariantStore + ?Sized> StoreReader<S> {
    /// Wrap a shared store handle.
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Exact-path lookup. Malformed rows resolve to `None`.
    #[instrument(level = "debug", skip(self))]
    pub async fn variant_by_path(&self, path: &str) -> Result<Option<Variant>> {
        let row = self.store.variant_by_path(path).await?;
        Ok(row
            .map(parse_variant)
            .and_then(|outcome| outcome.into_valid("variant_by_path"))
            // A store doing fuzzy matching must not leak a different row.
            .filter(|variant| variant.path == path))
    }

    /// Variants of one concept in contract order.
    #[instrument(level = "debug", skip(self), fields(concept_id = %concept_id))]
    pub async fn variants_for_concept(&self, concept_id: ConceptId) -> Result<Vec<Variant>> {
        let rows = self.store.variants_for_concept(concept_id).await?;
        let mut variants: Vec<Variant> = rows
            .into_iter()
            .filter_map(|row| parse_variant(row).into_valid("variants_for_concept"))
            .filter(|variant| variant.concept_id == concept_id)
            .collect();
        variants.sort_by(contract_order);
        Ok(variants)
    }

    /// Variants of several concepts, grouped per concept in contract order.
    ///
    /// Every requested id is present in the result, possibly with no variants.
    #[instrument(level = "debug", skip_all, fields(concepts = concept_ids.len()))]
    pub async fn variants_for_concepts(
        &self,
        concept_ids: &[ConceptId],
    ) -> Result<BTreeMap<ConceptId, Vec<Variant>>> {
        let mut grouped: BTreeMap<ConceptId, Vec<Variant>> =
            concept_ids.iter().map(|id| (*id, Vec::new())).collect();
        if concept_ids.is_empty() {
            return Ok(grouped);
        }

        let rows = self.store.variants_for_concepts(concept_ids).await?;
        for variant in rows
            .into_iter()
            .filter_map(|row| parse_variant(row).into_valid("variants_for_concepts"))
        {
            if let Some(bucket) = grouped.get_mut(&variant.concept_id) {
                bucket.push(variant);
            }
        }
        for bucket in grouped.values_mut() {
            bucket.sort_by(contract_order);
            bucket.dedup_by(|a, b| a.path == b.path);
        }
        Ok(grouped)
    }

    /// Indexable variants of a locale (optionally one template), by path.
    #[instrument(level = "debug", skip(self), fields(locale = %locale))]
    pub async fn indexable_variants(
        &self,
        locale: &LocaleCode,
        template_key: Option<&str>,
    ) -> Result<Vec<Variant>> {
        let rows = self.store.indexable_variants(locale, template_key).await?;
        let mut variants: Vec<Variant> = rows
            .into_iter()
            .filter_map(|row| parse_variant(row).into_valid("indexable_variants"))
            .filter(|variant| {
                variant.indexing_mode.is_indexable()
                    && variant.locale == *locale
                    && template_key.is_none_or(|key| variant.template_key == key)
            })
            .collect();
        variants.sort_by(|a, b| a.path.cmp(&b.path));
        variants.dedup_by(|a, b| a.path == b.path);
        Ok(variants)
    }

    /// Active locales ordered by `(country_code, language_code)`.
    #[instrument(level = "debug", skip(self))]
    pub async fn active_locales(&self) -> Result<Vec<Locale>> {
        let rows = self.store.active_locales().await?;
        let mut locales: Vec<Locale> = rows
            .into_iter()
            .filter_map(|row| parse_locale(row).into_valid("active_locales"))
            .filter(|locale| locale.is_active)
            .collect();
        locales.sort_by(|a, b| a.code.cmp(&b.code));
        locales.dedup_by(|a, b| a.code == b.code);
        Ok(locales)
    }
}
