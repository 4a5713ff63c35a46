//! Core data types: concepts, locales, variants and hreflang meshes.
//!
//! These are the *validated* forms. Rows coming out of a store are loosely
//! typed ([`crate::store::RawVariantRow`]) and only become a [`Variant`] after
//! passing through [`crate::store::StoreReader`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// The hreflang value search engines treat as the catch-all fallback.
pub const X_DEFAULT: &str = "x-default";

/// Stable identifier of a [`Concept`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConceptId(pub i64);

impl fmt::Display for ConceptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ConceptId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Abstract content unit that owns one variant per locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    /// Store identifier.
    pub id: ConceptId,
    /// Stable human key, e.g. `corridor:i-75`.
    pub key: String,
}

/// A `(country, language)` pair.
///
/// Country is upper case (`US`), language lower case (`en`). The derived
/// ordering sorts by country first, which is the order every index document
/// uses.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LocaleCode {
    /// ISO 3166-1 alpha-2 country code, upper case.
    pub country_code: String,
    /// ISO 639 language code, lower case.
    pub language_code: String,
}

impl LocaleCode {
    /// Build a code, normalizing case.
    pub fn new(country_code: &str, language_code: &str) -> Self {
        Self {
            country_code: country_code.trim().to_ascii_uppercase(),
            language_code: language_code.trim().to_ascii_lowercase(),
        }
    }

    /// Directory slug used under `/sitemaps/`, e.g. `us-en`.
    pub fn slug(&self) -> String {
        format!(
            "{}-{}",
            self.country_code.to_ascii_lowercase(),
            self.language_code
        )
    }
}

impl fmt::Display for LocaleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.country_code, self.language_code)
    }
}

impl FromStr for LocaleCode {
    type Err = Error;

    /// Parses `us-en`, `US-en` or `US_en`.
    fn from_str(s: &str) -> Result<Self> {
        let (country, language) = s
            .split_once(['-', '_'])
            .ok_or_else(|| Error::InvalidInput(format!("locale '{s}' is not COUNTRY-LANG")))?;
        if country.len() != 2 || !country.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Error::InvalidInput(format!("invalid country code in '{s}'")));
        }
        if !(2..=3).contains(&language.len()) || !language.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err(Error::InvalidInput(format!("invalid language code in '{s}'")));
        }
        Ok(Self::new(country, language))
    }
}

/// A published locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locale {
    /// Country/language pair.
    pub code: LocaleCode,
    /// Canonical hreflang tag, e.g. `en-US`.
    pub hreflang: String,
    /// Inactive locales are left out of every sitemap.
    pub is_active: bool,
    /// Whether variants in this locale may serve as `x-default`.
    pub default_eligible: bool,
}

/// Tri-state indexing flag of a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexingMode {
    /// Drafted by the pipeline, not yet reviewed.
    Preview,
    /// Published but kept out of search indexes.
    Noindex,
    /// Published and eligible for sitemaps.
    Index,
}

impl IndexingMode {
    /// Whether the variant may be indexed by search engines.
    pub const fn is_indexable(self) -> bool {
        matches!(self, Self::Index)
    }

    /// Lowercase wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Preview => "preview",
            Self::Noindex => "noindex",
            Self::Index => "index",
        }
    }
}

impl FromStr for IndexingMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "preview" => Ok(Self::Preview),
            "noindex" => Ok(Self::Noindex),
            "index" => Ok(Self::Index),
            other => Err(Error::InvalidInput(format!("unknown indexing mode '{other}'"))),
        }
    }
}

/// One localized, published instance of a concept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    /// Owning concept.
    pub concept_id: ConceptId,
    /// Locale of this variant.
    pub locale: LocaleCode,
    /// hreflang tag of the locale.
    pub hreflang: String,
    /// Unique URL path, e.g. `/us/en/corridor/i-75`.
    pub path: String,
    /// Canonical path; equals `path` unless the store supplied one.
    pub canonical_path: String,
    /// Page title, possibly empty.
    pub title: String,
    /// Meta description, possibly empty.
    pub meta_description: String,
    /// Indexing flag.
    pub indexing_mode: IndexingMode,
    /// Content quality score from the pipeline.
    pub quality_score: f64,
    /// Last content update.
    pub updated_at: Option<DateTime<Utc>>,
    /// Sitemap grouping, e.g. `city`, `corridor`, `port`.
    pub template_key: String,
    /// Marked as the concept's `x-default` target.
    pub is_default: bool,
    /// The variant's locale may serve `x-default` when nothing is flagged.
    pub default_eligible: bool,
}

/// One `<link rel="alternate">` entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HreflangLink {
    /// hreflang tag or `x-default`.
    pub hreflang: String,
    /// Absolute URL.
    pub href: String,
}

impl HreflangLink {
    /// Create a link.
    pub fn new(hreflang: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            hreflang: hreflang.into(),
            href: href.into(),
        }
    }

    /// Whether this is the `x-default` entry.
    pub fn is_x_default(&self) -> bool {
        self.hreflang == X_DEFAULT
    }
}

/// The full alternate set of a concept: one link per locale plus `x-default`.
///
/// An empty mesh means "no known translations".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mesh {
    links: Vec<HreflangLink>,
}

impl Mesh {
    /// A mesh with no links.
    pub const fn empty() -> Self {
        Self { links: Vec::new() }
    }

    /// Wrap an already-built link list.
    pub const fn from_links(links: Vec<HreflangLink>) -> Self {
        Self { links }
    }

    /// All links in emission order (locales first, `x-default` last).
    pub fn links(&self) -> &[HreflangLink] {
        &self.links
    }

    /// Number of links including `x-default`.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// True when the concept has no known translations.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// The `x-default` href, if any.
    pub fn x_default(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|link| link.is_x_default())
            .map(|link| link.href.as_str())
    }

    /// Every link except `x-default`.
    pub fn languages(&self) -> impl Iterator<Item = &HreflangLink> {
        self.links.iter().filter(|link| !link.is_x_default())
    }
}

impl IntoIterator for Mesh {
    type Item = HreflangLink;
    type IntoIter = std::vec::IntoIter<HreflangLink>;

    fn into_iter(self) -> Self::IntoIter {
        self.links.into_iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn locale_code_normalizes_case_and_orders_by_country() {
        let a = LocaleCode::new("us", "EN");
        assert_eq!(a.country_code, "US");
        assert_eq!(a.language_code, "en");
        assert_eq!(a.slug(), "us-en");

        let mut codes = vec![
            LocaleCode::new("US", "es"),
            LocaleCode::new("CA", "fr"),
            LocaleCode::new("US", "en"),
            LocaleCode::new("CA", "en"),
        ];
        codes.sort();
        let slugs: Vec<_> = codes.iter().map(LocaleCode::slug).collect();
        assert_eq!(slugs, ["ca-en", "ca-fr", "us-en", "us-es"]);
    }

    #[test]
    fn locale_code_parses_slugs() {
        assert_eq!(
            "us-en".parse::<LocaleCode>().unwrap(),
            LocaleCode::new("US", "en")
        );
        assert_eq!(
            "CA_fr".parse::<LocaleCode>().unwrap(),
            LocaleCode::new("CA", "fr")
        );
        assert!("usa-en".parse::<LocaleCode>().is_err());
        assert!("us".parse::<LocaleCode>().is_err());
        assert!("us-e1".parse::<LocaleCode>().is_err());
    }

    #[test]
    fn indexing_mode_parses_case_insensitively() {
        assert_eq!(
            "INDEX".parse::<IndexingMode>().unwrap(),
            IndexingMode::Index
        );
        assert_eq!(
            " noindex ".parse::<IndexingMode>().unwrap(),
            IndexingMode::Noindex
        );
        assert!("published".parse::<IndexingMode>().is_err());
        assert!(IndexingMode::Index.is_indexable());
        assert!(!IndexingMode::Preview.is_indexable());
    }

    #[test]
    fn mesh_accessors_split_x_default() {
        let mesh = Mesh::from_links(vec![
            HreflangLink::new("en-US", "https://a.test/us/en/x"),
            HreflangLink::new("es-US", "https://a.test/us/es/x"),
            HreflangLink::new(X_DEFAULT, "https://a.test/us/en/x"),
        ]);
        assert_eq!(mesh.len(), 3);
        assert_eq!(mesh.x_default(), Some("https://a.test/us/en/x"));
        assert_eq!(mesh.languages().count(), 2);
        assert!(Mesh::empty().x_default().is_none());
    }
}
