//! URL and path contracts shared by page metadata and sitemaps.
//!
//! Canonical page paths follow `/{country}/{lang}/{kind}/{slug}`. This module
//! assembles that shape and takes it apart again for fallback titles, but it
//! does not police it: resolution is by exact string match elsewhere.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

/// Absolute site origin used to turn paths into URLs.
///
/// Stored without a trailing slash so `absolute("/x")` never doubles it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SiteUrl {
    base: String,
}

impl SiteUrl {
    /// Validate and normalize a base URL such as `https://haulcommand.com/`.
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw.trim())
            .map_err(|e| Error::InvalidInput(format!("invalid site URL '{raw}': {e}")))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidInput(format!(
                "site URL '{raw}' must use http or https"
            )));
        }
        if url.host_str().is_none() {
            return Err(Error::InvalidInput(format!("site URL '{raw}' has no host")));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(Error::InvalidInput(format!(
                "site URL '{raw}' must not carry a query or fragment"
            )));
        }

        let base = url.as_str().trim_end_matches('/').to_string();
        Ok(Self { base })
    }

    /// Wrap a base URL already known to be absolute http(s) without query.
    pub(crate) fn from_trusted(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// The base URL without trailing slash.
    pub fn as_str(&self) -> &str {
        &self.base
    }

    /// Absolute URL for a site path. The path is used verbatim.
    pub fn absolute(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base)
        } else {
            format!("{}/{path}", self.base)
        }
    }

    /// Inverse of [`Self::absolute`]: the site-relative path of a URL on this
    /// site, or `None` for foreign URLs.
    pub fn relative<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(self.base.as_str())
            .filter(|rest| rest.is_empty() || rest.starts_with('/'))
    }
}

impl fmt::Display for SiteUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base)
    }
}

impl TryFrom<String> for SiteUrl {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<SiteUrl> for String {
    fn from(value: SiteUrl) -> Self {
        value.base
    }
}

/// Known page kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    /// City hub.
    City,
    /// Highway corridor.
    Corridor,
    /// Sea/inland port.
    Port,
    /// Service category.
    Category,
}

impl PageKind {
    /// Path segment for this kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::City => "city",
            Self::Corridor => "corridor",
            Self::Port => "port",
            Self::Category => "category",
        }
    }
}

impl FromStr for PageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "city" => Ok(Self::City),
            "corridor" => Ok(Self::Corridor),
            "port" => Ok(Self::Port),
            "category" => Ok(Self::Category),
            other => Err(Error::InvalidInput(format!("unknown page kind '{other}'"))),
        }
    }
}

/// A decomposed canonical path `/{country}/{lang}/{kind}/{slug}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePath {
    /// Lowercase country segment.
    pub country: String,
    /// Lowercase language segment.
    pub language: String,
    /// Page kind.
    pub kind: PageKind,
    /// Page slug.
    pub slug: String,
}

impl RoutePath {
    /// Build a route.
    pub fn new(country: &str, language: &str, kind: PageKind, slug: &str) -> Self {
        Self {
            country: country.to_ascii_lowercase(),
            language: language.to_ascii_lowercase(),
            kind,
            slug: slug.to_string(),
        }
    }

    /// Parse a path of exactly four segments with a known kind.
    pub fn parse(path: &str) -> Option<Self> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let [country, language, kind, slug] = segments.as_slice() else {
            return None;
        };
        let kind = kind.parse().ok()?;
        Some(Self::new(country, language, kind, slug))
    }

    /// Human title for pages without a stored title, e.g. `I 75 Corridor`.
    pub fn display_title(&self) -> String {
        format!(
            "{} {}",
            title_case(&self.slug),
            title_case(self.kind.as_str())
        )
    }
}

impl fmt::Display for RoutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/{}/{}/{}/{}",
            self.country,
            self.language,
            self.kind.as_str(),
            self.slug
        )
    }
}

/// Title-case a slug: `does-not-exist` → `Does Not Exist`.
pub fn title_case(segment: &str) -> String {
    segment
        .split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect::<String>()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fallback title derived from a request path.
///
/// Canonical routes use slug + kind; any other path uses its last segment.
/// Paths without segments produce `None`.
pub fn fallback_title(path: &str) -> Option<String> {
    if let Some(route) = RoutePath::parse(path) {
        return Some(route.display_title());
    }
    path.split('/')
        .rfind(|s| !s.is_empty())
        .map(title_case)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn site_url_trims_trailing_slash() {
        let site = SiteUrl::parse("https://haulcommand.com/").unwrap();
        assert_eq!(site.as_str(), "https://haulcommand.com");
        assert_eq!(
            site.absolute("/us/en/city/miami"),
            "https://haulcommand.com/us/en/city/miami"
        );
        assert_eq!(site.absolute("sitemap.xml"), "https://haulcommand.com/sitemap.xml");
    }

    #[test]
    fn site_url_keeps_path_prefix() {
        let site = SiteUrl::parse("https://example.com/intl").unwrap();
        assert_eq!(site.absolute("/a"), "https://example.com/intl/a");
        assert_eq!(site.relative("https://example.com/intl/a"), Some("/a"));
        assert_eq!(site.relative("https://example.com/international"), None);
    }

    #[test]
    fn site_url_rejects_bad_input() {
        assert!(SiteUrl::parse("ftp://example.com").is_err());
        assert!(SiteUrl::parse("not a url").is_err());
        assert!(SiteUrl::parse("https://example.com/?q=1").is_err());
    }

    #[test]
    fn absolute_does_not_normalize() {
        let site = SiteUrl::parse("https://a.test").unwrap();
        assert_eq!(site.absolute("/US/en/City/"), "https://a.test/US/en/City/");
    }

    #[test]
    fn route_round_trips_through_display() {
        let route = RoutePath::new("US", "en", PageKind::Corridor, "i-75");
        assert_eq!(route.to_string(), "/us/en/corridor/i-75");
        assert_eq!(RoutePath::parse("/us/en/corridor/i-75"), Some(route));
    }

    #[test]
    fn route_parse_requires_known_shape() {
        assert!(RoutePath::parse("/us/en/blog/post").is_none());
        assert!(RoutePath::parse("/us/en/city").is_none());
        assert!(RoutePath::parse("/us/en/city/miami/extra").is_none());
    }

    #[test]
    fn title_case_splits_on_separators() {
        assert_eq!(title_case("does-not-exist"), "Does Not Exist");
        assert_eq!(title_case("i-75"), "I 75");
        assert_eq!(title_case("new_york--city"), "New York City");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn fallback_title_uses_route_or_last_segment() {
        assert_eq!(
            fallback_title("/us/en/corridor/does-not-exist").as_deref(),
            Some("Does Not Exist Corridor")
        );
        assert_eq!(
            fallback_title("/tools/rate-lookup/").as_deref(),
            Some("Rate Lookup")
        );
        assert_eq!(fallback_title("/"), None);
        assert_eq!(fallback_title(""), None);
    }
}
