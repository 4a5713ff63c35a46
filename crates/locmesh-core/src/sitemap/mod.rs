//! Three-tier sitemap hierarchy with embedded hreflang annotations.
//!
//! ```text
//! /sitemap.xml                                 master index, one entry per active locale
//! /sitemaps/{cc}-{ll}/sitemap-index.xml        locale index, one entry per template
//! /sitemaps/{cc}-{ll}/{template}.xml           partition, one <url> per indexable variant
//! ```
//!
//! Documents are rendered in memory as [`SitemapDocument`]s. Writing them to
//! disk is the publisher's job ([`crate::generate`]).
//!
//! ## Determinism
//!
//! Every document depends only on store data and the run's generation date:
//! locales, templates and URLs are sorted, and `<lastmod>` never reads the
//! wall clock. Regenerating against unchanged data yields identical bytes.

pub mod location;
mod partition;
mod reader;
mod writer;

use serde::Serialize;

pub use location::SitemapLocation;
pub use partition::SitemapPartitioner;
pub use reader::{ParsedIndexEntry, ParsedSitemap, ParsedUrl, parse_sitemap};
pub use writer::{IndexEntry, UrlEntry, write_sitemap_index, write_urlset};

/// Namespace of `<urlset>` and `<sitemapindex>`.
pub const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Namespace of `<xhtml:link>` alternates.
pub const XHTML_NS: &str = "http://www.w3.org/1999/xhtml";

/// Whether `c` is allowed by the XML 1.0 `Char` production.
///
/// quick-xml escapes markup but passes other characters through, so control
/// characters have to be caught before writing and when reading back.
pub(crate) const fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

/// First character of `text` that XML 1.0 does not allow, with its byte offset.
pub(crate) fn first_illegal_char(text: &str) -> Option<(usize, char)> {
    text.char_indices().find(|&(_, c)| !is_xml_char(c))
}

/// A rendered sitemap document and where it belongs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapDocument {
    /// Target location in the published tree.
    pub location: SitemapLocation,
    /// Complete XML text.
    pub xml: String,
    /// Number of `<url>` or `<sitemap>` entries.
    pub entry_count: usize,
}
