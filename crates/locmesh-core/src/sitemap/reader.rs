//! Reading sitemap documents back.
//!
//! Used by the health check and by tests to prove that what the writer emits
//! is well-formed and carries the expected entries.

use chrono::NaiveDate;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::Serialize;

use super::first_illegal_char;
use crate::store::parse_timestamp;
use crate::{Error, HreflangLink, Result};

/// A `<url>` read from a urlset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedUrl {
    /// Page URL.
    pub loc: String,
    /// Last modification date, if present and parseable.
    pub lastmod: Option<NaiveDate>,
    /// `xhtml:link rel="alternate"` entries.
    pub alternates: Vec<HreflangLink>,
}

/// A `<sitemap>` read from a sitemap index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedIndexEntry {
    /// Child document URL.
    pub loc: String,
    /// Last modification date, if present and parseable.
    pub lastmod: Option<NaiveDate>,
}

/// A parsed sitemap document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedSitemap {
    /// `<urlset>` document.
    UrlSet(Vec<ParsedUrl>),
    /// `<sitemapindex>` document.
    Index(Vec<ParsedIndexEntry>),
}

impl ParsedSitemap {
    /// Number of entries.
    pub fn len(&self) -> usize {
        match self {
            Self::UrlSet(urls) => urls.len(),
            Self::Index(entries) => entries.len(),
        }
    }

    /// Whether the document has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn parse_error(e: impl std::fmt::Display) -> Error {
    Error::Xml(format!("XML parse error: {e}"))
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).to_string()
}

fn parse_lastmod(text: &str) -> Option<NaiveDate> {
    parse_timestamp(text).map(|ts| ts.date_naive())
}

/// Parse a sitemap or sitemap index.
///
/// The root element decides the kind. Malformed XML, characters XML 1.0 does
/// not allow, a missing root or an unknown root element are errors.
pub fn parse_sitemap(xml: &str) -> Result<ParsedSitemap> {
    if let Some((offset, c)) = first_illegal_char(xml) {
        return Err(Error::Xml(format!(
            "character U+{:04X} at byte {offset} is not allowed in XML",
            u32::from(c)
        )));
    }

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let root = local_name(&e);
                return match root.as_str() {
                    "urlset" => parse_urlset(&mut reader).map(ParsedSitemap::UrlSet),
                    "sitemapindex" => parse_sitemap_index(&mut reader).map(ParsedSitemap::Index),
                    other => Err(Error::Xml(format!("unexpected root element <{other}>"))),
                };
            },
            Ok(Event::Empty(e)) => {
                return match local_name(&e).as_str() {
                    "urlset" => Ok(ParsedSitemap::UrlSet(Vec::new())),
                    "sitemapindex" => Ok(ParsedSitemap::Index(Vec::new())),
                    other => Err(Error::Xml(format!("unexpected root element <{other}>"))),
                };
            },
            Ok(Event::Eof) => return Err(Error::Xml("document has no root element".to_string())),
            Err(e) => return Err(parse_error(e)),
            _ => {},
        }
        buf.clear();
    }
}

/// Read the body of a `<urlset>` whose start tag was consumed.
fn parse_urlset(reader: &mut Reader<&[u8]>) -> Result<Vec<ParsedUrl>> {
    let mut entries = Vec::new();
    let mut buf = Vec::new();

    let mut current: Option<ParsedUrl> = None;
    let mut current_element: Option<String> = None;
    let mut closed = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = local_name(&e);
                match name.as_str() {
                    "url" => {
                        current = Some(ParsedUrl {
                            loc: String::new(),
                            lastmod: None,
                            alternates: Vec::new(),
                        });
                    },
                    "loc" | "lastmod" if current.is_some() => current_element = Some(name),
                    _ => {},
                }
            },
            Ok(Event::Empty(e)) => {
                if let Some(url) = current.as_mut() {
                    if local_name(&e) == "link" {
                        if let Some(link) = alternate_link(&e)? {
                            url.alternates.push(link);
                        }
                    }
                }
            },
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                match name.as_str() {
                    "url" => {
                        if let Some(url) = current.take().filter(|u| !u.loc.is_empty()) {
                            entries.push(url);
                        }
                    },
                    "urlset" => closed = true,
                    _ => {},
                }
                current_element = None;
            },
            Ok(Event::Text(e)) => {
                if let (Some(element), Some(url)) = (current_element.as_deref(), current.as_mut()) {
                    let text = e.unescape().map_err(parse_error)?;
                    let text = text.trim();
                    match element {
                        "loc" => url.loc = text.to_string(),
                        "lastmod" => url.lastmod = parse_lastmod(text),
                        _ => {},
                    }
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(parse_error(e)),
            _ => {},
        }
        buf.clear();
    }

    if !closed {
        return Err(Error::Xml("unterminated <urlset>".to_string()));
    }
    Ok(entries)
}

fn alternate_link(e: &BytesStart<'_>) -> Result<Option<HreflangLink>> {
    let mut rel = None;
    let mut hreflang = None;
    let mut href = None;
    for attr in e.attributes() {
        let attr = attr.map_err(parse_error)?;
        let value = attr.unescape_value().map_err(parse_error)?.into_owned();
        match attr.key.local_name().as_ref() {
            b"rel" => rel = Some(value),
            b"hreflang" => hreflang = Some(value),
            b"href" => href = Some(value),
            _ => {},
        }
    }
    if rel.as_deref() != Some("alternate") {
        return Ok(None);
    }
    Ok(hreflang.zip(href).map(|(hreflang, href)| HreflangLink { hreflang, href }))
}

/// Read the body of a `<sitemapindex>` whose start tag was consumed.
fn parse_sitemap_index(reader: &mut Reader<&[u8]>) -> Result<Vec<ParsedIndexEntry>> {
    let mut entries = Vec::new();
    let mut buf = Vec::new();

    let mut current_loc: Option<String> = None;
    let mut current_lastmod: Option<NaiveDate> = None;
    let mut in_sitemap = false;
    let mut current_element: Option<String> = None;
    let mut closed = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = local_name(&e);
                match name.as_str() {
                    "sitemap" => {
                        in_sitemap = true;
                        current_loc = None;
                        current_lastmod = None;
                    },
                    "loc" | "lastmod" if in_sitemap => current_element = Some(name),
                    _ => {},
                }
            },
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                match name.as_str() {
                    "sitemap" if in_sitemap => {
                        if let Some(loc) = current_loc.take() {
                            entries.push(ParsedIndexEntry {
                                loc,
                                lastmod: current_lastmod.take(),
                            });
                        }
                        in_sitemap = false;
                    },
                    "sitemapindex" => closed = true,
                    _ => {},
                }
                current_element = None;
            },
            Ok(Event::Text(e)) => {
                if let Some(ref element) = current_element {
                    let text = e.unescape().map_err(parse_error)?;
                    let text = text.trim();
                    match element.as_str() {
                        "loc" => current_loc = Some(text.to_string()),
                        "lastmod" => current_lastmod = parse_lastmod(text),
                        _ => {},
                    }
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(parse_error(e)),
            _ => {},
        }
        buf.clear();
    }

    if !closed {
        return Err(Error::Xml("unterminated <sitemapindex>".to_string()));
    }
    Ok(entries)
}
