//! Sitemap XML rendering with `quick-xml`.

use chrono::NaiveDate;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use super::{SITEMAP_NS, XHTML_NS, first_illegal_char};
use crate::{Error, HreflangLink, Result};

/// One `<url>` of a partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlEntry {
    /// Absolute page URL.
    pub loc: String,
    /// Last modification date.
    pub lastmod: NaiveDate,
    /// Mesh links, `x-default` included.
    pub alternates: Vec<HreflangLink>,
}

/// One `<sitemap>` of an index document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Absolute URL of the child document.
    pub loc: String,
    /// Generation date.
    pub lastmod: NaiveDate,
}

/// Reject values quick-xml would emit verbatim into a document that is not
/// well-formed.
fn checked<'a>(what: &str, value: &'a str) -> Result<&'a str> {
    match first_illegal_char(value) {
        Some((_, c)) => Err(Error::Xml(format!(
            "{what} contains U+{:04X}, which XML 1.0 does not allow: {value:?}",
            u32::from(c)
        ))),
        None => Ok(value),
    }
}

fn lastmod(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

struct XmlOut {
    writer: Writer<Vec<u8>>,
}

impl XmlOut {
    fn new() -> Result<Self> {
        let mut out = Self {
            writer: Writer::new_with_indent(Vec::new(), b' ', 2),
        };
        out.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        Ok(out)
    }

    fn event(&mut self, event: Event<'_>) -> Result<()> {
        self.writer
            .write_event(event)
            .map_err(|e| Error::Xml(e.to_string()))
    }

    fn start(&mut self, start: BytesStart<'_>) -> Result<()> {
        self.event(Event::Start(start))
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn text_element(&mut self, name: &str, text: &str) -> Result<()> {
        self.start(BytesStart::new(name))?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    fn finish(self) -> Result<String> {
        let mut xml = String::from_utf8(self.writer.into_inner())
            .map_err(|e| Error::Xml(format!("non UTF-8 output: {e}")))?;
        xml.push('\n');
        Ok(xml)
    }
}

/// Render a `<urlset>` with `xhtml:link` alternates.
///
/// Both namespaces are always declared, so an empty entry list still yields a
/// valid document.
pub fn write_urlset(entries: &[UrlEntry]) -> Result<String> {
    let mut out = XmlOut::new()?;
    out.start(
        BytesStart::new("urlset").with_attributes([("xmlns", SITEMAP_NS), ("xmlns:xhtml", XHTML_NS)]),
    )?;

    for entry in entries {
        out.start(BytesStart::new("url"))?;
        out.text_element("loc", checked("loc", &entry.loc)?)?;
        out.text_element("lastmod", &lastmod(entry.lastmod))?;
        for link in &entry.alternates {
            out.event(Event::Empty(BytesStart::new("xhtml:link").with_attributes([
                ("rel", "alternate"),
                ("hreflang", checked("hreflang", &link.hreflang)?),
                ("href", checked("href", &link.href)?),
            ])))?;
        }
        out.end("url")?;
    }

    out.end("urlset")?;
    out.finish()
}

/// Render a `<sitemapindex>`.
pub fn write_sitemap_index(entries: &[IndexEntry]) -> Result<String> {
    let mut out = XmlOut::new()?;
    out.start(BytesStart::new("sitemapindex").with_attributes([("xmlns", SITEMAP_NS)]))?;

    for entry in entries {
        out.start(BytesStart::new("sitemap"))?;
        out.text_element("loc", checked("loc", &entry.loc)?)?;
        out.text_element("lastmod", &lastmod(entry.lastmod))?;
        out.end("sitemap")?;
    }

    out.end("sitemapindex")?;
    out.finish()
}
