//! Fixed locations of sitemap documents.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};

use crate::LocaleCode;
use crate::route::SiteUrl;

const MASTER_FILE: &str = "sitemap.xml";
const SITEMAPS_DIR: &str = "sitemaps";
const LOCALE_INDEX_FILE: &str = "sitemap-index.xml";

/// Where a sitemap document is published.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SitemapLocation {
    /// `/sitemap.xml`
    Master,
    /// `/sitemaps/{cc}-{ll}/sitemap-index.xml`
    LocaleIndex {
        /// Locale the index covers.
        locale: LocaleCode,
    },
    /// `/sitemaps/{cc}-{ll}/{template}.xml`
    Partition {
        /// Locale of the partition.
        locale: LocaleCode,
        /// Template key of the partition.
        template_key: String,
    },
}

impl SitemapLocation {
    /// Location of a locale's index.
    pub fn locale_index(locale: &LocaleCode) -> Self {
        Self::LocaleIndex {
            locale: locale.clone(),
        }
    }

    /// Location of a template partition.
    pub fn partition(locale: &LocaleCode, template_key: &str) -> Self {
        Self::Partition {
            locale: locale.clone(),
            template_key: template_key.to_string(),
        }
    }

    /// Path relative to the site root, with `/` separators and no leading
    /// slash, e.g. `sitemaps/us-en/city.xml`.
    pub fn relative_path(&self) -> String {
        match self {
            Self::Master => MASTER_FILE.to_string(),
            Self::LocaleIndex { locale } => {
                format!("{SITEMAPS_DIR}/{}/{LOCALE_INDEX_FILE}", locale.slug())
            },
            Self::Partition {
                locale,
                template_key,
            } => format!("{SITEMAPS_DIR}/{}/{template_key}.xml", locale.slug()),
        }
    }

    /// File path under an output root.
    pub fn file_path(&self, root: &Path) -> PathBuf {
        self.relative_path()
            .split('/')
            .fold(root.to_path_buf(), |path, segment| path.join(segment))
    }

    /// Absolute URL of the document.
    pub fn url(&self, site: &SiteUrl) -> String {
        site.absolute(&format!("/{}", self.relative_path()))
    }

    /// Inverse of [`Self::relative_path`]. A leading `/` is accepted.
    pub fn parse(path: &str) -> Option<Self> {
        let path = path.strip_prefix('/').unwrap_or(path);
        if path == MASTER_FILE {
            return Some(Self::Master);
        }
        let rest = path.strip_prefix(SITEMAPS_DIR)?.strip_prefix('/')?;
        let (slug, file) = rest.split_once('/')?;
        let locale: LocaleCode = slug.parse().ok()?;
        if locale.slug() != slug {
            return None;
        }
        if file == LOCALE_INDEX_FILE {
            return Some(Self::LocaleIndex { locale });
        }
        let template_key = file.strip_suffix(".xml")?;
        if template_key.is_empty() || template_key.contains('/') {
            return None;
        }
        Some(Self::Partition {
            locale,
            template_key: template_key.to_string(),
        })
    }

    /// Locale of index and partition documents.
    pub const fn locale(&self) -> Option<&LocaleCode> {
        match self {
            Self::Master => None,
            Self::LocaleIndex { locale } | Self::Partition { locale, .. } => Some(locale),
        }
    }

    /// Commit rank: partitions first, then locale indexes, then the master.
    pub(crate) const fn tier(&self) -> u8 {
        match self {
            Self::Partition { .. } => 0,
            Self::LocaleIndex { .. } => 1,
            Self::Master => 2,
        }
    }
}

impl fmt::Display for SitemapLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.relative_path())
    }
}

impl Serialize for SitemapLocation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.relative_path())
    }
}
