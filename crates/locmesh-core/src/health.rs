//! Health of a published sitemap tree.
//!
//! Walks the tree from `/sitemap.xml` down through every locale index to every
//! partition, producing one [`HealthCheck`] per document. Missing or
//! unparseable documents, and index entries pointing at files that do not
//! exist, are errors. Empty partitions, files no index references and an
//! incomplete last run are warnings.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::generate::PublishManifest;
use crate::route::SiteUrl;
use crate::sitemap::{ParsedSitemap, SitemapLocation, parse_sitemap};

/// Outcome of one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Nothing to report.
    Ok,
    /// Published but worth a look.
    Warn,
    /// Broken for crawlers.
    Error,
}

/// One checked document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    /// Document path relative to the output root.
    pub document: String,
    /// Result.
    pub status: HealthStatus,
    /// `<url>` entries for partitions, `<sitemap>` entries for indexes.
    pub url_count: usize,
    /// Human-readable detail, absent when the document is fine.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HealthCheck {
    fn ok(location: &SitemapLocation, count: usize) -> Self {
        Self {
            document: location.relative_path(),
            status: HealthStatus::Ok,
            url_count: count,
            message: None,
        }
    }

    fn flagged(document: String, status: HealthStatus, message: impl Into<String>) -> Self {
        Self {
            document,
            status,
            url_count: 0,
            message: Some(message.into()),
        }
    }
}

/// Every check of a tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    /// Worst status among the checks.
    pub overall_status: HealthStatus,
    /// Total `<url>` entries across healthy partitions.
    pub url_count: usize,
    /// Checks in walk order.
    pub checks: Vec<HealthCheck>,
}

impl HealthReport {
    fn from_checks(checks: Vec<HealthCheck>) -> Self {
        let overall_status = checks
            .iter()
            .map(|c| c.status)
            .max()
            .unwrap_or(HealthStatus::Ok);
        let url_count = checks
            .iter()
            .filter(|c| c.document.ends_with(".xml") && !is_index(&c.document))
            .map(|c| c.url_count)
            .sum();
        Self {
            overall_status,
            url_count,
            checks,
        }
    }

    /// Checks with the given status.
    pub fn with_status(&self, status: HealthStatus) -> impl Iterator<Item = &HealthCheck> {
        self.checks.iter().filter(move |c| c.status == status)
    }

    /// Whether no check is an error.
    pub fn is_healthy(&self) -> bool {
        self.overall_status != HealthStatus::Error
    }
}

fn is_index(document: &str) -> bool {
    matches!(
        SitemapLocation::parse(document),
        Some(SitemapLocation::Master | SitemapLocation::LocaleIndex { .. })
    )
}

/// Check the tree published under `root` for `site`.
pub fn check_published(root: &Path, site: &SiteUrl) -> HealthReport {
    let mut walker = Walker {
        root,
        site,
        checks: Vec::new(),
        referenced: BTreeSet::new(),
    };

    if let Some(locales) = walker.index(&SitemapLocation::Master) {
        for locale_index in locales {
            let Some(partitions) = walker.index(&locale_index) else {
                continue;
            };
            for partition in partitions {
                walker.partition(&partition);
            }
        }
    }

    walker.unreferenced();
    walker.manifest();
    debug!(checks = walker.checks.len(), "Sitemap health walk finished");
    HealthReport::from_checks(walker.checks)
}

struct Walker<'a> {
    root: &'a Path,
    site: &'a SiteUrl,
    checks: Vec<HealthCheck>,
    referenced: BTreeSet<String>,
}

impl Walker<'_> {
    fn read(&mut self, location: &SitemapLocation) -> Option<ParsedSitemap> {
        let document = location.relative_path();
        self.referenced.insert(document.clone());

        let xml = match fs::read_to_string(location.file_path(self.root)) {
            Ok(xml) => xml,
            Err(e) => {
                self.checks
                    .push(HealthCheck::flagged(document, HealthStatus::Error, format!("missing: {e}")));
                return None;
            },
        };
        match parse_sitemap(&xml) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                self.checks
                    .push(HealthCheck::flagged(document, HealthStatus::Error, e.to_string()));
                None
            },
        }
    }

    /// Check an index document and return the child locations it lists.
    fn index(&mut self, location: &SitemapLocation) -> Option<Vec<SitemapLocation>> {
        let entries = match self.read(location)? {
            ParsedSitemap::Index(entries) => entries,
            ParsedSitemap::UrlSet(_) => {
                self.checks.push(HealthCheck::flagged(
                    location.relative_path(),
                    HealthStatus::Error,
                    "expected <sitemapindex>, found <urlset>",
                ));
                return None;
            },
        };

        let mut children = Vec::with_capacity(entries.len());
        let mut invalid = Vec::new();
        for entry in &entries {
            let child = self
                .site
                .relative(&entry.loc)
                .and_then(SitemapLocation::parse)
                .filter(|child| is_child_of(location, child));
            match child {
                Some(child) => children.push(child),
                None => invalid.push(entry.loc.as_str()),
            }
        }

        if invalid.is_empty() {
            self.checks.push(HealthCheck::ok(location, entries.len()));
        } else {
            self.checks.push(HealthCheck {
                url_count: entries.len(),
                ..HealthCheck::flagged(
                    location.relative_path(),
                    HealthStatus::Error,
                    format!("unexpected entries: {}", invalid.join(", ")),
                )
            });
        }
        Some(children)
    }

    fn partition(&mut self, location: &SitemapLocation) {
        let Some(parsed) = self.read(location) else {
            return;
        };
        let check = match parsed {
            ParsedSitemap::UrlSet(urls) if urls.is_empty() => HealthCheck::flagged(
                location.relative_path(),
                HealthStatus::Warn,
                "empty partition",
            ),
            ParsedSitemap::UrlSet(urls) => HealthCheck::ok(location, urls.len()),
            ParsedSitemap::Index(_) => HealthCheck::flagged(
                location.relative_path(),
                HealthStatus::Error,
                "expected <urlset>, found <sitemapindex>",
            ),
        };
        self.checks.push(check);
    }

    /// Warn about published documents no index points at.
    fn unreferenced(&mut self) {
        let Ok(locales) = fs::read_dir(self.root.join("sitemaps")) else {
            return;
        };
        let mut orphans = BTreeSet::new();
        for dir in locales.flatten().filter(|e| e.path().is_dir()) {
            let Ok(files) = fs::read_dir(dir.path()) else {
                continue;
            };
            for file in files.flatten() {
                let relative = format!(
                    "sitemaps/{}/{}",
                    dir.file_name().to_string_lossy(),
                    file.file_name().to_string_lossy()
                );
                if SitemapLocation::parse(&relative).is_some() && !self.referenced.contains(&relative)
                {
                    orphans.insert(relative);
                }
            }
        }
        for document in orphans {
            self.checks.push(HealthCheck::flagged(
                document,
                HealthStatus::Warn,
                "not referenced by any index",
            ));
        }
    }

    fn manifest(&mut self) {
        let document = crate::generate::MANIFEST_FILE.to_string();
        match PublishManifest::load(self.root) {
            Ok(Some(manifest)) if !manifest.is_compatible() => {
                self.checks.push(HealthCheck::flagged(
                    document,
                    HealthStatus::Warn,
                    format!("unsupported schema version {}", manifest.schema_version),
                ));
            },
            Ok(Some(manifest)) if !manifest.complete => {
                self.checks.push(HealthCheck::flagged(
                    document,
                    HealthStatus::Warn,
                    format!("run {} did not publish every document", manifest.run_id),
                ));
            },
            Ok(Some(manifest)) => self.checks.push(HealthCheck {
                document,
                status: HealthStatus::Ok,
                url_count: 0,
                message: Some(format!("generated on {}", manifest.generated_on)),
            }),
            Ok(None) => {},
            Err(e) => self
                .checks
                .push(HealthCheck::flagged(document, HealthStatus::Warn, e.to_string())),
        }
    }
}

fn is_child_of(parent: &SitemapLocation, child: &SitemapLocation) -> bool {
    match (parent, child) {
        (SitemapLocation::Master, SitemapLocation::LocaleIndex { .. }) => true,
        (
            SitemapLocation::LocaleIndex { locale },
            SitemapLocation::Partition {
                locale: child_locale,
                ..
            },
        ) => locale == child_locale,
        _ => false,
    }
}
