//! Rendering of the three sitemap tiers from store data.
//!
//! The partitioner only produces [`SitemapDocument`]s; staging and
//! committing them is left to [`crate::generate`].

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, instrument};

use super::writer::{IndexEntry, UrlEntry, write_sitemap_index, write_urlset};
use super::{SitemapDocument, SitemapLocation};
use crate::mesh::HreflangMeshBuilder;
use crate::route::SiteUrl;
use crate::store::{StoreReader, VariantStore};
use crate::{ConceptId, Locale, LocaleCode, Result};

/// Renders the three sitemap tiers for one generation date.
///
/// All `<lastmod>` values that do not come from content use the fixed
/// `generated_on` date, never the clock.
pub struct SitemapPartitioner<S: ?Sized> {
    reader: StoreReader<S>,
    meshes: HreflangMeshBuilder<S>,
    site: SiteUrl,
    generated_on: NaiveDate,
}

impl<S: ?Sized> Clone for SitemapPartitioner<S> {
    fn clone(&self) -> Self {
        Self {
            reader: self.reader.clone(),
            meshes: self.meshes.clone(),
            site: self.site.clone(),
            generated_on: self.generated_on,
        }
    }
}

impl<S: VariantStore + ?Sized> SitemapPartitioner<S> {
    /// Create a partitioner over a shared store.
    pub fn new(store: Arc<S>, site: SiteUrl, generated_on: NaiveDate) -> Self {
        let reader = StoreReader::new(store);
        Self {
            meshes: HreflangMeshBuilder::from_reader(reader.clone(), site.clone()),
            reader,
            site,
            generated_on,
        }
    }

    /// The run's generation date.
    pub const fn generated_on(&self) -> NaiveDate {
        self.generated_on
    }

    /// Active locales in `(country_code, language_code)` order.
    pub async fn active_locales(&self) -> Result<Vec<Locale>> {
        self.reader.active_locales().await
    }

    /// `/sitemap.xml` over the currently active locales.
    #[instrument(skip(self))]
    pub async fn master_index(&self) -> Result<SitemapDocument> {
        let locales = self.active_locales().await?;
        self.master_index_for(&locales)
    }

    /// `/sitemap.xml` over the given locales.
    pub fn master_index_for(&self, locales: &[Locale]) -> Result<SitemapDocument> {
        let codes: BTreeSet<&LocaleCode> = locales.iter().map(|l| &l.code).collect();
        let entries: Vec<IndexEntry> = codes
            .into_iter()
            .map(|code| IndexEntry {
                loc: SitemapLocation::locale_index(code).url(&self.site),
                lastmod: self.generated_on,
            })
            .collect();

        Ok(SitemapDocument {
            location: SitemapLocation::Master,
            entry_count: entries.len(),
            xml: write_sitemap_index(&entries)?,
        })
    }

    /// Distinct sorted template keys among a locale's indexable variants.
    #[instrument(level = "debug", skip(self), fields(locale = %locale))]
    pub async fn template_keys(&self, locale: &LocaleCode) -> Result<Vec<String>> {
        let variants = self.reader.indexable_variants(locale, None).await?;
        let keys: BTreeSet<String> = variants.into_iter().map(|v| v.template_key).collect();
        debug!(templates = keys.len(), "Collected template keys");
        Ok(keys.into_iter().collect())
    }

    /// `/sitemaps/{cc}-{ll}/sitemap-index.xml`.
    pub async fn locale_index(&self, locale: &LocaleCode) -> Result<SitemapDocument> {
        let keys = self.template_keys(locale).await?;
        self.locale_index_for(locale, &keys)
    }

    /// Locale index over already-known template keys.
    pub fn locale_index_for(
        &self,
        locale: &LocaleCode,
        template_keys: &[String],
    ) -> Result<SitemapDocument> {
        let keys: BTreeSet<&str> = template_keys.iter().map(String::as_str).collect();
        let entries: Vec<IndexEntry> = keys
            .into_iter()
            .map(|key| IndexEntry {
                loc: SitemapLocation::partition(locale, key).url(&self.site),
                lastmod: self.generated_on,
            })
            .collect();

        Ok(SitemapDocument {
            location: SitemapLocation::locale_index(locale),
            entry_count: entries.len(),
            xml: write_sitemap_index(&entries)?,
        })
    }

    /// `/sitemaps/{cc}-{ll}/{template}.xml`.
    ///
    /// Meshes for every concept in the partition are fetched in one batch
    /// before any `<url>` is written, so the number of mesh queries depends
    /// on distinct concepts, not on URLs. A variant that lost its locale slot
    /// in the mesh to a sibling is left out, so every listed URL appears in
    /// its own alternates. Zero variants produce a valid empty `<urlset>`.
    #[instrument(skip(self), fields(locale = %locale, template = %template_key))]
    pub async fn template_partition(
        &self,
        locale: &LocaleCode,
        template_key: &str,
    ) -> Result<SitemapDocument> {
        let variants = self
            .reader
            .indexable_variants(locale, Some(template_key))
            .await?;

        let concept_ids: Vec<ConceptId> = variants
            .iter()
            .map(|v| v.concept_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let meshes = self.meshes.meshes_for(&concept_ids).await?;

        let entries: Vec<UrlEntry> = variants
            .iter()
            .filter_map(|variant| {
                let loc = self.site.absolute(&variant.path);
                let mesh = meshes.get(&variant.concept_id)?;
                if !mesh.languages().any(|link| link.href == loc) {
                    debug!(
                        path = %variant.path,
                        concept_id = %variant.concept_id,
                        "Variant is not in its concept's mesh; leaving it out"
                    );
                    return None;
                }
                Some(UrlEntry {
                    loc,
                    lastmod: variant
                        .updated_at
                        .map_or(self.generated_on, |ts| ts.date_naive()),
                    alternates: mesh.links().to_vec(),
                })
            })
            .collect();

        info!(
            urls = entries.len(),
            concepts = concept_ids.len(),
            "Rendered sitemap partition"
        );

        Ok(SitemapDocument {
            location: SitemapLocation::partition(locale, template_key),
            entry_count: entries.len(),
            xml: write_urlset(&entries)?,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::sitemap::{ParsedSitemap, parse_sitemap};
    use crate::store::testing::{CountingStore, DownStore, PerConceptOnly, locale, row};
    use crate::store::{RawVariantRow, Snapshot, SnapshotStore};
    use crate::{Error, X_DEFAULT};

    fn site() -> SiteUrl {
        SiteUrl::parse("https://haulcommand.com").unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn us_en() -> LocaleCode {
        LocaleCode::new("US", "en")
    }

    fn snapshot() -> Snapshot {
        let mut preview = row(3, "US", "en", "/us/en/city/tampa");
        preview.indexing_mode = Some("preview".into());
        let mut dated = row(1, "US", "en", "/us/en/city/miami");
        dated.updated_at = Some("2025-04-20T08:00:00Z".into());
        dated.is_default = Some(true);

        Snapshot {
            locales: vec![locale("US", "es"), locale("US", "en"), locale("CA", "en")],
            concepts: Vec::new(),
            variants: vec![
                dated,
                row(1, "US", "es", "/us/es/city/miami"),
                row(2, "US", "en", "/us/en/corridor/i-75"),
                row(2, "US", "es", "/us/es/corridor/i-75"),
                preview,
            ],
        }
    }

    fn partitioner(snapshot: Snapshot) -> SitemapPartitioner<SnapshotStore> {
        SitemapPartitioner::new(Arc::new(SnapshotStore::new(snapshot)), site(), date())
    }

    #[tokio::test]
    async fn master_index_lists_active_locales_in_order() {
        let doc = partitioner(snapshot()).master_index().await.unwrap();
        assert_eq!(doc.location, SitemapLocation::Master);
        assert_eq!(doc.entry_count, 3);

        let ParsedSitemap::Index(entries) = parse_sitemap(&doc.xml).unwrap() else {
            panic!("expected index");
        };
        let locs: Vec<_> = entries.iter().map(|e| e.loc.as_str()).collect();
        assert_eq!(
            locs,
            [
                "https://haulcommand.com/sitemaps/ca-en/sitemap-index.xml",
                "https://haulcommand.com/sitemaps/us-en/sitemap-index.xml",
                "https://haulcommand.com/sitemaps/us-es/sitemap-index.xml",
            ]
        );
        assert!(entries.iter().all(|e| e.lastmod == Some(date())));
    }

    #[tokio::test]
    async fn locale_index_lists_indexable_templates() {
        let partitioner = partitioner(snapshot());
        assert_eq!(partitioner.template_keys(&us_en()).await.unwrap(), ["city", "corridor"]);

        let doc = partitioner.locale_index(&us_en()).await.unwrap();
        assert_eq!(doc.entry_count, 2);
        assert!(doc.xml.contains("<loc>https://haulcommand.com/sitemaps/us-en/city.xml</loc>"));
        assert!(doc.xml.contains("<loc>https://haulcommand.com/sitemaps/us-en/corridor.xml</loc>"));

        let empty = partitioner
            .locale_index(&LocaleCode::new("CA", "en"))
            .await
            .unwrap();
        assert_eq!(empty.entry_count, 0);
        assert!(parse_sitemap(&empty.xml).unwrap().is_empty());
    }

    #[tokio::test]
    async fn partition_embeds_full_mesh_per_url() {
        let doc = partitioner(snapshot())
            .template_partition(&us_en(), "city")
            .await
            .unwrap();
        assert_eq!(doc.entry_count, 1);

        let ParsedSitemap::UrlSet(urls) = parse_sitemap(&doc.xml).unwrap() else {
            panic!("expected urlset");
        };
        let miami = &urls[0];
        assert_eq!(miami.loc, "https://haulcommand.com/us/en/city/miami");
        assert_eq!(miami.lastmod, NaiveDate::from_ymd_opt(2025, 4, 20));
        let tags: Vec<_> = miami.alternates.iter().map(|l| l.hreflang.as_str()).collect();
        assert_eq!(tags, ["en-US", "es-US", X_DEFAULT]);
    }

    #[tokio::test]
    async fn duplicate_locale_loser_is_not_listed() {
        let mut winner = row(1, "US", "en", "/us/en/city/miami");
        winner.quality_score = Some(0.9);
        let mut loser = row(1, "US", "en", "/us/en/city/miami-fl");
        loser.quality_score = Some(0.3);
        let partitioner = partitioner(Snapshot {
            variants: vec![loser, winner, row(1, "US", "es", "/us/es/city/miami")],
            ..Snapshot::default()
        });

        let doc = partitioner.template_partition(&us_en(), "city").await.unwrap();
        assert_eq!(doc.entry_count, 1);
        let ParsedSitemap::UrlSet(urls) = parse_sitemap(&doc.xml).unwrap() else {
            panic!("expected urlset");
        };
        assert_eq!(urls[0].loc, "https://haulcommand.com/us/en/city/miami");
        assert!(!doc.xml.contains("miami-fl"));
        for url in &urls {
            assert!(url.alternates.iter().any(|l| !l.is_x_default() && l.href == url.loc));
        }
    }

    #[tokio::test]
    async fn partition_without_updated_at_uses_generation_date() {
        let doc = partitioner(snapshot())
            .template_partition(&us_en(), "corridor")
            .await
            .unwrap();
        assert!(doc.xml.contains("<lastmod>2025-06-01</lastmod>"));
    }

    #[tokio::test]
    async fn empty_city_partition_is_valid_urlset() {
        let partitioner = partitioner(Snapshot::default());
        let doc = partitioner.template_partition(&us_en(), "city").await.unwrap();

        assert_eq!(doc.entry_count, 0);
        assert_eq!(
            doc.location,
            SitemapLocation::partition(&us_en(), "city")
        );
        assert_eq!(parse_sitemap(&doc.xml).unwrap(), ParsedSitemap::UrlSet(Vec::new()));
        assert!(doc.xml.contains(r#"xmlns:xhtml="http://www.w3.org/1999/xhtml""#));
    }

    #[tokio::test]
    async fn regeneration_is_byte_identical() {
        let first = partitioner(snapshot());
        let mut reordered = snapshot();
        reordered.variants.reverse();
        reordered.locales.reverse();
        let second = partitioner(reordered);

        for template in ["city", "corridor"] {
            let a = first.template_partition(&us_en(), template).await.unwrap();
            let b = second.template_partition(&us_en(), template).await.unwrap();
            assert_eq!(a.xml, b.xml, "{template}");
        }
        assert_eq!(
            first.master_index().await.unwrap().xml,
            second.master_index().await.unwrap().xml
        );
    }

    fn wide_partition(concepts: i64) -> Snapshot {
        let variants: Vec<RawVariantRow> = (0..concepts)
            .flat_map(|concept| {
                [
                    row(concept, "US", "en", &format!("/us/en/city/c{concept}")),
                    row(concept, "US", "es", &format!("/us/es/city/c{concept}")),
                ]
            })
            .collect();
        Snapshot {
            variants,
            ..Snapshot::default()
        }
    }

    #[tokio::test]
    async fn mesh_queries_do_not_scale_with_urls() {
        let counting = CountingStore::new(SnapshotStore::new(wide_partition(200)));
        let partitioner = SitemapPartitioner::new(Arc::clone(&counting), site(), date());

        let doc = partitioner.template_partition(&us_en(), "city").await.unwrap();
        assert_eq!(doc.entry_count, 200);
        assert_eq!(counting.mesh_queries(), 1);
        assert_eq!(counting.by_path.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn per_concept_store_stays_linear_in_concepts() {
        let counting = CountingStore::new(SnapshotStore::new(wide_partition(7)));
        let partitioner = SitemapPartitioner::new(
            Arc::new(PerConceptOnly(Arc::clone(&counting))),
            site(),
            date(),
        );

        let doc = partitioner.template_partition(&us_en(), "city").await.unwrap();
        assert_eq!(doc.entry_count, 7);
        assert_eq!(counting.mesh_queries(), 7);
    }

    #[tokio::test]
    async fn store_failure_aborts_partition() {
        let partitioner = SitemapPartitioner::new(Arc::new(DownStore), site(), date());
        let err = partitioner
            .template_partition(&us_en(), "city")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable(_)));
    }
}
