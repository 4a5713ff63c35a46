//! Hreflang mesh construction.
//!
//! A concept's mesh lists one alternate link per locale variant plus a single
//! `x-default` link. The mesh is a property of the concept, not of the page
//! asking for it, so every sibling page gets the identical set.
//!
//! ## Determinism
//!
//! Variants arrive in the store ordering contract
//! `(country_code, language_code, path)`. Everything below depends on that
//! order only:
//!
//! - duplicate locales keep the highest `quality_score`, then the smallest path
//! - the default is the first `is_default` variant, else the first variant
//!   whose locale is default-eligible, else the first variant
//! - links are emitted in locale order with `x-default` last

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::resolver::VariantResolver;
use crate::route::SiteUrl;
use crate::store::{StoreReader, VariantStore};
use crate::{ConceptId, HreflangLink, LocaleCode, Mesh, Result, Variant, X_DEFAULT};

/// Builds hreflang meshes from store data.
pub struct HreflangMeshBuilder<S: ?Sized> {
    reader: StoreReader<S>,
    resolver: VariantResolver<S>,
    site: SiteUrl,
}

impl<S: ?Sized> Clone for HreflangMeshBuilder<S> {
    fn clone(&self) -> Self {
        Self {
            reader: self.reader.clone(),
            resolver: self.resolver.clone(),
            site: self.site.clone(),
        }
    }
}

impl<S: VariantStore + ?Sized> HreflangMeshBuilder<S> {
    /// Create a builder over a shared store.
    pub fn new(store: Arc<S>, site: SiteUrl) -> Self {
        Self::from_reader(StoreReader::new(store), site)
    }

    /// Create a builder sharing an existing reader.
    pub fn from_reader(reader: StoreReader<S>, site: SiteUrl) -> Self {
        Self {
            resolver: VariantResolver::from_reader(reader.clone()),
            reader,
            site,
        }
    }

    /// Site the hrefs are made absolute against.
    pub const fn site(&self) -> &SiteUrl {
        &self.site
    }

    /// Mesh of one concept.
    ///
    /// Never fails: a missing concept or a store failure yields an empty mesh,
    /// which callers read as "no known translations".
    #[instrument(level = "debug", skip(self), fields(concept_id = %concept_id))]
    pub async fn mesh_for(&self, concept_id: ConceptId) -> Mesh {
        match self.reader.variants_for_concept(concept_id).await {
            Ok(variants) => build_mesh(concept_id, &variants, &self.site),
            Err(e) => {
                warn!(%concept_id, error = %e, "Mesh lookup failed; returning empty mesh");
                Mesh::empty()
            },
        }
    }

    /// Mesh of the concept owning `path`.
    ///
    /// Unknown paths and store failures yield an empty mesh.
    #[instrument(level = "debug", skip(self))]
    pub async fn mesh_for_path(&self, path: &str) -> Mesh {
        match self.resolver.resolve(path).await {
            Ok(Some(variant)) => self.mesh_for(variant.concept_id).await,
            Ok(None) => Mesh::empty(),
            Err(e) => {
                warn!(path, error = %e, "Path lookup failed; returning empty mesh");
                Mesh::empty()
            },
        }
    }

    /// Meshes of many concepts with a single batched store query.
    ///
    /// Every requested id has an entry. Unlike [`Self::mesh_for`] this
    /// propagates store failures, since batch callers must not publish a
    /// partition with silently missing alternates.
    #[instrument(level = "debug", skip_all, fields(concepts = concept_ids.len()))]
    pub async fn meshes_for(&self, concept_ids: &[ConceptId]) -> Result<BTreeMap<ConceptId, Mesh>> {
        let grouped = self.reader.variants_for_concepts(concept_ids).await?;
        let meshes: BTreeMap<ConceptId, Mesh> = grouped
            .into_iter()
            .map(|(id, variants)| (id, build_mesh(id, &variants, &self.site)))
            .collect();
        debug!(meshes = meshes.len(), "Built meshes");
        Ok(meshes)
    }
}

/// Whether `candidate` should replace `kept` for the same locale.
fn wins_tie_break(candidate: &Variant, kept: &Variant) -> bool {
    candidate
        .quality_score
        .total_cmp(&kept.quality_score)
        .then_with(|| kept.path.cmp(&candidate.path))
        .is_gt()
}

/// Build a concept's mesh from its variants.
///
/// `variants` should already be in the store ordering contract; the result is
/// only as deterministic as that order.
pub fn build_mesh(concept_id: ConceptId, variants: &[Variant], site: &SiteUrl) -> Mesh {
    if variants.is_empty() {
        return Mesh::empty();
    }

    let mut by_locale: BTreeMap<&LocaleCode, &Variant> = BTreeMap::new();
    for variant in variants {
        match by_locale.get(&variant.locale) {
            Some(kept) => {
                let keep_new = wins_tie_break(variant, kept);
                let (winner, loser) = if keep_new {
                    (variant, *kept)
                } else {
                    (*kept, variant)
                };
                warn!(
                    %concept_id,
                    locale = %variant.locale,
                    kept = %winner.path,
                    dropped = %loser.path,
                    "Duplicate locale in concept; keeping higher quality variant"
                );
                if keep_new {
                    by_locale.insert(&variant.locale, variant);
                }
            },
            None => {
                by_locale.insert(&variant.locale, variant);
            },
        }
    }

    let mut seen_tags: BTreeSet<&str> = BTreeSet::new();
    let members: Vec<&Variant> = by_locale
        .into_values()
        .filter(|variant| {
            if seen_tags.insert(variant.hreflang.as_str()) {
                true
            } else {
                warn!(
                    %concept_id,
                    hreflang = %variant.hreflang,
                    path = %variant.path,
                    "Two locales share an hreflang tag; skipping the later one"
                );
                false
            }
        })
        .collect();

    let Some(default) = pick_default(concept_id, &members) else {
        return Mesh::empty();
    };

    let mut links: Vec<HreflangLink> = members
        .iter()
        .map(|variant| HreflangLink::new(variant.hreflang.as_str(), site.absolute(&variant.path)))
        .collect();
    links.push(HreflangLink::new(X_DEFAULT, site.absolute(&default.path)));
    Mesh::from_links(links)
}

fn pick_default<'a>(concept_id: ConceptId, members: &[&'a Variant]) -> Option<&'a Variant> {
    let mut flagged = members.iter().filter(|variant| variant.is_default);
    match (flagged.next(), flagged.count()) {
        (Some(first), 0) => Some(*first),
        (Some(first), extra) => {
            warn!(
                %concept_id,
                flagged = extra + 1,
                chosen = %first.path,
                "Inconsistent mesh: multiple default variants; using the first"
            );
            Some(*first)
        },
        (None, _) => {
            let eligible = members.iter().find(|variant| variant.default_eligible);
            let first = eligible.or_else(|| members.first()).copied()?;
            warn!(
                %concept_id,
                chosen = %first.path,
                eligible = eligible.is_some(),
                "Inconsistent mesh: no default variant; falling back to first eligible in order"
            );
            Some(first)
        },
    }
}
