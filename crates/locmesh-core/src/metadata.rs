//! Render-ready page metadata.
//!
//! [`MetadataAssembler`] is pure: it turns a resolved variant (or nothing) and
//! its mesh into a [`MetadataContract`]. [`MetadataService`] is the
//! request-time pipeline around it and never fails; a store outage degrades to
//! the same neutral contract an unknown path gets.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::mesh::HreflangMeshBuilder;
use crate::resolver::VariantResolver;
use crate::route::{SiteUrl, fallback_title};
use crate::store::{StoreReader, VariantStore};
use crate::{IndexingMode, Mesh, Variant};

/// Longest description emitted, in characters, ellipsis included.
pub const MAX_DESCRIPTION_CHARS: usize = 160;

const ELLIPSIS: char = '…';

/// Robots directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Robots {
    /// Allow indexing.
    pub index: bool,
    /// Allow following links. Always true.
    pub follow: bool,
}

impl Robots {
    /// Directives for an indexing mode.
    pub const fn for_mode(mode: Option<IndexingMode>) -> Self {
        Self {
            index: matches!(mode, Some(IndexingMode::Index)),
            follow: true,
        }
    }
}

/// Alternate-language links keyed by hreflang.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alternates {
    /// hreflang → absolute URL, excluding `x-default`.
    pub languages: BTreeMap<String, String>,
}

/// Open Graph fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenGraph {
    /// `og:title`.
    pub title: String,
    /// `og:description`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `og:url`, the canonical URL.
    pub url: String,
    /// `og:locale` in `en_US` form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    /// `og:site_name`.
    pub site_name: String,
}

/// Twitter card fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwitterCard {
    /// Card type; always `summary`.
    pub card: String,
    /// `twitter:title`.
    pub title: String,
    /// `twitter:description`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Everything a page renderer needs for its `<head>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataContract {
    /// Page title.
    pub title: String,
    /// Meta description; absent rather than empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Robots directives.
    pub robots: Robots,
    /// Absolute canonical URL.
    pub canonical: String,
    /// Alternate-language links.
    pub alternates: Alternates,
    /// The mesh's `x-default` URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_default: Option<String>,
    /// Open Graph mirror of the fields above.
    pub open_graph: OpenGraph,
    /// Twitter card mirror of the fields above.
    pub twitter: TwitterCard,
}

/// Collapse runs of whitespace to single spaces and trim.
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Trim a description and cap it at [`MAX_DESCRIPTION_CHARS`].
///
/// Blank input yields `None`. Input that fits is returned trimmed but
/// otherwise untouched; longer input is cut and ends with `…`.
pub fn truncate_description(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.chars().count() <= MAX_DESCRIPTION_CHARS {
        return Some(trimmed.to_string());
    }
    let mut cut: String = trimmed.chars().take(MAX_DESCRIPTION_CHARS - 1).collect();
    cut.truncate(cut.trim_end().len());
    cut.push(ELLIPSIS);
    Some(cut)
}

/// Pure metadata assembly for one site.
#[derive(Debug, Clone)]
pub struct MetadataAssembler {
    site: SiteUrl,
    site_name: String,
}

impl MetadataAssembler {
    /// Create an assembler.
    pub fn new(site: SiteUrl, site_name: impl Into<String>) -> Self {
        Self {
            site,
            site_name: site_name.into(),
        }
    }

    /// Site URLs are made absolute against.
    pub const fn site(&self) -> &SiteUrl {
        &self.site
    }

    /// Title derived from the path, suffixed with the site name.
    pub fn fallback_title(&self, path: &str) -> String {
        fallback_title(path).map_or_else(
            || self.site_name.clone(),
            |title| format!("{title} | {}", self.site_name),
        )
    }

    /// Build the contract for `requested_path`.
    ///
    /// With no variant the result is the minimal contract: fallback title,
    /// not indexable, no alternates, canonical at the requested path.
    pub fn assemble(
        &self,
        requested_path: &str,
        variant: Option<&Variant>,
        mesh: &Mesh,
    ) -> MetadataContract {
        let Some(variant) = variant else {
            return self.minimal(requested_path);
        };

        let title = Some(normalize_whitespace(&variant.title))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| self.fallback_title(&variant.path));
        let description = truncate_description(&variant.meta_description);
        let canonical_path = if variant.canonical_path.trim().is_empty() {
            &variant.path
        } else {
            &variant.canonical_path
        };
        let canonical = self.site.absolute(canonical_path);

        let languages = mesh
            .languages()
            .map(|link| (link.hreflang.clone(), link.href.clone()))
            .collect();

        self.contract(
            title,
            description,
            Robots::for_mode(Some(variant.indexing_mode)),
            canonical,
            Alternates { languages },
            mesh.x_default().map(str::to_string),
            Some(variant.hreflang.replace('-', "_")),
        )
    }

    /// Neutral, non-indexable contract for a path with no usable variant.
    pub fn minimal(&self, requested_path: &str) -> MetadataContract {
        self.contract(
            self.fallback_title(requested_path),
            None,
            Robots::for_mode(None),
            self.site.absolute(requested_path),
            Alternates::default(),
            None,
            None,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn contract(
        &self,
        title: String,
        description: Option<String>,
        robots: Robots,
        canonical: String,
        alternates: Alternates,
        x_default: Option<String>,
        og_locale: Option<String>,
    ) -> MetadataContract {
        MetadataContract {
            open_graph: OpenGraph {
                title: title.clone(),
                description: description.clone(),
                url: canonical.clone(),
                locale: og_locale,
                site_name: self.site_name.clone(),
            },
            twitter: TwitterCard {
                card: "summary".to_string(),
                title: title.clone(),
                description: description.clone(),
            },
            title,
            description,
            robots,
            canonical,
            alternates,
            x_default,
        }
    }
}

/// Request-time metadata pipeline: resolve, build mesh, assemble.
pub struct MetadataService<S: ?Sized> {
    resolver: VariantResolver<S>,
    meshes: HreflangMeshBuilder<S>,
    assembler: MetadataAssembler,
}

impl<S: ?Sized> Clone for MetadataService<S> {
    fn clone(&self) -> Self {
        Self {
            resolver: self.resolver.clone(),
            meshes: self.meshes.clone(),
            assembler: self.assembler.clone(),
        }
    }
}

impl<S: VariantStore + ?Sized> MetadataService<S> {
    /// Create a service over a shared store.
    pub fn new(store: Arc<S>, site: SiteUrl, site_name: impl Into<String>) -> Self {
        let reader = StoreReader::new(store);
        Self {
            resolver: VariantResolver::from_reader(reader.clone()),
            meshes: HreflangMeshBuilder::from_reader(reader, site.clone()),
            assembler: MetadataAssembler::new(site, site_name),
        }
    }

    /// The pure assembler used by this service.
    pub const fn assembler(&self) -> &MetadataAssembler {
        &self.assembler
    }

    /// The mesh builder used by this service.
    pub const fn meshes(&self) -> &HreflangMeshBuilder<S> {
        &self.meshes
    }

    /// Metadata for `path`. Always returns a usable contract.
    #[instrument(level = "debug", skip(self))]
    pub async fn metadata_for_path(&self, path: &str) -> MetadataContract {
        match self.resolver.resolve(path).await {
            Ok(Some(variant)) => {
                let mesh = self.meshes.mesh_for(variant.concept_id).await;
                self.assembler.assemble(path, Some(&variant), &mesh)
            },
            Ok(None) => self.assembler.minimal(path),
            Err(e) => {
                warn!(path, error = %e, "Store unavailable; serving minimal metadata");
                self.assembler.minimal(path)
            },
        }
    }
}
