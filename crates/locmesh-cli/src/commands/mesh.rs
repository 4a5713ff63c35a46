//! Mesh command - print the hreflang mesh of a path or concept

use std::process::ExitCode;

use anyhow::{Result, bail};
use locmesh_core::{ConceptId, HreflangLink, HreflangMeshBuilder};
use serde::Serialize;

use super::Context;
use crate::output::{OutputFormat, print_json};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MeshOutput<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    concept_id: Option<ConceptId>,
    links: &'a [HreflangLink],
}

pub async fn execute(ctx: &Context, path: Option<&str>, concept: Option<&str>) -> Result<ExitCode> {
    let store = ctx.store().await?;

    let concept_id = match concept {
        Some(raw) => match raw.parse::<i64>() {
            Ok(id) => Some(ConceptId(id)),
            Err(_) => match store.concept_by_key(raw) {
                Some(found) => Some(found.id),
                None => bail!("Unknown concept '{raw}'"),
            },
        },
        None => None,
    };

    let builder = HreflangMeshBuilder::new(store, ctx.config.site.base_url.clone());
    let mesh = match (concept_id, path) {
        (Some(id), _) => builder.mesh_for(id).await,
        (None, Some(path)) => builder.mesh_for_path(path).await,
        (None, None) => bail!("Provide a path or --concept"),
    };

    match ctx.format {
        OutputFormat::Json => print_json(&MeshOutput {
            path,
            concept_id,
            links: mesh.links(),
        })?,
        OutputFormat::Text => {
            if mesh.is_empty() {
                println!("No alternates found");
            }
            for link in mesh.links() {
                println!("{:<10} {}", link.hreflang, link.href);
            }
        },
    }
    Ok(ExitCode::SUCCESS)
}
