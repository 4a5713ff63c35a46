//! Meta command - print the metadata contract of a path

use std::process::ExitCode;

use anyhow::Result;
use colored::Colorize;
use locmesh_core::{MetadataContract, MetadataService};

use super::Context;
use crate::output::{OutputFormat, print_json};

pub async fn execute(ctx: &Context, path: &str) -> Result<ExitCode> {
    let store = ctx.store().await?;
    let service = MetadataService::new(
        store,
        ctx.config.site.base_url.clone(),
        ctx.config.site.name.clone(),
    );

    let contract = service.metadata_for_path(path).await;
    match ctx.format {
        OutputFormat::Json => print_json(&contract)?,
        OutputFormat::Text => print_text(&contract),
    }
    Ok(ExitCode::SUCCESS)
}

fn print_text(contract: &MetadataContract) {
    println!("{}", contract.title.bold());
    if let Some(description) = &contract.description {
        println!("  {description}");
    }
    println!();
    println!("  canonical  {}", contract.canonical);
    println!(
        "  robots     {}, {}",
        if contract.robots.index { "index" } else { "noindex" },
        if contract.robots.follow { "follow" } else { "nofollow" }
    );
    for (hreflang, href) in &contract.alternates.languages {
        println!("  {hreflang:<10} {href}");
    }
    if let Some(x_default) = &contract.x_default {
        println!("  {:<10} {x_default}", "x-default");
    }
}
