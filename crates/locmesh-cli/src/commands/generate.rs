//! Generate command - render and publish the sitemap tree

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use chrono::{NaiveDate, Utc};
use colored::Colorize;
use locmesh_core::generate::PublishStatus;
use locmesh_core::{
    CancelFlag, GenerationReport, HealthStatus, SitemapGenerator, SitemapPartitioner,
    SitemapPublisher,
};
use tracing::warn;

use super::Context;
use crate::output::{OutputFormat, print_json, status_icon};

pub async fn execute(
    ctx: &Context,
    date: Option<NaiveDate>,
    concurrency: Option<usize>,
    output_dir: Option<PathBuf>,
) -> Result<ExitCode> {
    let store = ctx.store().await?;
    let generated_on = date.unwrap_or_else(|| Utc::now().date_naive());
    let root = ctx.output_dir(output_dir);

    let cancel = CancelFlag::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; stopping before the next template");
            on_signal.cancel();
        }
    });

    let generator = SitemapGenerator::new(
        SitemapPartitioner::new(store, ctx.config.site.base_url.clone(), generated_on),
        SitemapPublisher::new(&root),
    )
    .with_concurrency(concurrency.unwrap_or(ctx.config.sitemap.concurrency))
    .with_cancel_flag(cancel);

    let report = generator
        .run()
        .await
        .with_context(|| format!("Sitemap generation into {} failed", root.display()))?;

    match ctx.format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => print_text_report(&report, &root),
    }

    Ok(if report.is_complete() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_text_report(report: &GenerationReport, root: &std::path::Path) {
    let status = if report.is_complete() {
        HealthStatus::Ok
    } else {
        HealthStatus::Error
    };
    println!(
        "{} {} {} for {} locale(s) on {}",
        status_icon(status),
        "Sitemaps".bold(),
        if report.is_complete() {
            "published"
        } else {
            "partially published"
        },
        report.locales,
        report.generated_on
    );
    println!("  Output: {}", root.display());
    println!(
        "  {} written, {} unchanged, {} URLs",
        report.written().to_string().green(),
        report.unchanged(),
        report.url_count()
    );

    for doc in report
        .documents
        .iter()
        .filter(|d| d.status == PublishStatus::Written)
    {
        println!("  {} {} ({} entries)", "+".green(), doc.location, doc.entry_count);
    }
    for failure in &report.failures {
        println!(
            "  {} {}: {}",
            status_icon(HealthStatus::Error),
            failure.location,
            failure.error
        );
    }
}
