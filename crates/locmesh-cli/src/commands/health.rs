//! Health command - check the published sitemap tree

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use colored::Colorize;
use locmesh_core::{HealthReport, check_published};

use super::Context;
use crate::output::{OutputFormat, print_json, status_icon};

pub fn execute(ctx: &Context, output_dir: Option<PathBuf>) -> Result<ExitCode> {
    let root = ctx.output_dir(output_dir);
    let report = check_published(&root, &ctx.config.site.base_url);

    match ctx.format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => print_text_report(&report, &root),
    }

    // Exit with error code if there are errors
    Ok(if report.is_healthy() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_text_report(report: &HealthReport, root: &std::path::Path) {
    println!(
        "{} {}",
        status_icon(report.overall_status),
        "Sitemap Health Check".bold()
    );
    println!("{}", "=".repeat(50));
    println!("  Location: {}", root.display());
    println!("  URLs: {}", report.url_count);

    println!("\n{}", "Documents:".bold());
    for check in &report.checks {
        match &check.message {
            Some(message) => println!(
                "  {} {} ({}): {message}",
                status_icon(check.status),
                check.document,
                check.url_count
            ),
            None => println!(
                "  {} {} ({})",
                status_icon(check.status),
                check.document,
                check.url_count
            ),
        }
    }
}
