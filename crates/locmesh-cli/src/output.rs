//! Output formats shared by every command.

use anyhow::Result;
use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use locmesh_core::HealthStatus;
use serde::Serialize;

/// Output format options supported by the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// Pretty-printed JSON on stdout
    Json,
}

/// Print `value` as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

/// Status icon in the colors the health report uses.
pub fn status_icon(status: HealthStatus) -> ColoredString {
    match status {
        HealthStatus::Ok => "✓".green(),
        HealthStatus::Warn => "⚠".yellow(),
        HealthStatus::Error => "✗".red(),
    }
}
