//! # CLI Structure and Argument Parsing
//!
//! ```bash
//! # Publish the sitemap tree for today
//! locmesh generate
//!
//! # Reproduce a past run byte for byte
//! locmesh generate --date 2025-06-01 --concurrency 8
//!
//! # Inspect one page
//! locmesh meta /us/en/city/miami --format json
//! locmesh mesh /us/en/corridor/i-75
//! locmesh mesh --concept corridor:i-75
//!
//! # Check what is live
//! locmesh health
//! ```
//!
//! Global options (`--config`, `--snapshot`, `--format`, logging flags) apply
//! to every command.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{ArgGroup, Parser, Subcommand};

use crate::output::OutputFormat;

/// Main CLI structure for the `locmesh` command
#[derive(Parser, Clone, Debug)]
#[command(name = "locmesh")]
#[command(version)]
#[command(about = "locmesh - multi-locale metadata and sitemap publishing", long_about = None)]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log progress at info level
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Log at debug level
    #[arg(long, global = true)]
    pub debug: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long = "json-logs", global = true)]
    pub json_logs: bool,

    /// Output format
    #[arg(long, short = 'f', global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Path to configuration file (overrides autodiscovery). Also via `LOCMESH_CONFIG`.
    #[arg(long, global = true, value_name = "FILE", env = "LOCMESH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Store snapshot to read instead of `store.snapshot`
    #[arg(long, global = true, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,
}

/// Available subcommands
#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Render and publish the full sitemap tree
    Generate {
        /// Date used for every `<lastmod>` not taken from content (default: today, UTC)
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<NaiveDate>,

        /// Locales rendered concurrently (1-32)
        #[arg(long, value_parser = clap::value_parser!(u16).range(1..=32))]
        concurrency: Option<u16>,

        /// Root of the published tree (overrides `sitemap.output_dir`)
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },

    /// Print the metadata contract of a path
    Meta {
        /// Site path, e.g. `/us/en/city/miami`
        path: String,
    },

    /// Print the hreflang mesh of a path or concept
    #[command(group(ArgGroup::new("target").required(true).args(["path", "concept"])))]
    Mesh {
        /// Site path of any variant of the concept
        path: Option<String>,

        /// Concept id or key, e.g. `42` or `corridor:i-75`
        #[arg(long)]
        concept: Option<String>,
    },

    /// Check the published sitemap tree
    Health {
        /// Root of the published tree (overrides `sitemap.output_dir`)
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_generate_options() {
        let cli = Cli::try_parse_from([
            "locmesh",
            "generate",
            "--date",
            "2025-06-01",
            "--concurrency",
            "8",
            "--format",
            "json",
        ])
        .unwrap();
        let Commands::Generate {
            date, concurrency, ..
        } = cli.command
        else {
            panic!("expected generate");
        };
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 6, 1));
        assert_eq!(concurrency, Some(8));
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn rejects_out_of_range_concurrency() {
        assert!(Cli::try_parse_from(["locmesh", "generate", "--concurrency", "0"]).is_err());
        assert!(Cli::try_parse_from(["locmesh", "generate", "--concurrency", "33"]).is_err());
    }

    #[test]
    fn mesh_requires_a_target() {
        assert!(Cli::try_parse_from(["locmesh", "mesh"]).is_err());
        assert!(Cli::try_parse_from(["locmesh", "mesh", "--concept", "7"]).is_ok());
        assert!(Cli::try_parse_from(["locmesh", "mesh", "/us/en/city/miami"]).is_ok());
    }
}
