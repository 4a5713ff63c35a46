//! locmesh CLI - hreflang meshes, metadata contracts and sitemap publishing
//!
//! This is the main entry point for the locmesh command-line interface.
//! Command implementations live in [`commands`].

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod cli;
mod commands;
mod output;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    initialize_logging(&cli)?;

    execute_command(cli).await
}

fn initialize_logging(cli: &Cli) -> Result<()> {
    let level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };
    // RUST_LOG wins over the flags when set.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr);

    if cli.json_logs {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

async fn execute_command(cli: Cli) -> Result<ExitCode> {
    let ctx = commands::Context::load(&cli)?;

    match cli.command {
        Commands::Generate {
            date,
            concurrency,
            output_dir,
        } => {
            commands::generate::execute(&ctx, date, concurrency.map(usize::from), output_dir)
                .await
        },
        Commands::Meta { path } => commands::meta::execute(&ctx, &path).await,
        Commands::Mesh { path, concept } => {
            commands::mesh::execute(&ctx, path.as_deref(), concept.as_deref()).await
        },
        Commands::Health { output_dir } => commands::health::execute(&ctx, output_dir),
    }
}
