//! charthawk CLI - discover and validate container images in Helm-style charts

use clap::{Parser, Subcommand};
use miette::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod display;
mod error;
mod exit_codes;

#[derive(Parser)]
#[command(name = "charthawk")]
#[command(author = "Charthawk Contributors")]
#[command(version)]
#[command(about = "Discover and validate container images referenced by chart collections", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover every image referenced by the configured charts
    Images {
        /// Configuration file
        #[arg(short, long, default_value = "charthawk.yaml")]
        config: PathBuf,

        /// Show charts with zero images in the overview table
        #[arg(long)]
        all: bool,

        /// Pin every chart to its latest published version
        #[arg(long)]
        update: bool,

        /// Write the serialized result to <file>.yaml
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show which version each chart constraint resolves to
    Versions {
        /// Configuration file
        #[arg(short, long, default_value = "charthawk.yaml")]
        config: PathBuf,

        /// Resolve to the latest published version instead
        #[arg(long)]
        latest: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Images {
            config,
            all,
            update,
            output,
        } => commands::images::run(&config, all, update, output.as_deref()).await?,

        Commands::Versions { config, latest } => {
            commands::versions::run(&config, latest).await?
        }
    }

    Ok(())
}
