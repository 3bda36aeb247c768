use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;
mod exit_codes;

#[derive(Parser)]
#[command(
    name = "slipway",
    about = "Slipway — zero-downtime blue-green releases on a single host",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Path to slipway.toml.
    #[arg(short, long, global = true, default_value = "slipway.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy a packaged release artifact to the idle slot.
    ///
    /// Stages the artifact, starts the idle slot, waits for the health
    /// gate, cuts traffic over, drains and stops the old slot, then
    /// prunes old releases. On any failure before cutover the live slot
    /// is untouched.
    Deploy {
        /// Path to the release artifact (tar.gz with release.json).
        #[arg(short, long)]
        artifact: PathBuf,
    },
    /// Show the live slot, ports, and the release backing each slot.
    Status,
    /// List releases in the store, newest first.
    Releases,
    /// Delete releases beyond the retention window.
    ///
    /// Releases currently backing either slot are never deleted.
    Prune {
        /// Override [deploy].keep_releases for this sweep.
        #[arg(long)]
        keep: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,slipway=debug".parse().expect("default filter")),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Deploy { artifact } => commands::deploy::run(&cli.config, &artifact).await,
        Commands::Status => commands::status::run(&cli.config),
        Commands::Releases => commands::releases::run(&cli.config),
        Commands::Prune { keep } => commands::prune::run(&cli.config, keep),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_codes::ABORTED)
        }
    }
}
