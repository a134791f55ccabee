//! leinup - Leiningen installer for CI runners
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use leinup::cli::{Cli, Commands};
use leinup::config::ConfigManager;
use leinup::error::LeinupResult;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> LeinupResult<()> {
    let cli = Cli::parse();

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("leinup=warn"),
        1 => EnvFilter::new("leinup=info"),
        _ => EnvFilter::new("leinup=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    let manager = match cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new(),
    };

    // Config subcommands manage the file itself and load lazily
    if let Commands::Config(args) = cli.command {
        return leinup::cli::commands::config(args, &manager).await;
    }

    let config = manager.load().await?;

    match cli.command {
        Commands::Config(_) => unreachable!("Config handled above"),
        Commands::Install(args) => leinup::cli::commands::install(args, &config).await,
        Commands::Cache(args) => leinup::cli::commands::cache(args, &config).await,
    }
}
