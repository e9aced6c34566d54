//! webpx - Transparent WebP Transcoding Proxy
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use webpx::cli::{Cli, Commands};
use webpx::config::ConfigManager;
use webpx::error::WebpxResult;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> WebpxResult<()> {
    let cli = Cli::parse();

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("webpx=warn"),
        1 => EnvFilter::new("webpx=info"),
        _ => EnvFilter::new("webpx=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Load configuration
    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };
    let config = config_manager.load().await?;

    // Dispatch to command
    match cli.command {
        Commands::Serve(args) => webpx::cli::commands::serve(args, &config).await,
        Commands::Status => webpx::cli::commands::status(&config).await,
        Commands::Cache(args) => webpx::cli::commands::cache(args, &config).await,
    }
}
