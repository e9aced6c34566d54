//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// webpx - Transparent WebP transcoding proxy
///
/// Serves format-negotiated image variants in front of a static file
/// tree, caching converted output keyed to source content identity.
#[derive(Parser, Debug)]
#[command(name = "webpx")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "WEBPX_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the proxy server
    Serve(ServeArgs),

    /// Check toolchain and cache health
    Status,

    /// Inspect or clear the conversion cache
    Cache(CacheArgs),
}

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Listen address (host:port), overrides config
    #[arg(short, long)]
    pub listen: Option<String>,

    /// Document root to serve, overrides config
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Cache directory, overrides config
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Conversion binary directory, overrides config
    #[arg(long)]
    pub bin_dir: Option<PathBuf>,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show entry counts and sizes
    Stats,

    /// Remove every cache entry
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}
