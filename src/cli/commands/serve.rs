//! Serve command - run the proxy

use crate::cli::ServeArgs;
use crate::config::Config;
use crate::error::WebpxResult;
use crate::server;
use tracing::info;

/// Execute the serve command
pub async fn execute(args: ServeArgs, config: &Config) -> WebpxResult<()> {
    let mut config = config.clone();

    if let Some(listen) = args.listen {
        config.server.listen = listen;
    }
    if let Some(root) = args.root {
        config.paths.document_root = root;
    }
    if let Some(cache_dir) = args.cache_dir {
        config.paths.cache_dir = cache_dir;
    }
    if let Some(bin_dir) = args.bin_dir {
        config.paths.bin_dir = bin_dir;
    }

    info!(
        "Serving {} (cache: {})",
        config.paths.document_root.display(),
        config.paths.cache_dir.display()
    );

    server::run(&config).await
}
