//! Cache command - inspect or clear the conversion cache

use crate::cache::CacheStore;
use crate::cli::{CacheAction, CacheArgs};
use crate::config::Config;
use crate::error::{WebpxError, WebpxResult};
use console::style;
use std::io::{self, BufRead, Write};

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> WebpxResult<()> {
    let store = CacheStore::new(config.paths.cache_dir.clone());

    match args.action {
        CacheAction::Stats => stats(&store).await,
        CacheAction::Clear { yes } => clear(&store, yes).await,
    }
}

async fn stats(store: &CacheStore) -> WebpxResult<()> {
    let stats = store.stats().await?;
    let total = stats.positive + stats.negative;

    println!("Cache directory: {}", store.root().display());
    println!("Entries:         {}", total);
    println!("  converted:     {}", stats.positive);
    println!("  failed:        {}", stats.negative);
    println!("Artifact bytes:  {:.1} KB", stats.total_bytes as f64 / 1024.0);

    Ok(())
}

async fn clear(store: &CacheStore, yes: bool) -> WebpxResult<()> {
    let stats = store.stats().await?;
    let total = stats.positive + stats.negative;

    if total == 0 {
        println!("Cache is already empty.");
        return Ok(());
    }

    if !yes {
        print!("Remove {} cache entries? [y/N] ", total);
        io::stdout()
            .flush()
            .map_err(|e| WebpxError::io("flushing stdout", e))?;

        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| WebpxError::io("reading confirmation", e))?;
        if !matches!(line.trim(), "y" | "Y" | "yes") {
            println!("Aborted.");
            return Ok(());
        }
    }

    let removed = store.clear().await?;
    println!("{} {} entries removed", style("Cleared:").green().bold(), removed);

    Ok(())
}
