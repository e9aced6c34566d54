//! Status command - check toolchain and cache health

use crate::cache::CacheStore;
use crate::config::Config;
use crate::convert::{platform_tag, Tool, Toolchain};
use crate::error::WebpxResult;
use console::{style, Emoji};

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "[FAIL] ");

/// Execute the status command
pub async fn execute(config: &Config) -> WebpxResult<()> {
    println!("{}", style("webpx System Status").bold().cyan());
    println!();

    println!("{}", style("Platform:").bold());
    println!("  {} Detected: {}", CHECK, platform_tag());

    println!();
    println!("{}", style("Conversion tools:").bold());
    let toolchain = Toolchain::new(config.paths.bin_dir.clone());
    let mut all_ok = true;
    for &tool in Tool::all() {
        match toolchain.resolve(tool) {
            Ok(path) => println!("  {} {:<9} {}", CHECK, tool.name(), path.display()),
            Err(_) => {
                all_ok = false;
                println!(
                    "  {} {:<9} {} - install under {}",
                    CROSS,
                    tool.name(),
                    style("missing").red(),
                    config
                        .paths
                        .bin_dir
                        .join(toolchain.platform())
                        .display()
                );
            }
        }
    }

    println!();
    println!("{}", style("Cache:").bold());
    let store = CacheStore::new(config.paths.cache_dir.clone());
    if store.root().is_dir() {
        let stats = store.stats().await?;
        println!(
            "  {} {} ({} converted, {} failed, {:.1} KB)",
            CHECK,
            store.root().display(),
            stats.positive,
            stats.negative,
            stats.total_bytes as f64 / 1024.0
        );
    } else {
        println!(
            "  {} {} (created on first request)",
            CHECK,
            store.root().display()
        );
    }

    println!();
    if all_ok {
        println!("{}", style("All conversion tools installed").green().bold());
    } else {
        println!(
            "{}",
            style("Some tools missing - affected formats will serve originals")
                .yellow()
                .bold()
        );
    }

    Ok(())
}
