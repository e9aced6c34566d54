//! Content-fingerprint cache keys
//!
//! The key is a SHA256 digest over the asset's identity tuple
//! (absolute path, mtime, size), tab-joined. Same tuple = same key;
//! touching or rewriting the source changes the key, so stale cache
//! entries are superseded without any explicit invalidation logic.

use crate::error::{WebpxError, WebpxResult};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::UNIX_EPOCH;
use tracing::debug;

/// Compute the cache fingerprint for a resolved source asset.
///
/// Fails with `NotFound` if the file disappeared between resolution
/// and stat.
pub async fn fingerprint(asset: &Path) -> WebpxResult<String> {
    let meta = tokio::fs::metadata(asset)
        .await
        .map_err(|_| WebpxError::NotFound(asset.to_path_buf()))?;

    let mtime = meta
        .modified()
        .map_err(|e| WebpxError::io(format!("reading mtime of {}", asset.display()), e))?
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    // Tab-joined so no path byte can collide with the delimiter
    let seed = format!("{}\t{}\t{}", asset.display(), mtime, meta.len());

    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    let key = hex::encode(hasher.finalize());

    debug!("Fingerprint for {}: {}", asset.display(), key);
    Ok(key)
}
