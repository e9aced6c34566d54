//! Request-path resolution confined to a document root
//!
//! The logical path is attacker-controlled. Resolution canonicalizes it
//! (following symlinks) and then requires the result to stay under the
//! canonical document root, rejecting traversal and symlink escapes.

use crate::error::{WebpxError, WebpxResult};
use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolve a request's logical path to a validated absolute file path.
///
/// Fails with `NotFound` when no real file exists at the location and
/// with `Forbidden` when the real path lies outside the document root.
pub fn resolve(document_root: &Path, logical_path: &str) -> WebpxResult<PathBuf> {
    let decoded = percent_decode_str(logical_path).decode_utf8_lossy();
    let relative = decoded.trim_start_matches('/');
    let candidate = document_root.join(relative);

    let real = candidate
        .canonicalize()
        .map_err(|_| WebpxError::NotFound(candidate.clone()))?;

    let root = document_root
        .canonicalize()
        .map_err(|e| WebpxError::io(format!("canonicalizing root {}", document_root.display()), e))?;

    // Component-wise containment, so /srv/www never admits /srv/www-evil
    if !real.starts_with(&root) {
        return Err(WebpxError::Forbidden(real));
    }

    debug!("Resolved {} -> {}", logical_path, real.display());
    Ok(real)
}
