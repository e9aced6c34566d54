//! Cache entry storage and inspection

use crate::error::{WebpxError, WebpxResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// State of a single cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEntry {
    /// No file under this key
    Absent,
    /// Zero-length sentinel memoizing a conversion failure
    Negative,
    /// Converted artifact of the given size
    Positive(u64),
}

impl CacheEntry {
    /// Whether this entry holds a servable converted artifact
    pub fn is_positive(&self) -> bool {
        matches!(self, Self::Positive(_))
    }
}

/// Aggregate cache directory statistics
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    pub positive: u64,
    pub negative: u64,
    pub total_bytes: u64,
}

/// Flat one-file-per-key cache rooted at a configured directory.
///
/// The root is injected at construction and lives for the process
/// lifetime; entries persist across restarts by design.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    /// Create a store over the given cache root
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// The configured cache root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Ensure the cache root exists.
    ///
    /// Idempotent and race-tolerant: concurrent requests may create the
    /// directory simultaneously and losing that race is not an error.
    pub async fn ensure_root(&self) -> WebpxResult<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| WebpxError::io(format!("creating cache dir {}", self.root.display()), e))
    }

    /// Path of the entry file for a fingerprint
    pub fn entry_path(&self, fingerprint: &str) -> PathBuf {
        self.root.join(fingerprint)
    }

    /// Look up the state of an entry
    pub async fn lookup(&self, fingerprint: &str) -> WebpxResult<CacheEntry> {
        let path = self.entry_path(fingerprint);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.len() == 0 => Ok(CacheEntry::Negative),
            Ok(meta) => Ok(CacheEntry::Positive(meta.len())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(CacheEntry::Absent),
            Err(e) => Err(WebpxError::io(format!("stat cache entry {}", path.display()), e)),
        }
    }

    /// Write the zero-length failure sentinel for a fingerprint.
    ///
    /// Subsequent identical requests then skip re-invoking the external
    /// tool until the source asset's identity changes.
    pub async fn store_negative(&self, fingerprint: &str) -> WebpxResult<()> {
        let path = self.entry_path(fingerprint);
        debug!("Memoizing failure at {}", path.display());
        tokio::fs::write(&path, b"")
            .await
            .map_err(|e| WebpxError::io(format!("writing negative entry {}", path.display()), e))
    }

    /// Count entries and bytes under the cache root
    pub async fn stats(&self) -> WebpxResult<CacheStats> {
        let mut stats = CacheStats::default();
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(stats),
            Err(e) => {
                return Err(WebpxError::io(
                    format!("reading cache dir {}", self.root.display()),
                    e,
                ))
            }
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| WebpxError::io("iterating cache dir", e))?
        {
            let meta = match entry.metadata().await {
                Ok(meta) if meta.is_file() => meta,
                _ => continue,
            };
            if meta.len() == 0 {
                stats.negative += 1;
            } else {
                stats.positive += 1;
                stats.total_bytes += meta.len();
            }
        }

        Ok(stats)
    }

    /// Remove every entry file; returns the number removed
    pub async fn clear(&self) -> WebpxResult<u64> {
        let mut removed = 0;
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(WebpxError::io(
                    format!("reading cache dir {}", self.root.display()),
                    e,
                ))
            }
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| WebpxError::io("iterating cache dir", e))?
        {
            if entry.file_type().await.map(|t| t.is_file()).unwrap_or(false) {
                tokio::fs::remove_file(entry.path())
                    .await
                    .map_err(|e| WebpxError::io(format!("removing {}", entry.path().display()), e))?;
                removed += 1;
            }
        }

        Ok(removed)
    }
}
