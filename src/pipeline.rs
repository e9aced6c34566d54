//! Request pipeline shared by both transcode directions
//!
//! resolve -> fingerprint -> cache lookup -> (miss) convert -> emit.
//! Conversion-stage failures are caught here, logged, memoized as a
//! negative cache entry, and degrade gracefully to serving the original
//! asset; only resolution failures and unexpected errors propagate to
//! the server's error mapper.

use crate::cache::{self, CacheEntry, CacheStore};
use crate::convert::{Converter, Direction};
use crate::error::{WebpxError, WebpxResult};
use crate::resolve;
use crate::sniff;
use bytes::Bytes;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, warn};

/// Diagnostic stats header name, kept for compatibility with
/// PHPWebP-era monitoring
pub const STATS_HEADER: &str = "X-PHPWebP-Stats";

/// Cache-key diagnostic header name
pub const CACHE_KEY_HEADER: &str = "X-Cache-Key";

/// A fully resolved response, ready to project onto the wire
#[derive(Debug, Clone)]
pub struct ImageResponse {
    pub content_type: String,
    pub content_length: u64,
    /// Present only when a positive cache entry is served
    pub cache_key: Option<String>,
    /// Present on both transcode outcomes, absent for plain static serving
    pub stats: Option<String>,
    /// `None` for HEAD requests; headers are computed identically
    pub body: Option<Bytes>,
}

/// The transcoding pipeline over one document root
pub struct Pipeline {
    document_root: PathBuf,
    store: CacheStore,
    converter: Converter,
    // Per-fingerprint advisory locks suppressing duplicate concurrent
    // conversions within this process
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl Pipeline {
    pub fn new(document_root: PathBuf, store: CacheStore, converter: Converter) -> Self {
        Self {
            document_root,
            store,
            converter,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    /// Handle one transcode request.
    ///
    /// `head` omits the body but computes every header identically.
    pub async fn handle(
        &self,
        direction: Direction,
        logical_path: &str,
        head: bool,
    ) -> WebpxResult<ImageResponse> {
        let asset = resolve::resolve(&self.document_root, logical_path)?;
        let fingerprint = cache::fingerprint(&asset).await?;
        self.store.ensure_root().await?;

        if self.store.lookup(&fingerprint).await? == CacheEntry::Absent {
            let lock = self.lock_for(&fingerprint);
            {
                let _held = lock.lock().await;

                // Re-check: a concurrent request may have filled the
                // entry while we waited on the lock
                if self.store.lookup(&fingerprint).await? == CacheEntry::Absent {
                    let entry_path = self.store.entry_path(&fingerprint);
                    match self.converter.convert(direction, &asset, &entry_path).await {
                        Ok(()) => info!("Converted {} -> {}", asset.display(), fingerprint),
                        Err(err) if err.is_conversion_failure() => {
                            warn!("Failed to convert {}: {}", asset.display(), err);
                            self.store.store_negative(&fingerprint).await?;
                        }
                        Err(err) => return Err(err),
                    }
                }
            }
            drop(lock);
            self.release(&fingerprint);
        }

        match self.store.lookup(&fingerprint).await? {
            CacheEntry::Positive(size) => {
                self.emit_converted(direction, &asset, &fingerprint, size, head)
                    .await
            }
            _ => self.emit_fallback(direction, &asset, head).await,
        }
    }

    /// Serve a resolved asset untouched, with no transcoding diagnostics
    pub async fn passthrough(&self, logical_path: &str, head: bool) -> WebpxResult<ImageResponse> {
        let asset = resolve::resolve(&self.document_root, logical_path)?;
        let content_type = sniff::sniff_path(&asset)
            .await?
            .map(|f| f.mime().to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let (content_length, body) = self.read_body(&asset, head).await?;

        Ok(ImageResponse {
            content_type,
            content_length,
            cache_key: None,
            stats: None,
            body,
        })
    }

    async fn emit_converted(
        &self,
        direction: Direction,
        asset: &Path,
        fingerprint: &str,
        converted_size: u64,
        head: bool,
    ) -> WebpxResult<ImageResponse> {
        let entry_path = self.store.entry_path(fingerprint);

        let content_type = match direction {
            Direction::Compress => "image/webp".to_string(),
            // dwebp always decodes to PNG; sniff anyway so the header
            // reflects the bytes actually served
            Direction::Decompress => sniff::sniff_path(&entry_path)
                .await?
                .map(|f| f.mime().to_string())
                .unwrap_or_else(|| "image/png".to_string()),
        };

        let source_size = tokio::fs::metadata(asset)
            .await
            .map_err(|e| WebpxError::io(format!("stat {}", asset.display()), e))?
            .len();
        let stats = stats_success(direction, source_size, converted_size);

        let body = if head {
            None
        } else {
            Some(Bytes::from(tokio::fs::read(&entry_path).await.map_err(
                |e| WebpxError::io(format!("reading {}", entry_path.display()), e),
            )?))
        };

        Ok(ImageResponse {
            content_type,
            content_length: converted_size,
            cache_key: Some(fingerprint.to_string()),
            stats: Some(stats),
            body,
        })
    }

    /// Graceful degradation: the original bytes with a failure marker,
    /// so callers always get a usable image
    async fn emit_fallback(
        &self,
        direction: Direction,
        asset: &Path,
        head: bool,
    ) -> WebpxResult<ImageResponse> {
        let sniffed = sniff::sniff_path(asset).await?.map(|f| f.mime().to_string());
        let content_type = match direction {
            Direction::Compress => {
                sniffed.unwrap_or_else(|| "application/octet-stream".to_string())
            }
            // The source of a failed decompress is presumed WebP
            Direction::Decompress => sniffed.unwrap_or_else(|| "image/webp".to_string()),
        };
        let (content_length, body) = self.read_body(asset, head).await?;

        Ok(ImageResponse {
            content_type,
            content_length,
            cache_key: None,
            stats: Some("status=failure;".to_string()),
            body,
        })
    }

    async fn read_body(&self, path: &Path, head: bool) -> WebpxResult<(u64, Option<Bytes>)> {
        let size = tokio::fs::metadata(path)
            .await
            .map_err(|e| WebpxError::io(format!("stat {}", path.display()), e))?
            .len();
        let body = if head {
            None
        } else {
            Some(Bytes::from(tokio::fs::read(path).await.map_err(|e| {
                WebpxError::io(format!("reading {}", path.display()), e)
            })?))
        };
        Ok((size, body))
    }

    fn lock_for(&self, fingerprint: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut table = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        table.entry(fingerprint.to_string()).or_default().clone()
    }

    /// Drop the lock table entry once no other request holds it
    fn release(&self, fingerprint: &str) {
        let mut table = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(lock) = table.get(fingerprint) {
            if Arc::strong_count(lock) == 1 {
                table.remove(fingerprint);
            }
        }
    }
}

/// Machine-parsable success stats, e.g.
/// `status=success; original=12.3kb; ratio=45.67%;`
fn stats_success(direction: Direction, source_size: u64, converted_size: u64) -> String {
    format!(
        "status=success; {}={:.1}kb; ratio={:.2}%;",
        direction.stats_label(),
        source_size as f64 / 1024.0,
        converted_size as f64 * 100.0 / source_size as f64
    )
}
