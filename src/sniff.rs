//! Magic-byte content sniffing
//!
//! Conversion branching is driven by what the file actually contains,
//! never by its extension or the request's declared type. Only the
//! formats the proxy can meet on disk are distinguished.

use crate::error::{WebpxError, WebpxResult};
use std::fmt;
use std::path::Path;
use tokio::io::AsyncReadExt;

/// Image formats the proxy recognizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Webp,
    Bmp,
}

impl ImageFormat {
    /// MIME type for this format
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
            Self::Bmp => "image/x-ms-bmp",
        }
    }

    /// Detect a format from the leading bytes of a file
    pub fn sniff_bytes(head: &[u8]) -> Option<Self> {
        if head.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if head.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(Self::Png)
        } else if head.starts_with(b"GIF87a") || head.starts_with(b"GIF89a") {
            Some(Self::Gif)
        } else if head.len() >= 12 && head.starts_with(b"RIFF") && &head[8..12] == b"WEBP" {
            Some(Self::Webp)
        } else if head.starts_with(b"BM") {
            Some(Self::Bmp)
        } else {
            None
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mime())
    }
}

/// Sniff the format of a file on disk from its first bytes
pub async fn sniff_path(path: &Path) -> WebpxResult<Option<ImageFormat>> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| WebpxError::io(format!("opening {} for sniffing", path.display()), e))?;

    let mut head = [0u8; 16];
    let n = file
        .read(&mut head)
        .await
        .map_err(|e| WebpxError::io(format!("sniffing {}", path.display()), e))?;

    Ok(ImageFormat::sniff_bytes(&head[..n]))
}
