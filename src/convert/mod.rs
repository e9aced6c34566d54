//! External conversion tool invocation
//!
//! One invocation attempt per request; failure memoization is the
//! pipeline's job. The source file's bytes and name never reach a
//! shell: argv is a fixed flag set plus the trusted destination path,
//! and the source is handed to the child as its stdin file handle.

pub mod toolchain;

pub use toolchain::{platform_tag, Tool, Toolchain};

use crate::error::{WebpxError, WebpxResult};
use crate::sniff::{self, ImageFormat};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Transcode direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Legacy raster format -> WebP
    Compress,
    /// WebP -> legacy raster format (always PNG)
    Decompress,
}

impl Direction {
    /// Field name used in the stats response header
    pub fn stats_label(&self) -> &'static str {
        match self {
            Self::Compress => "original",
            Self::Decompress => "webp",
        }
    }
}

/// Runs external conversion tools with a size-sanity policy
#[derive(Debug, Clone)]
pub struct Converter {
    toolchain: Toolchain,
    quality: u8,
    timeout: Duration,
}

impl Converter {
    /// Create a converter over a resolved toolchain
    pub fn new(toolchain: Toolchain, quality: u8, timeout: Duration) -> Self {
        Self {
            toolchain,
            quality,
            timeout,
        }
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    /// Pick the tool and fixed flags for a sniffed source format.
    ///
    /// The decoder direction always targets PNG; dwebp cannot produce
    /// JPEG, whatever the WebP sub-variant.
    fn plan(&self, direction: Direction, format: Option<ImageFormat>) -> WebpxResult<(Tool, Vec<String>)> {
        match (direction, format) {
            (Direction::Compress, Some(ImageFormat::Jpeg)) => {
                Ok((Tool::Cwebp, vec!["-q".into(), self.quality.to_string()]))
            }
            (Direction::Compress, Some(ImageFormat::Png)) => {
                Ok((Tool::Cwebp, vec!["-lossless".into()]))
            }
            (Direction::Compress, Some(ImageFormat::Gif)) => Ok((Tool::Gif2webp, vec![])),
            (Direction::Decompress, Some(ImageFormat::Webp)) => Ok((Tool::Dwebp, vec![])),
            (_, format) => Err(WebpxError::UnsupportedType(
                format.map(|f| f.mime().to_string()).unwrap_or_else(|| "unknown".to_string()),
            )),
        }
    }

    /// Convert `source` into `dest`.
    ///
    /// Output goes to a sibling temp path and is renamed into place only
    /// after the exit code and size checks pass, so readers never see a
    /// partial artifact.
    pub async fn convert(&self, direction: Direction, source: &Path, dest: &Path) -> WebpxResult<()> {
        let format = sniff::sniff_path(source).await?;
        let (tool, flags) = self.plan(direction, format)?;
        let tool_path = self.toolchain.resolve(tool)?;

        let tmp = dest.with_extension(format!("tmp.{}", std::process::id()));

        let stdin = std::fs::File::open(source)
            .map_err(|e| WebpxError::io(format!("opening {}", source.display()), e))?;

        debug!(
            "Invoking {} {:?} -o {} -- - < {}",
            tool,
            flags,
            tmp.display(),
            source.display()
        );

        let child = Command::new(tool_path)
            .args(&flags)
            .arg("-o")
            .arg(&tmp)
            .arg("--")
            .arg("-")
            .stdin(Stdio::from(stdin))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| WebpxError::spawn(tool.name(), e))?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| WebpxError::spawn(tool.name(), e))?,
            Err(_) => {
                // kill_on_drop reaps the child when the future is dropped
                let _ = tokio::fs::remove_file(&tmp).await;
                return Err(WebpxError::ConversionTimeout {
                    tool: tool.name().to_string(),
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        if !output.status.success() {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(WebpxError::ConversionFailed {
                tool: tool.name().to_string(),
                code: output.status.code().unwrap_or(-1),
                stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let original = tokio::fs::metadata(source)
            .await
            .map_err(|e| WebpxError::io(format!("stat {}", source.display()), e))?
            .len();
        let converted = tokio::fs::metadata(&tmp)
            .await
            .map_err(|e| WebpxError::io(format!("stat {}", tmp.display()), e))?
            .len();

        // A compressed file that grew defeats the point of transcoding;
        // GIF sources hit this comparatively often. Decompression to PNG
        // is expected to grow and is exempt.
        if direction == Direction::Compress && converted > original {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(WebpxError::ConversionRegressed {
                original,
                converted,
            });
        }

        tokio::fs::rename(&tmp, dest)
            .await
            .map_err(|e| WebpxError::io(format!("publishing {}", dest.display()), e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn converter() -> (TempDir, Converter) {
        let dir = TempDir::new().unwrap();
        let chain = Toolchain::new(dir.path().to_path_buf());
        (dir, Converter::new(chain, 80, Duration::from_secs(5)))
    }

    #[test]
    fn compress_plans_by_format() {
        let (_dir, conv) = converter();

        let (tool, flags) = conv.plan(Direction::Compress, Some(ImageFormat::Jpeg)).unwrap();
        assert_eq!(tool, Tool::Cwebp);
        assert_eq!(flags, vec!["-q", "80"]);

        let (tool, flags) = conv.plan(Direction::Compress, Some(ImageFormat::Png)).unwrap();
        assert_eq!(tool, Tool::Cwebp);
        assert_eq!(flags, vec!["-lossless"]);

        let (tool, flags) = conv.plan(Direction::Compress, Some(ImageFormat::Gif)).unwrap();
        assert_eq!(tool, Tool::Gif2webp);
        assert!(flags.is_empty());
    }

    #[test]
    fn decompress_only_accepts_webp() {
        let (_dir, conv) = converter();

        let (tool, flags) = conv
            .plan(Direction::Decompress, Some(ImageFormat::Webp))
            .unwrap();
        assert_eq!(tool, Tool::Dwebp);
        assert!(flags.is_empty());

        let err = conv
            .plan(Direction::Decompress, Some(ImageFormat::Png))
            .unwrap_err();
        assert!(matches!(err, WebpxError::UnsupportedType(mime) if mime == "image/png"));
    }

    #[test]
    fn unknown_format_is_unsupported() {
        let (_dir, conv) = converter();
        let err = conv.plan(Direction::Compress, None).unwrap_err();
        assert!(matches!(err, WebpxError::UnsupportedType(mime) if mime == "unknown"));

        let err = conv
            .plan(Direction::Compress, Some(ImageFormat::Bmp))
            .unwrap_err();
        assert!(matches!(err, WebpxError::UnsupportedType(mime) if mime == "image/x-ms-bmp"));
    }

    #[tokio::test]
    async fn missing_tool_fails_without_touching_dest() {
        let (dir, conv) = converter();
        let source = dir.path().join("a.jpg");
        std::fs::write(&source, [0xFF, 0xD8, 0xFF, 0xE0]).unwrap();
        let dest = dir.path().join("out");

        let err = conv
            .convert(Direction::Compress, &source, &dest)
            .await
            .unwrap_err();
        assert!(matches!(err, WebpxError::ToolUnavailable { .. }));
        assert!(!dest.exists());
    }
}
