//! Platform-tagged lookup of the conversion executables
//!
//! Binaries live under `<bin_dir>/<os>-<arch>/`, e.g.
//! `bin/linux-x86_64/cwebp`. The table is resolved once at startup; a
//! missing binary is a deployment-time configuration problem, reported
//! as `ToolUnavailable` when that tool is first needed.

use crate::error::{WebpxError, WebpxResult};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The fixed set of external conversion tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    /// JPEG/PNG -> WebP encoder
    Cwebp,
    /// GIF -> animated WebP encoder
    Gif2webp,
    /// WebP -> PNG decoder
    Dwebp,
}

impl Tool {
    /// Executable base name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Cwebp => "cwebp",
            Self::Gif2webp => "gif2webp",
            Self::Dwebp => "dwebp",
        }
    }

    /// All tools, for availability reporting
    pub fn all() -> &'static [Self] {
        &[Self::Cwebp, Self::Gif2webp, Self::Dwebp]
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Lowercase platform tag, e.g. `linux-x86_64`
pub fn platform_tag() -> String {
    format!("{}-{}", env::consts::OS, env::consts::ARCH).to_lowercase()
}

/// Startup-resolved table of tool executables for the current platform
#[derive(Debug, Clone)]
pub struct Toolchain {
    platform: String,
    bin_dir: PathBuf,
    resolved: HashMap<Tool, PathBuf>,
}

impl Toolchain {
    /// Probe `bin_dir` for the current platform's executables
    pub fn new(bin_dir: PathBuf) -> Self {
        Self::for_platform(bin_dir, platform_tag())
    }

    /// Probe with an explicit platform tag
    pub fn for_platform(bin_dir: PathBuf, platform: String) -> Self {
        let mut resolved = HashMap::new();
        for &tool in Tool::all() {
            let path = bin_dir
                .join(&platform)
                .join(format!("{}{}", tool.name(), env::consts::EXE_SUFFIX));
            if path.is_file() {
                debug!("Found {} at {}", tool, path.display());
                resolved.insert(tool, path);
            }
        }

        Self {
            platform,
            bin_dir,
            resolved,
        }
    }

    /// The platform tag this toolchain was probed for
    pub fn platform(&self) -> &str {
        &self.platform
    }

    /// Whether a tool's executable was found
    pub fn available(&self, tool: Tool) -> bool {
        self.resolved.contains_key(&tool)
    }

    /// Resolved path of a tool, or `ToolUnavailable`
    pub fn resolve(&self, tool: Tool) -> WebpxResult<&Path> {
        self.resolved
            .get(&tool)
            .map(PathBuf::as_path)
            .ok_or_else(|| WebpxError::ToolUnavailable {
                tool: tool.name().to_string(),
                path: self
                    .bin_dir
                    .join(&self.platform)
                    .join(format!("{}{}", tool.name(), env::consts::EXE_SUFFIX)),
            })
    }

    /// Tools missing for this platform, for startup diagnostics
    pub fn missing(&self) -> Vec<Tool> {
        Tool::all()
            .iter()
            .copied()
            .filter(|t| !self.available(*t))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn platform_tag_is_lowercase() {
        let tag = platform_tag();
        assert_eq!(tag, tag.to_lowercase());
        assert!(tag.contains('-'));
    }

    #[test]
    fn empty_bin_dir_reports_everything_missing() {
        let dir = TempDir::new().unwrap();
        let chain = Toolchain::new(dir.path().to_path_buf());

        assert_eq!(chain.missing().len(), 3);
        let err = chain.resolve(Tool::Cwebp).unwrap_err();
        match err {
            WebpxError::ToolUnavailable { tool, path } => {
                assert_eq!(tool, "cwebp");
                assert!(path.starts_with(dir.path()));
            }
            other => panic!("expected ToolUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn probes_platform_directory() {
        let dir = TempDir::new().unwrap();
        let platform_dir = dir.path().join("linux-x86_64");
        std::fs::create_dir_all(&platform_dir).unwrap();
        let exe = format!("cwebp{}", env::consts::EXE_SUFFIX);
        std::fs::write(platform_dir.join(&exe), b"#!/bin/sh\n").unwrap();

        let chain =
            Toolchain::for_platform(dir.path().to_path_buf(), "linux-x86_64".to_string());
        assert!(chain.available(Tool::Cwebp));
        assert!(!chain.available(Tool::Dwebp));
        assert_eq!(chain.missing(), vec![Tool::Gif2webp, Tool::Dwebp]);
        assert!(chain.resolve(Tool::Cwebp).unwrap().ends_with(&exe));
    }
}
