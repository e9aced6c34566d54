//! Configuration schema for webpx
//!
//! Configuration is stored at `~/.config/webpx/config.toml`

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP listener settings
    pub server: ServerConfig,

    /// Filesystem layout
    pub paths: PathsConfig,

    /// Conversion policy
    pub convert: ConvertConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address, host:port
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8080".to_string(),
        }
    }
}

impl ServerConfig {
    /// Parse the configured listen address
    pub fn listen_addr(&self) -> crate::error::WebpxResult<SocketAddr> {
        self.listen
            .parse()
            .map_err(|e: std::net::AddrParseError| crate::error::WebpxError::ListenAddr {
                addr: self.listen.clone(),
                reason: e.to_string(),
            })
    }
}

/// Filesystem layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Document root the proxy serves from
    pub document_root: PathBuf,

    /// Cache directory; defaults under the platform temp dir
    pub cache_dir: PathBuf,

    /// Directory holding per-platform conversion binaries
    pub bin_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            document_root: PathBuf::from("."),
            cache_dir: std::env::temp_dir().join("webpx-cache"),
            bin_dir: PathBuf::from("bin"),
        }
    }
}

/// Conversion policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Lossy WebP quality for JPEG sources (cwebp -q)
    pub quality: u8,

    /// Upper bound on a single tool invocation, in seconds
    pub timeout_secs: u64,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            quality: 80,
            timeout_secs: 30,
        }
    }
}

impl ConvertConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.server.listen, "127.0.0.1:8080");
        assert_eq!(config.convert.quality, 80);
        assert_eq!(config.convert.timeout(), Duration::from_secs(30));
        assert!(config.paths.cache_dir.ends_with("webpx-cache"));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [convert]
            quality = 60
            "#,
        )
        .unwrap();
        assert_eq!(config.convert.quality, 60);
        assert_eq!(config.convert.timeout_secs, 30);
        assert_eq!(config.server.listen, "127.0.0.1:8080");
    }

    #[test]
    fn listen_addr_parses() {
        let config = ServerConfig {
            listen: "0.0.0.0:9000".to_string(),
        };
        assert_eq!(config.listen_addr().unwrap().port(), 9000);

        let bad = ServerConfig {
            listen: "not-an-addr".to_string(),
        };
        assert!(bad.listen_addr().is_err());
    }

    #[test]
    fn roundtrips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.server.listen, config.server.listen);
        assert_eq!(back.paths.bin_dir, config.paths.bin_dir);
    }
}
