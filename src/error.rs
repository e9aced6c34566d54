//! Error types for webpx
//!
//! All modules use `WebpxResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for webpx operations
pub type WebpxResult<T> = Result<T, WebpxError>;

/// All errors that can occur in webpx
#[derive(Error, Debug)]
pub enum WebpxError {
    // Resolution errors
    #[error("Not found: {0}")]
    NotFound(PathBuf),

    #[error("Forbidden: {0} resolves outside the document root")]
    Forbidden(PathBuf),

    // Conversion errors
    #[error("Unsupported image type: {0}")]
    UnsupportedType(String),

    #[error("Conversion tool not installed: {tool} (expected at {path})")]
    ToolUnavailable { tool: String, path: PathBuf },

    #[error("Conversion failed: {tool} exited with {code}; stdout: {stdout}; stderr: {stderr}")]
    ConversionFailed {
        tool: String,
        code: i32,
        stdout: String,
        stderr: String,
    },

    #[error("Conversion timed out: {tool} exceeded {seconds}s")]
    ConversionTimeout { tool: String, seconds: u64 },

    #[error("Converted output larger than source: {converted} > {original} bytes")]
    ConversionRegressed { original: u64, converted: u64 },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid listen address {addr}: {reason}")]
    ListenAddr { addr: String, reason: String },

    // IO / process errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command failed to start: {command}")]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WebpxError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command spawn error
    pub fn spawn(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandSpawn {
            command: command.into(),
            source,
        }
    }

    /// Whether this is a conversion-stage failure.
    ///
    /// Conversion failures are memoized as negative cache entries and the
    /// original asset is served back; they never surface as an HTTP error.
    pub fn is_conversion_failure(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedType(_)
                | Self::ToolUnavailable { .. }
                | Self::ConversionFailed { .. }
                | Self::ConversionTimeout { .. }
                | Self::ConversionRegressed { .. }
        )
    }

    /// HTTP status for failures that escape the pipeline
    pub fn http_status(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Forbidden(_) => 403,
            _ => 500,
        }
    }
}
