//! webpx - Transparent WebP Transcoding Proxy
//!
//! Sits in front of a static file tree and serves format-negotiated
//! image variants (legacy raster formats ⇄ WebP), caching converted
//! output on disk keyed to the source file's content identity.

pub mod cache;
pub mod cli;
pub mod config;
pub mod convert;
pub mod error;
pub mod pipeline;
pub mod resolve;
pub mod server;
pub mod sniff;

pub use error::{WebpxError, WebpxResult};
