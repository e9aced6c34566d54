//! On-disk conversion cache
//!
//! Converted artifacts are cached one-file-per-key in a flat directory,
//! keyed by a content fingerprint of the source asset. A zero-length
//! entry memoizes a conversion failure.
//!
//! # Invalidation Model
//!
//! - Key = SHA256 over (path, mtime, size) of the source asset
//! - Any re-save or resize of the source yields a new key
//! - Old entries become orphans; there is no eviction beyond `webpx
//!   cache clear`
//!
//! # Entry States
//!
//! | State | On disk | Meaning |
//! |----------|---------------------|------------------------------|
//! | Absent | no file | never converted under this key |
//! | Negative | zero-length file | memoized conversion failure |
//! | Positive | non-empty file | converted artifact |

pub mod key;
pub mod store;

pub use key::fingerprint;
pub use store::{CacheEntry, CacheStats, CacheStore};
