//! Durability layer for strataconf
//!
//! This crate handles everything that touches the cache directory:
//!
//! - Manifest (`info.json`): store name to blob file and SHA-256
//! - Blobs: one MessagePack snapshot per persisted store
//! - Dump/load cycle with hash verification and purge of invalid entries
//! - Cache settings (`cache.toml`)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod error;

pub use cache::config::CacheConfig;
pub use cache::manifest::{Manifest, ManifestEntry};
pub use cache::paths::CachePaths;
pub use cache::{DumpReport, LoadReport, SnapshotCache};
pub use error::{CacheError, Result};
