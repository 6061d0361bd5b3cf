//! Error types for the snapshot cache

use std::io;
use std::path::PathBuf;
use strataconf_core::ConfigError;
use thiserror::Error;

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Snapshot cache errors
#[derive(Debug, Error)]
pub enum CacheError {
    /// I/O error on the cache directory or manifest
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Manifest could not be encoded or decoded
    #[error("manifest error at {path}: {message}")]
    Manifest {
        /// Manifest path
        path: PathBuf,
        /// Underlying decoder message
        message: String,
    },

    /// `cache.toml` could not be read or parsed
    #[error("config error at {path}: {message}")]
    Config {
        /// Settings file path
        path: PathBuf,
        /// Underlying error message
        message: String,
    },

    /// A store rejected an operation
    #[error("store error: {0}")]
    Store(#[from] ConfigError),

    /// A blob's content does not match its recorded hash
    #[error("hash mismatch for '{store}': expected {expected}, found {actual}")]
    HashVerificationFailed {
        /// Store name from the manifest
        store: String,
        /// Hash recorded in the manifest
        expected: String,
        /// Hash of the file on disk
        actual: String,
    },
}
