//! Error types for config stores
//!
//! Lookup failures and fence violations are always surfaced to the caller of
//! the operation that hit them. We use `thiserror` for automatic `Display`
//! and `Error` trait implementations.

use crate::value::ValueKind;
use std::io;
use thiserror::Error;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Error types for config stores and their registry
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The store has no field with this name
    #[error("'{store}' has no field '{name}'")]
    NoSuchField {
        /// Store type name
        store: String,
        /// Requested field name
        name: String,
    },

    /// The field is locked against writes
    #[error("field '{name}' of '{store}' is read-only")]
    ReadOnly {
        /// Store type name
        store: String,
        /// Locked field name
        name: String,
    },

    /// The value violates the store's type fence
    #[error("field '{name}' of '{store}' expects {expected}, got {actual}")]
    TypeMismatch {
        /// Store type name
        store: String,
        /// Field being written
        name: String,
        /// The active fence
        expected: ValueKind,
        /// Kind of the rejected value
        actual: ValueKind,
    },

    /// The name collides with a store operation
    #[error("'{name}' is reserved for a store operation")]
    NameConflict {
        /// Rejected field name
        name: String,
    },

    /// The store holds values that cannot be snapshotted
    #[error("'{store}' cannot be snapshotted: field '{field}' holds a store reference")]
    Unsupported {
        /// Store type name
        store: String,
        /// First offending field
        field: String,
    },

    /// No store kind is registered under this type identity
    #[error("no store kind registered as '{0}'")]
    UnknownStoreType(String),

    /// Two different Rust types claimed the same type identity
    #[error("store type name '{0}' is already registered by another kind")]
    DuplicateStoreType(String),

    /// Snapshot encoding or decoding failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error while writing or reading a snapshot
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<rmp_serde::encode::Error> for ConfigError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        ConfigError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for ConfigError {
    fn from(e: rmp_serde::decode::Error) -> Self {
        ConfigError::Serialization(e.to_string())
    }
}

impl ConfigError {
    /// Lookup failure (caller decides whether to create or abort)
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ConfigError::NoSuchField { .. } | ConfigError::UnknownStoreType(_)
        )
    }
}
