//! Config stores for strataconf
//!
//! This crate defines the in-memory side of the system:
//! - Value / ValueKind: closed value type and the type fence tag
//! - Field / FieldRef: per-field read-only flag and bound handle
//! - ConfigStore / StoreKind: typed, lock-protected stores and their shape
//! - StoreRegistry: one lazily built singleton per store kind
//! - Dump: the registry store listing what gets snapshotted
//! - AppContext: registry plus Dump Registry, passed to startup code
//! - ConfigError: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod dump;
pub mod error;
pub mod field;
pub mod registry;
pub mod store;
pub mod value;

pub use context::AppContext;
pub use dump::Dump;
pub use error::{ConfigError, Result};
pub use field::{Field, FieldRef};
pub use registry::StoreRegistry;
pub use store::{
    is_reserved, ConfigStore, FenceRule, StoreBlueprint, StoreKind, StoreRole, RESERVED_NAMES,
};
pub use value::{StoreRef, Value, ValueKind};
