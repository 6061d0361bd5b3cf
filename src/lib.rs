//! strataconf - typed configuration stores with a verified snapshot cache
//!
//! strataconf keeps application settings in typed, thread-safe stores,
//! persists the stores you choose to a hash-verified cache directory, and
//! generates comment-preserving INI files from relational tables.
//!
//! # Quick Start
//!
//! ```ignore
//! use strataconf::{start, StoreKind, Value};
//!
//! struct Folder;
//!
//! impl StoreKind for Folder {
//!     const TYPE_NAME: &'static str = "Folder";
//!
//!     fn defaults() -> Vec<(String, Value)> {
//!         vec![("CACHE".into(), Value::from("profiles/cache"))]
//!     }
//! }
//!
//! let app = start("profiles/cache/conf", |ctx| {
//!     ctx.persist::<Folder>()?;
//!     Ok(())
//! })?;
//! let cache_dir = app.context.store::<Folder>()?.get("CACHE")?;
//! // ... on shutdown
//! app.cache.dump_all(&app.context)?;
//! ```
//!
//! # Initialization order
//!
//! 1. Config stores: kinds are registered with the context's registry
//! 2. Dump Registry: stores that should survive a restart are persisted
//! 3. Snapshot cache: the cache directory is loaded into those stores
//!
//! [`start`] runs the three steps in that order.

use std::path::Path;

pub use strataconf_core::*;
pub use strataconf_durability as durability;
pub use strataconf_durability::{CacheConfig, CacheError, DumpReport, LoadReport, SnapshotCache};
pub use strataconf_ini as ini;
pub use strataconf_ini::{CommentedIni, IniError, MemorySource, RelationalSource, Row};
#[cfg(feature = "sqlite")]
pub use strataconf_ini::SqliteSource;

/// A started application: its context, cache, and what loading found
#[derive(Debug)]
pub struct Startup {
    /// Registry and Dump Registry
    pub context: AppContext,
    /// Cache the stores were loaded from
    pub cache: SnapshotCache,
    /// Outcome of the initial load
    pub report: LoadReport,
}

/// Build a context, let `persist` register and persist stores, then load the
/// cache directory into them.
///
/// Restoring the Dump Registry replaces its members with the ones recorded
/// in the cache. Stores `persist` added that the cache does not list yet (a
/// kind new in this release, say) are listed again afterwards, so the next
/// dump includes them.
pub fn start<F>(cache_dir: impl AsRef<Path>, persist: F) -> durability::Result<Startup>
where
    F: FnOnce(&AppContext) -> Result<()>,
{
    let context = AppContext::new()?;
    persist(&context)?;
    let requested = context.persisted();
    let cache = SnapshotCache::open(cache_dir)?;
    let report = cache.load_all(&context)?;

    let registry = context.dump_registry();
    for (name, store) in requested {
        if !registry.contains(&name) {
            registry.set(&name, Value::Store(StoreRef::new(&store)))?;
        }
    }
    Ok(Startup {
        context,
        cache,
        report,
    })
}
