//! Application context
//!
//! Owns the store registry and the Dump Registry. Startup code builds one
//! context and hands it to everything that needs stores:
//!
//! 1. Config stores: register kinds, or let [`AppContext::store`] do it lazily
//! 2. Dump Registry: [`AppContext::persist`] each store that should survive
//!    a restart
//! 3. Snapshot cache: load the cache directory into the context

use std::sync::Arc;

use crate::dump::Dump;
use crate::error::Result;
use crate::registry::StoreRegistry;
use crate::store::{ConfigStore, StoreKind};
use crate::value::{StoreRef, Value};

/// Registry plus Dump Registry, passed explicitly instead of global state.
#[derive(Debug, Clone)]
pub struct AppContext {
    stores: Arc<StoreRegistry>,
    dump: Arc<ConfigStore>,
}

impl AppContext {
    /// Build a context with a fresh registry
    pub fn new() -> Result<Self> {
        Self::with_registry(StoreRegistry::new())
    }

    /// Build a context over an existing registry
    pub fn with_registry(stores: Arc<StoreRegistry>) -> Result<Self> {
        let dump = stores.get::<Dump>()?;
        Dump::install(&dump)?;
        Ok(AppContext { stores, dump })
    }

    /// The store registry
    pub fn stores(&self) -> &Arc<StoreRegistry> {
        &self.stores
    }

    /// The Dump Registry singleton
    pub fn dump_registry(&self) -> &Arc<ConfigStore> {
        &self.dump
    }

    /// Singleton of `K`
    pub fn store<K: StoreKind>(&self) -> Result<Arc<ConfigStore>> {
        self.stores.get::<K>()
    }

    /// Add the singleton of `K` to the Dump Registry under `K::TYPE_NAME`.
    ///
    /// Restoring the Dump Registry from a snapshot replaces its members, so a
    /// store persisted before loading and absent from the snapshot is no
    /// longer listed afterwards. Persist again after loading to keep it, or
    /// start through `strataconf::start`, which does so.
    pub fn persist<K: StoreKind>(&self) -> Result<Arc<ConfigStore>> {
        let store = self.store::<K>()?;
        let member = Value::Store(StoreRef::new(&store));
        if self.dump.get_raw(K::TYPE_NAME).ok().as_ref() != Some(&member) {
            self.dump.set(K::TYPE_NAME, member)?;
        }
        Ok(store)
    }

    /// Stores taking part in the snapshot cycle, the Dump Registry included
    pub fn persisted(&self) -> Vec<(String, Arc<ConfigStore>)> {
        Dump::members(&self.dump)
    }
}
