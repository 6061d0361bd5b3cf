//! Store registry for singleton management
//!
//! Maps each store kind to at most one live [`ConfigStore`]. Kinds are
//! registered up front; their singletons are built on first access.
//!
//! Construction uses double-checked locking per kind: the instance table is
//! consulted under a read lock, and only the first caller for a kind runs the
//! constructor inside that kind's `OnceCell`. Later lookups clone an `Arc` out
//! of an initialized cell without contending on the constructor.
//!
//! Lookups work both by Rust type ([`StoreRegistry::get`]) and by persisted
//! type identity ([`StoreRegistry::instance_by_name`]), the latter being what a
//! registry snapshot records.

use once_cell::sync::{Lazy, OnceCell};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::store::{ConfigStore, StoreBlueprint, StoreKind};

type InstanceCell = Arc<OnceCell<Arc<ConfigStore>>>;

// =============================================================================
// Process-wide registry
// =============================================================================
//
// Most applications build one `AppContext` and pass it around. The shared
// registry below exists for code that has no context to hand, such as
// plugins loaded late. Both hand out the same kind of singletons; they just
// do not share them.

static GLOBAL: Lazy<Arc<StoreRegistry>> = Lazy::new(StoreRegistry::new);

/// Registry of store kinds and their singletons.
pub struct StoreRegistry {
    blueprints: RwLock<HashMap<&'static str, StoreBlueprint>>,
    instances: RwLock<HashMap<&'static str, InstanceCell>>,
    self_ref: Weak<StoreRegistry>,
}

impl StoreRegistry {
    /// Create an empty registry
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|self_ref| StoreRegistry {
            blueprints: RwLock::new(HashMap::new()),
            instances: RwLock::new(HashMap::new()),
            self_ref: self_ref.clone(),
        })
    }

    /// The process-wide registry
    pub fn global() -> Arc<StoreRegistry> {
        Arc::clone(&GLOBAL)
    }

    /// Register a store kind. Registering the same kind again is a no-op.
    ///
    /// # Errors
    ///
    /// `DuplicateStoreType` if a different Rust type already uses
    /// `K::TYPE_NAME`.
    pub fn register<K: StoreKind>(&self) -> Result<()> {
        let blueprint = StoreBlueprint::of::<K>();
        let mut blueprints = self.blueprints.write();
        match blueprints.get(K::TYPE_NAME) {
            Some(existing) if existing.type_id == blueprint.type_id => Ok(()),
            Some(_) => Err(ConfigError::DuplicateStoreType(K::TYPE_NAME.to_string())),
            None => {
                debug!(target: "strataconf::store", store = K::TYPE_NAME, "Registered store kind");
                blueprints.insert(K::TYPE_NAME, blueprint);
                Ok(())
            }
        }
    }

    /// Singleton of `K`, registering the kind and building the store on
    /// first use.
    pub fn get<K: StoreKind>(&self) -> Result<Arc<ConfigStore>> {
        self.register::<K>()?;
        self.instance_by_name(K::TYPE_NAME)
    }

    /// Singleton registered under a persisted type identity.
    ///
    /// # Errors
    ///
    /// `UnknownStoreType` if no kind was registered under `type_name`.
    pub fn instance_by_name(&self, type_name: &str) -> Result<Arc<ConfigStore>> {
        let blueprint = self
            .blueprints
            .read()
            .get(type_name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownStoreType(type_name.to_string()))?;

        let cell = self.cell(blueprint.type_name);
        let store = cell.get_or_try_init(|| {
            ConfigStore::build(&blueprint, self.self_ref.clone()).map(Arc::new)
        })?;
        Ok(Arc::clone(store))
    }

    /// Singleton of a kind if it has already been built
    pub fn try_existing(&self, type_name: &str) -> Option<Arc<ConfigStore>> {
        self.instances
            .read()
            .get(type_name)
            .and_then(|cell| cell.get().cloned())
    }

    /// Whether a kind is registered under `type_name`
    pub fn is_registered(&self, type_name: &str) -> bool {
        self.blueprints.read().contains_key(type_name)
    }

    /// Registered type identities, sorted
    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.blueprints.read().keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Number of singletons built so far
    pub fn instantiated(&self) -> usize {
        self.instances
            .read()
            .values()
            .filter(|cell| cell.get().is_some())
            .count()
    }

    fn cell(&self, type_name: &'static str) -> InstanceCell {
        if let Some(cell) = self.instances.read().get(type_name) {
            return Arc::clone(cell);
        }
        let mut instances = self.instances.write();
        Arc::clone(
            instances
                .entry(type_name)
                .or_insert_with(|| Arc::new(OnceCell::new())),
        )
    }
}

impl std::fmt::Debug for StoreRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreRegistry")
            .field("kinds", &self.type_names())
            .field("instantiated", &self.instantiated())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    static BUILDS: AtomicUsize = AtomicUsize::new(0);

    struct Counted;

    impl StoreKind for Counted {
        const TYPE_NAME: &'static str = "Counted";

        fn defaults() -> Vec<(String, Value)> {
            BUILDS.fetch_add(1, Ordering::SeqCst);
            vec![("n".to_string(), Value::Int(0))]
        }
    }

    struct Folder;

    impl StoreKind for Folder {
        const TYPE_NAME: &'static str = "Folder";
    }

    struct Impostor;

    impl StoreKind for Impostor {
        const TYPE_NAME: &'static str = "Folder";
    }

    #[test]
    fn test_get_returns_same_instance() {
        let registry = StoreRegistry::new();
        let a = registry.get::<Folder>().unwrap();
        let b = registry.get::<Folder>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.instantiated(), 1);
    }

    #[test]
    fn test_registries_do_not_share_instances() {
        let r1 = StoreRegistry::new();
        let r2 = StoreRegistry::new();
        let a = r1.get::<Folder>().unwrap();
        let b = r2.get::<Folder>().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_duplicate_type_name_rejected() {
        let registry = StoreRegistry::new();
        registry.register::<Folder>().unwrap();
        registry.register::<Folder>().unwrap();
        let err = registry.register::<Impostor>().unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateStoreType(ref n) if n == "Folder"));
    }

    #[test]
    fn test_lookup_by_name() {
        let registry = StoreRegistry::new();
        assert!(matches!(
            registry.instance_by_name("Folder"),
            Err(ConfigError::UnknownStoreType(_))
        ));
        registry.register::<Folder>().unwrap();
        assert!(registry.is_registered("Folder"));
        assert!(registry.try_existing("Folder").is_none());

        let by_name = registry.instance_by_name("Folder").unwrap();
        let by_type = registry.get::<Folder>().unwrap();
        assert!(Arc::ptr_eq(&by_name, &by_type));
        assert!(registry.try_existing("Folder").is_some());
    }

    #[test]
    fn test_concurrent_first_access_builds_once() {
        let registry = StoreRegistry::new();
        registry.register::<Counted>().unwrap();
        let before = BUILDS.load(Ordering::SeqCst);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.get::<Counted>().unwrap())
            })
            .collect();
        let stores: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(BUILDS.load(Ordering::SeqCst) - before, 1);
        assert!(stores.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn test_store_knows_its_registry() {
        let registry = StoreRegistry::new();
        let store = registry.get::<Folder>().unwrap();
        let owner = store.owner().unwrap();
        assert!(Arc::ptr_eq(&owner, &registry));
    }

    #[test]
    fn test_type_names_sorted() {
        let registry = StoreRegistry::new();
        registry.register::<Folder>().unwrap();
        registry.register::<Counted>().unwrap();
        assert_eq!(registry.type_names(), vec!["Counted", "Folder"]);
    }
}
