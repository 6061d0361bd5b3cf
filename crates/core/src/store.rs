//! Config stores
//!
//! A [`ConfigStore`] is an ordered, lock-protected map from field name to
//! [`Value`], plus an optional type fence and a read-only flag per field.
//! Stores are normally obtained as singletons from a
//! [`StoreRegistry`](crate::registry::StoreRegistry); the shape of each store
//! is described by a [`StoreKind`].
//!
//! ## Invariants
//!
//! - Reserved names (the store's own operation names) are never field names.
//! - If a fence is set, every write must carry a value of that kind.
//! - The fence is inferred from the initial fields: exactly one kind among
//!   them fences the store, anything else leaves it unfenced.
//! - Initial fields are read-only; fields created later are writable.
//! - Every access to the value map happens under the store's data lock.
//!   Single operations are atomic, multi-step sequences are not.
//!
//! ## Read asymmetry
//!
//! [`StoreKind::read`] may transform a value on its way out of [`ConfigStore::get`].
//! Snapshots, equality checks during restore and [`ConfigStore::get_raw`]
//! always see the stored value.

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io::{Read, Write};
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

use crate::error::{ConfigError, Result};
use crate::field::{Field, FieldRef};
use crate::registry::StoreRegistry;
use crate::value::{Value, ValueKind};

/// Names that collide with store operations and can never name a field.
pub const RESERVED_NAMES: &[&str] = &[
    "get",
    "get_raw",
    "get_index",
    "set",
    "declare",
    "remove",
    "field",
    "set_readonly",
    "is_readonly",
    "fence",
    "set_fence",
    "snapshot",
    "restore",
    "names",
    "values",
    "iter",
    "contains",
    "len",
    "is_empty",
    "type_name",
];

/// Whether `name` is reserved for a store operation
pub fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}

// =============================================================================
// Store kinds
// =============================================================================

/// How a store's type fence is established at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceRule {
    /// Fence on the single kind shared by the initial fields, if any
    Inferred,
    /// Always fence on this kind
    Fixed(ValueKind),
    /// Never fence
    Disabled,
}

/// How a store is written to and read from a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreRole {
    /// Field values are persisted as-is
    Plain,
    /// Field values are store references; their type identities are persisted
    Registry,
}

/// Static description of a concrete store type.
///
/// Each implementor names one singleton per registry. `TYPE_NAME` is the
/// identity written into snapshots, so it must stay stable across releases.
///
/// ```ignore
/// struct Folder;
///
/// impl StoreKind for Folder {
///     const TYPE_NAME: &'static str = "Folder";
///
///     fn defaults() -> Vec<(String, Value)> {
///         vec![("CACHE".into(), Value::from(&["profiles", "cache"][..]))]
///     }
/// }
/// ```
pub trait StoreKind: 'static {
    /// Persisted type identity
    const TYPE_NAME: &'static str;

    /// Snapshot behavior
    const ROLE: StoreRole = StoreRole::Plain;

    /// Initial fields, registered read-only in this order
    fn defaults() -> Vec<(String, Value)> {
        Vec::new()
    }

    /// How the fence is established
    fn fence_rule() -> FenceRule {
        FenceRule::Inferred
    }

    /// Transform a value on read; the stored value is left untouched
    fn read(name: &str, raw: Value) -> Value {
        let _ = name;
        raw
    }
}

/// Type-erased [`StoreKind`], kept by the registry to build singletons.
#[derive(Clone)]
pub struct StoreBlueprint {
    pub(crate) type_id: TypeId,
    pub(crate) type_name: &'static str,
    role: StoreRole,
    defaults: fn() -> Vec<(String, Value)>,
    fence_rule: fn() -> FenceRule,
    read: fn(&str, Value) -> Value,
}

impl StoreBlueprint {
    /// Blueprint of a store kind
    pub fn of<K: StoreKind>() -> Self {
        StoreBlueprint {
            type_id: TypeId::of::<K>(),
            type_name: K::TYPE_NAME,
            role: K::ROLE,
            defaults: K::defaults,
            fence_rule: K::fence_rule,
            read: K::read,
        }
    }

    /// Persisted type identity
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for StoreBlueprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreBlueprint")
            .field("type_name", &self.type_name)
            .field("role", &self.role)
            .finish()
    }
}

// =============================================================================
// Snapshot payload
// =============================================================================

#[derive(Serialize, Deserialize)]
struct StoreSnapshot {
    fields: Vec<(String, Value)>,
    fence: Option<ValueKind>,
}

// =============================================================================
// ConfigStore
// =============================================================================

/// A typed, thread-safe key/value store.
pub struct ConfigStore {
    type_name: &'static str,
    role: StoreRole,
    read_hook: fn(&str, Value) -> Value,
    /// Field values in declaration order
    data: Mutex<IndexMap<String, Value>>,
    /// Field descriptors; only locked after `data` when both are needed
    fields: RwLock<HashMap<String, Arc<Field>>>,
    fence: RwLock<Option<ValueKind>>,
    owner: Weak<StoreRegistry>,
}

impl ConfigStore {
    /// Build a store from its blueprint.
    ///
    /// Initial fields are inserted read-only before the fence is applied, so
    /// a `Fixed` fence never rejects a default.
    pub(crate) fn build(blueprint: &StoreBlueprint, owner: Weak<StoreRegistry>) -> Result<Self> {
        let defaults = (blueprint.defaults)();

        let mut data = IndexMap::with_capacity(defaults.len());
        let mut fields = HashMap::with_capacity(defaults.len());
        let mut kinds = HashSet::new();
        for (name, value) in defaults {
            if is_reserved(&name) {
                return Err(ConfigError::NameConflict { name });
            }
            kinds.insert(value.kind());
            fields.insert(name.clone(), Arc::new(Field::new(name.clone(), true)));
            data.insert(name, value);
        }

        let fence = match (blueprint.fence_rule)() {
            FenceRule::Inferred if kinds.len() == 1 => kinds.into_iter().next(),
            FenceRule::Inferred | FenceRule::Disabled => None,
            FenceRule::Fixed(kind) => Some(kind),
        };

        debug!(
            target: "strataconf::store",
            store = blueprint.type_name,
            fields = data.len(),
            ?fence,
            "Constructed store"
        );

        Ok(ConfigStore {
            type_name: blueprint.type_name,
            role: blueprint.role,
            read_hook: blueprint.read,
            data: Mutex::new(data),
            fields: RwLock::new(fields),
            fence: RwLock::new(fence),
            owner,
        })
    }

    /// Build a store that no registry owns.
    ///
    /// Useful for tests and for embedders that manage lifetimes themselves.
    /// A standalone `Registry` store cannot resolve members on restore.
    pub fn standalone<K: StoreKind>() -> Result<Self> {
        Self::build(&StoreBlueprint::of::<K>(), Weak::new())
    }

    /// Persisted type identity
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Snapshot behavior
    pub fn role(&self) -> StoreRole {
        self.role
    }

    pub(crate) fn owner(&self) -> Option<Arc<StoreRegistry>> {
        self.owner.upgrade()
    }

    // -------------------------------------------------------------------------
    // Fence
    // -------------------------------------------------------------------------

    /// Active type fence, if any
    pub fn fence(&self) -> Option<ValueKind> {
        *self.fence.read()
    }

    /// Replace the type fence. Existing values are not re-checked.
    pub fn set_fence(&self, fence: Option<ValueKind>) {
        *self.fence.write() = fence;
    }

    fn check_fence(&self, name: &str, value: &Value) -> Result<()> {
        match self.fence() {
            Some(expected) if value.kind() != expected => Err(ConfigError::TypeMismatch {
                store: self.type_name.to_string(),
                name: name.to_string(),
                expected,
                actual: value.kind(),
            }),
            _ => Ok(()),
        }
    }

    fn no_such_field(&self, name: &str) -> ConfigError {
        ConfigError::NoSuchField {
            store: self.type_name.to_string(),
            name: name.to_string(),
        }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Value of a field, passed through the store's read hook
    pub fn get(&self, name: &str) -> Result<Value> {
        let raw = self.get_raw(name)?;
        Ok((self.read_hook)(name, raw))
    }

    /// Stored value of a field, without the read hook
    pub fn get_raw(&self, name: &str) -> Result<Value> {
        self.data
            .lock()
            .get(name)
            .cloned()
            .ok_or_else(|| self.no_such_field(name))
    }

    /// Value of the field at `index` in declaration order
    pub fn get_index(&self, index: usize) -> Result<Value> {
        let entry = self
            .data
            .lock()
            .get_index(index)
            .map(|(name, value)| (name.clone(), value.clone()));
        match entry {
            Some((name, raw)) => Ok((self.read_hook)(&name, raw)),
            None => Err(self.no_such_field(&format!("#{}", index))),
        }
    }

    /// Whether a field exists
    pub fn contains(&self, name: &str) -> bool {
        self.data.lock().contains_key(name)
    }

    /// Field names in declaration order
    pub fn names(&self) -> Vec<String> {
        self.data.lock().keys().cloned().collect()
    }

    /// Processed values in declaration order
    pub fn values(&self) -> Vec<Value> {
        let entries: Vec<(String, Value)> = self
            .data
            .lock()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries
            .into_iter()
            .map(|(name, raw)| (self.read_hook)(&name, raw))
            .collect()
    }

    /// Iterate processed values in declaration order.
    ///
    /// The iterator works on a copy taken under the lock.
    pub fn iter(&self) -> std::vec::IntoIter<Value> {
        self.values().into_iter()
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.data.lock().len()
    }

    /// Whether the store has no fields
    pub fn is_empty(&self) -> bool {
        self.data.lock().is_empty()
    }

    // -------------------------------------------------------------------------
    // Fields
    // -------------------------------------------------------------------------

    fn descriptor(&self, name: &str) -> Option<Arc<Field>> {
        self.fields.read().get(name).cloned()
    }

    /// Handle to a field
    pub fn field(&self, name: &str) -> Result<FieldRef<'_>> {
        self.descriptor(name)
            .map(|field| FieldRef::new(self, field))
            .ok_or_else(|| self.no_such_field(name))
    }

    /// Lock or unlock a field against writes
    pub fn set_readonly(&self, name: &str, readonly: bool) -> Result<()> {
        self.field(name)?.set_readonly(readonly);
        Ok(())
    }

    /// Whether a field is locked against writes
    pub fn is_readonly(&self, name: &str) -> Result<bool> {
        Ok(self.field(name)?.is_readonly())
    }

    /// Write through an existing descriptor.
    pub(crate) fn write_field(&self, field: &Field, value: Value) -> Result<()> {
        let name = field.name();
        if is_reserved(name) {
            return Err(ConfigError::NameConflict {
                name: name.to_string(),
            });
        }
        if field.is_readonly() {
            return Err(ConfigError::ReadOnly {
                store: self.type_name.to_string(),
                name: name.to_string(),
            });
        }
        self.check_fence(name, &value)?;

        let mut data = self.data.lock();
        match data.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(self.no_such_field(name)),
        }
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    /// Create a writable field, or write an existing one.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        match self.descriptor(name) {
            Some(field) => self.write_field(&field, value),
            None => self.declare(name, value, false),
        }
    }

    /// Create or update a field and set its read-only flag in one call.
    ///
    /// An existing read-only field rejects the write; unlock it first.
    pub fn declare(&self, name: &str, value: impl Into<Value>, readonly: bool) -> Result<()> {
        let value = value.into();
        if is_reserved(name) {
            return Err(ConfigError::NameConflict {
                name: name.to_string(),
            });
        }

        let mut data = self.data.lock();
        let mut fields = self.fields.write();
        match fields.get(name) {
            Some(field) => {
                if field.is_readonly() {
                    return Err(ConfigError::ReadOnly {
                        store: self.type_name.to_string(),
                        name: name.to_string(),
                    });
                }
                self.check_fence(name, &value)?;
                data.insert(name.to_string(), value);
                field.set_readonly(readonly);
            }
            None => {
                self.check_fence(name, &value)?;
                data.insert(name.to_string(), value);
                fields.insert(name.to_string(), Arc::new(Field::new(name, readonly)));
                debug!(target: "strataconf::store", store = self.type_name, field = name, readonly, "Declared field");
            }
        }
        Ok(())
    }

    /// Delete a field. Read-only fields can be deleted.
    pub fn remove(&self, name: &str) -> Result<Value> {
        let mut data = self.data.lock();
        let value = data
            .shift_remove(name)
            .ok_or_else(|| self.no_such_field(name))?;
        self.fields.write().remove(name);
        debug!(target: "strataconf::store", store = self.type_name, field = name, "Removed field");
        Ok(value)
    }

    // -------------------------------------------------------------------------
    // Snapshots
    // -------------------------------------------------------------------------

    /// Serialize the store into `sink`.
    ///
    /// # Errors
    ///
    /// `Unsupported` if a plain store holds a store reference; nothing is
    /// written in that case.
    pub fn snapshot<W: Write>(&self, sink: &mut W) -> Result<()> {
        if self.role == StoreRole::Registry {
            return crate::dump::snapshot_members(self, sink);
        }

        let fields: Vec<(String, Value)> = self
            .data
            .lock()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if let Some((field, _)) = fields.iter().find(|(_, v)| !v.is_serializable()) {
            return Err(ConfigError::Unsupported {
                store: self.type_name.to_string(),
                field: field.clone(),
            });
        }

        let snapshot = StoreSnapshot {
            fields,
            fence: self.fence(),
        };
        rmp_serde::encode::write_named(sink, &snapshot)?;
        Ok(())
    }

    /// Replace the store's fields and fence with a snapshot read from `source`.
    ///
    /// The fence is off for the whole call, so restoration never fails with
    /// `TypeMismatch`. Fields whose stored value already equals the snapshot
    /// are not rewritten; read-only fields keep their flag. Fields missing
    /// from the snapshot are deleted. Reserved names in the snapshot are
    /// skipped.
    pub fn restore<R: Read>(&self, source: &mut R) -> Result<()> {
        if self.role == StoreRole::Registry {
            return crate::dump::restore_members(self, source);
        }

        let snapshot: StoreSnapshot = rmp_serde::decode::from_read(source)?;
        let previous = self.fence.write().take();
        let outcome = self.apply_fields(snapshot.fields);
        *self.fence.write() = if outcome.is_ok() {
            snapshot.fence
        } else {
            previous
        };
        outcome
    }

    fn apply_fields(&self, restored: Vec<(String, Value)>) -> Result<()> {
        let mut keep = HashSet::with_capacity(restored.len());
        for (name, value) in restored {
            if is_reserved(&name) {
                warn!(target: "strataconf::store", store = self.type_name, field = %name, "Skipping reserved name in snapshot");
                continue;
            }
            keep.insert(name.clone());

            let Some(field) = self.descriptor(&name) else {
                self.declare(&name, value, false)?;
                continue;
            };
            if self.get_raw(&name).ok().as_ref() == Some(&value) {
                continue;
            }

            let locked = field.is_readonly();
            if locked {
                field.set_readonly(false);
            }
            let written = self.write_field(&field, value);
            if locked {
                field.set_readonly(true);
            }
            written?;
        }

        for name in self.names() {
            if !keep.contains(&name) {
                // Another thread may have removed it already
                let _ = self.remove(&name);
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigStore")
            .field("type_name", &self.type_name)
            .field("role", &self.role)
            .field("fence", &self.fence())
            .field("names", &self.names())
            .finish()
    }
}

impl<'a> IntoIterator for &'a ConfigStore {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
