//! Type-fenced field descriptors
//!
//! A [`Field`] carries the per-field read-only flag. Values live in the owning
//! store's lock-protected map; every write is delegated to the store so the
//! reserved-name, read-only and fence checks run in one place.
//!
//! The read-only flag is an atomic and never takes the store's data lock, so
//! toggling it cannot block behind value reads or writes.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::Result;
use crate::store::ConfigStore;
use crate::value::Value;

/// Descriptor for one named field of a store.
pub struct Field {
    name: String,
    readonly: AtomicBool,
}

impl Field {
    pub(crate) fn new(name: impl Into<String>, readonly: bool) -> Self {
        Field {
            name: name.into(),
            readonly: AtomicBool::new(readonly),
        }
    }

    /// Field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether writes are currently rejected
    pub fn is_readonly(&self) -> bool {
        self.readonly.load(Ordering::Acquire)
    }

    /// Flip the read-only flag
    pub fn set_readonly(&self, readonly: bool) {
        self.readonly.store(readonly, Ordering::Release);
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("readonly", &self.is_readonly())
            .finish()
    }
}

/// A field bound to the store that owns it.
///
/// Obtained from [`ConfigStore::field`]. The handle stays valid after the
/// field is removed; reads and writes then fail with `NoSuchField`.
pub struct FieldRef<'a> {
    store: &'a ConfigStore,
    field: Arc<Field>,
}

impl<'a> FieldRef<'a> {
    pub(crate) fn new(store: &'a ConfigStore, field: Arc<Field>) -> Self {
        FieldRef { store, field }
    }

    /// Field name
    pub fn name(&self) -> &str {
        self.field.name()
    }

    /// Current value, after the store's read hook
    pub fn read(&self) -> Result<Value> {
        self.store.get(self.field.name())
    }

    /// Store a new value
    ///
    /// # Errors
    ///
    /// - `NameConflict` if the name is reserved
    /// - `ReadOnly` if the field is locked
    /// - `TypeMismatch` if the store's fence rejects the value
    /// - `NoSuchField` if the field was removed
    pub fn write(&self, value: impl Into<Value>) -> Result<()> {
        self.store.write_field(&self.field, value.into())
    }

    /// Whether writes are currently rejected
    pub fn is_readonly(&self) -> bool {
        self.field.is_readonly()
    }

    /// Flip the read-only flag
    pub fn set_readonly(&self, readonly: bool) {
        self.field.set_readonly(readonly);
    }
}

impl fmt::Debug for FieldRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRef")
            .field("store", &self.store.type_name())
            .field("field", &self.field)
            .finish()
    }
}
