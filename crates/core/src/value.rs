//! Value types for config stores
//!
//! This module defines:
//! - Value: closed tagged enum for every field value a store can hold
//! - ValueKind: the variant tag, used as the type fence of a store
//! - StoreRef: a reference from one store's field to another store singleton
//!
//! ## Type Rules
//!
//! - No implicit coercions: `Int(1) != Float(1.0)` and a fence of `Int`
//!   rejects `Float`.
//! - Float uses IEEE-754 equality: `NaN != NaN`, `-0.0 == 0.0`.
//! - `Store` values compare by identity (same singleton), never by content.
//! - `Store` values cannot be snapshotted; a store holding one is skipped by
//!   the snapshot cache unless it persists type identities instead.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Weak};

use crate::store::ConfigStore;

/// A field value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    /// Absent value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point (IEEE-754)
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Ordered sequence of values (path segments, tuples)
    Array(Vec<Value>),
    /// Reference to another store singleton
    #[serde(skip)]
    Store(StoreRef),
}

// Custom PartialEq implementation for IEEE-754 float semantics
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Store(a), Value::Store(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    /// The variant tag of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Store(_) => ValueKind::Store,
        }
    }

    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        self.kind().name()
    }

    /// Whether this value (or anything nested in it) can be written to a blob
    pub fn is_serializable(&self) -> bool {
        match self {
            Value::Store(_) => false,
            Value::Array(items) => items.iter().all(Value::is_serializable),
            _ => true,
        }
    }

    /// Get as bool if this is a Bool value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i64 if this is an Int value
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64 if this is a Float value
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as &str if this is a String value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as &[Value] if this is an Array value
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get the referenced store if this is a live Store value
    pub fn as_store(&self) -> Option<Arc<ConfigStore>> {
        match self {
            Value::Store(r) => r.upgrade(),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "{}", s),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Store(r) => write!(f, "<store {}>", r.type_name()),
        }
    }
}

// ============================================================================
// ValueKind
// ============================================================================

/// Variant tag of a [`Value`]; a store's type fence is one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// [`Value::Null`]
    Null,
    /// [`Value::Bool`]
    Bool,
    /// [`Value::Int`]
    Int,
    /// [`Value::Float`]
    Float,
    /// [`Value::String`]
    String,
    /// [`Value::Array`]
    Array,
    /// [`Value::Store`]
    Store,
}

impl ValueKind {
    /// Human readable tag name
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Null => "Null",
            ValueKind::Bool => "Bool",
            ValueKind::Int => "Int",
            ValueKind::Float => "Float",
            ValueKind::String => "String",
            ValueKind::Array => "Array",
            ValueKind::Store => "Store",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// StoreRef
// ============================================================================

/// Non-owning reference to a store singleton.
///
/// The owning [`StoreRegistry`](crate::registry::StoreRegistry) keeps every
/// singleton alive, so a `StoreRef` only dangles once its registry is gone.
/// Holding a weak pointer lets the Dump Registry list itself as a member
/// without creating a reference cycle.
#[derive(Clone)]
pub struct StoreRef {
    type_name: &'static str,
    store: Weak<ConfigStore>,
}

impl StoreRef {
    /// Reference an existing store
    pub fn new(store: &Arc<ConfigStore>) -> Self {
        StoreRef {
            type_name: store.type_name(),
            store: Arc::downgrade(store),
        }
    }

    /// Persisted type identity of the referenced store
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Upgrade to the live store, if its registry still exists
    pub fn upgrade(&self) -> Option<Arc<ConfigStore>> {
        self.store.upgrade()
    }
}

impl PartialEq for StoreRef {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && Weak::ptr_eq(&self.store, &other.store)
    }
}

impl fmt::Debug for StoreRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreRef")
            .field("type_name", &self.type_name)
            .field("live", &(self.store.strong_count() > 0))
            .finish()
    }
}

// ============================================================================
// From implementations for ergonomic API usage
// ============================================================================

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<Vec<Value>> for Value {
    fn from(a: Vec<Value>) -> Self {
        Value::Array(a)
    }
}

impl From<&[&str]> for Value {
    fn from(parts: &[&str]) -> Self {
        Value::Array(parts.iter().map(|p| Value::from(*p)).collect())
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}
