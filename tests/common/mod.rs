//! Shared test utilities for all integration test suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]

pub use strataconf::{AppContext, ConfigStore, SnapshotCache, StoreKind, Value, ValueKind};
use std::sync::Arc;
use tempfile::TempDir;

// ============================================================================
// Store kinds
// ============================================================================

/// Folder layout, stored as path segments and read back joined
pub struct Folder;

impl StoreKind for Folder {
    const TYPE_NAME: &'static str = "Folder";

    fn defaults() -> Vec<(String, Value)> {
        vec![
            ("ASSETS".to_string(), Value::from(&["core", "assets"][..])),
            ("LOGS".to_string(), Value::from(&["logs"][..])),
            ("CACHE".to_string(), Value::from(&["profiles", "cache"][..])),
        ]
    }

    fn read(_name: &str, raw: Value) -> Value {
        match raw.as_array() {
            Some(parts) => Value::String(
                parts
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join("/"),
            ),
            None => raw,
        }
    }
}

/// Mixed-type runtime facts, unfenced
pub struct RunInfo;

impl StoreKind for RunInfo {
    const TYPE_NAME: &'static str = "RunInfo";

    fn defaults() -> Vec<(String, Value)> {
        vec![
            ("SYSTEM".to_string(), Value::from("Linux")),
            ("PID".to_string(), Value::Int(1)),
        ]
    }
}

/// Extra log file names; strings only
pub struct LogName;

impl StoreKind for LogName {
    const TYPE_NAME: &'static str = "LogName";

    fn fence_rule() -> strataconf::FenceRule {
        strataconf::FenceRule::Fixed(ValueKind::String)
    }
}

// ============================================================================
// Harness
// ============================================================================

/// A cache directory plus a context persisting every test store kind
pub struct TestApp {
    pub dir: TempDir,
    pub ctx: AppContext,
    pub cache: SnapshotCache,
}

impl TestApp {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let cache = SnapshotCache::open(dir.path()).unwrap();
        TestApp {
            ctx: fresh_context(),
            dir,
            cache,
        }
    }

    /// Simulate a restart: a new context over the same directory
    pub fn restart(&self) -> AppContext {
        fresh_context()
    }

    pub fn store<K: StoreKind>(&self) -> Arc<ConfigStore> {
        self.ctx.store::<K>().unwrap()
    }
}

pub fn fresh_context() -> AppContext {
    let ctx = AppContext::new().unwrap();
    ctx.persist::<Folder>().unwrap();
    ctx.persist::<RunInfo>().unwrap();
    ctx.persist::<LogName>().unwrap();
    ctx
}

/// Names and stored values of a store, in declaration order
pub fn contents(store: &ConfigStore) -> Vec<(String, Value)> {
    store
        .names()
        .into_iter()
        .map(|name| {
            let value = store.get_raw(&name).unwrap();
            (name, value)
        })
        .collect()
}
