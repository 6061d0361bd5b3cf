//! Dump Registry
//!
//! The Dump Registry is the store that decides which stores take part in the
//! snapshot cycle. Each of its fields holds a [`Value::Store`] reference, and
//! it lists itself under its own name so the cache persists it too.
//!
//! A registry snapshot records `(field name, type identity)` pairs instead of
//! values. Each member serializes itself; restoring the registry only needs
//! to know which kinds to look up.

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::sync::Arc;
use tracing::warn;

use crate::error::Result;
use crate::store::{ConfigStore, FenceRule, StoreKind, StoreRole};
use crate::value::{StoreRef, Value, ValueKind};

/// Store kind of the Dump Registry.
pub struct Dump;

impl StoreKind for Dump {
    const TYPE_NAME: &'static str = "Dump";
    const ROLE: StoreRole = StoreRole::Registry;

    fn fence_rule() -> FenceRule {
        FenceRule::Fixed(ValueKind::Store)
    }
}

impl Dump {
    /// Declare the registry as its own read-only member
    pub fn install(registry: &Arc<ConfigStore>) -> Result<()> {
        let me = Value::Store(StoreRef::new(registry));
        if registry.get_raw(Dump::TYPE_NAME).ok().as_ref() == Some(&me) {
            return Ok(());
        }
        registry.declare(Dump::TYPE_NAME, me, true)
    }

    /// Live members as `(field name, store)` pairs, in declaration order.
    ///
    /// Fields whose store is gone are left out.
    pub fn members(registry: &ConfigStore) -> Vec<(String, Arc<ConfigStore>)> {
        registry
            .names()
            .into_iter()
            .filter_map(|name| {
                let store = registry.get_raw(&name).ok()?.as_store()?;
                Some((name, store))
            })
            .collect()
    }
}

#[derive(Serialize, Deserialize)]
struct RegistrySnapshot {
    members: Vec<(String, String)>,
    fence: Option<ValueKind>,
}

pub(crate) fn snapshot_members<W: Write>(registry: &ConfigStore, sink: &mut W) -> Result<()> {
    let members = registry
        .names()
        .into_iter()
        .filter_map(|name| match registry.get_raw(&name) {
            Ok(Value::Store(r)) => Some((name, r.type_name().to_string())),
            _ => None,
        })
        .collect();
    let snapshot = RegistrySnapshot {
        members,
        fence: registry.fence(),
    };
    rmp_serde::encode::write_named(sink, &snapshot)?;
    Ok(())
}

pub(crate) fn restore_members<R: Read>(registry: &ConfigStore, source: &mut R) -> Result<()> {
    let snapshot: RegistrySnapshot = rmp_serde::decode::from_read(source)?;

    for name in registry.names() {
        let _ = registry.remove(&name);
    }
    registry.set_fence(None);

    let owner = registry.owner();
    let mut this = None;
    for (name, type_name) in snapshot.members {
        let Some(owner) = owner.as_ref() else {
            warn!(target: "strataconf::store", member = %name, "Registry has no owner, dropping member");
            continue;
        };
        match owner.instance_by_name(&type_name) {
            Ok(store) => {
                if store.type_name() == registry.type_name() {
                    this = Some(store);
                    continue;
                }
                registry.declare(&name, Value::Store(StoreRef::new(&store)), false)?;
            }
            Err(e) => {
                warn!(target: "strataconf::store", member = %name, store = %type_name, error = %e, "Skipping unresolvable member");
            }
        }
    }

    // Re-list the registry itself, read-only, whether or not the snapshot had it
    let this = match this {
        Some(store) => Some(store),
        None => owner.and_then(|o| o.try_existing(registry.type_name())),
    };
    if let Some(store) = this {
        Dump::install(&store)?;
    }

    registry.set_fence(snapshot.fence);
    Ok(())
}
