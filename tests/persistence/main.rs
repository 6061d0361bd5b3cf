//! Integration tests for the snapshot cycle.
//!
//! These tests exercise config stores, the Dump Registry and the snapshot
//! cache together across simulated restarts: populate, dump, build a fresh
//! context, load.

#[path = "../common/mod.rs"]
mod common;

mod corruption;
mod dump_load;
mod startup;
