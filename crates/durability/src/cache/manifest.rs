//! Cache manifest (`info.json`)
//!
//! Maps each persisted store name to the blob holding its latest snapshot and
//! the SHA-256 of that blob:
//!
//! ```json
//! { "Folder": { "filename": "Folder_52331904117.bin", "hash_check": "9F86D0..." } }
//! ```
//!
//! Written atomically via temp + rename.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::Path;

use crate::error::{CacheError, Result};

/// Blob file and content hash of one store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Blob file name, relative to the cache directory
    pub filename: String,
    /// Hex SHA-256 of the blob content
    pub hash_check: String,
}

/// Store name to blob, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: IndexMap<String, ManifestEntry>,
}

impl Manifest {
    /// Empty manifest
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry of a store
    pub fn get(&self, store: &str) -> Option<&ManifestEntry> {
        self.entries.get(store)
    }

    /// Record or replace the entry of a store
    pub fn insert(&mut self, store: impl Into<String>, entry: ManifestEntry) {
        self.entries.insert(store.into(), entry);
    }

    /// Drop the entry of a store
    pub fn remove(&mut self, store: &str) -> Option<ManifestEntry> {
        self.entries.shift_remove(store)
    }

    /// Store names in manifest order
    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Iterate entries in manifest order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ManifestEntry)> {
        self.entries.iter()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the manifest has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Move `store` to the front, so it is processed first
    pub(crate) fn move_to_front(&mut self, store: &str) {
        if let Some(index) = self.entries.get_index_of(store) {
            self.entries.move_index(index, 0);
        }
    }

    /// Load a manifest from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let buf = std::fs::read(path)?;
        serde_json::from_slice(&buf).map_err(|e| CacheError::Manifest {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Write the manifest atomically (temp + optional fsync + rename).
    pub fn write(&self, path: &Path, fsync: bool) -> Result<()> {
        let dir = path.parent().unwrap_or(Path::new("."));
        std::fs::create_dir_all(dir)?;

        let payload = serde_json::to_vec_pretty(self).map_err(|e| CacheError::Manifest {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let tmp_path = path.with_extension("json.tmp");
        {
            let mut file = std::fs::File::create(&tmp_path)?;
            file.write_all(&payload)?;
            if fsync {
                file.sync_all()?;
            }
        }
        std::fs::rename(&tmp_path, path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp_path);
            io::Error::new(e.kind(), format!("rename manifest: {}", e))
        })?;
        Ok(())
    }
}
