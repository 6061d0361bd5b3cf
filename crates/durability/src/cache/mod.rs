//! Snapshot cache
//!
//! Persists every store listed in the Dump Registry to its own blob, with a
//! manifest (`info.json`) recording each blob's file name and SHA-256.
//!
//! ## Dump ordering
//!
//! For each store: write the new blob, re-read and hash it, and update the
//! in-memory manifest entry. The manifest is written once, atomically, after
//! all stores; previous blobs are deleted only after that write succeeds. A
//! failure at any point leaves the on-disk manifest pointing at blobs that
//! still exist, and the blobs written by the failed dump are removed.
//!
//! ## Load policy
//!
//! Corruption is a cache miss, not an error. A missing blob, a hash mismatch,
//! an unknown store or an undecodable blob marks the entry invalid; the blob
//! and the entry are purged and the store keeps its defaults. An unreadable
//! manifest resets the whole directory. Only I/O errors on the directory or
//! manifest escape [`SnapshotCache::load_all`].

pub mod config;
pub mod manifest;
pub mod paths;

use rand::Rng;
use sha2::{Digest, Sha256};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use strataconf_core::{AppContext, ConfigError, ConfigStore, Dump, StoreKind};
use tracing::{debug, info, warn};

use crate::error::{CacheError, Result};
use config::CacheConfig;
use manifest::{Manifest, ManifestEntry};
use paths::CachePaths;

/// Blob names carry a random integer below this bound
const BLOB_ID_BOUND: u64 = 1 << 50;

/// Outcome of [`SnapshotCache::dump_all`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DumpReport {
    /// Stores written to a fresh blob
    pub written: Vec<String>,
    /// Stores whose content cannot be snapshotted
    pub skipped: Vec<String>,
}

/// Outcome of [`SnapshotCache::load_all`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Stores restored from their blob
    pub restored: Vec<String>,
    /// Manifest entries dropped as invalid
    pub purged: Vec<String>,
    /// Whether the manifest was unreadable and the directory was reset
    pub reset: bool,
}

/// Hash-verified snapshot directory
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    paths: CachePaths,
    config: CacheConfig,
}

impl SnapshotCache {
    /// Open a cache directory, creating it if needed.
    ///
    /// Settings come from `cache.toml` inside the directory when present.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let paths = CachePaths::from_root(root);
        paths.create_directories()?;
        let config = CacheConfig::from_file_or_default(&paths.config())?;
        Ok(SnapshotCache { paths, config })
    }

    /// Open a cache directory with explicit settings
    pub fn with_config(root: impl AsRef<Path>, config: CacheConfig) -> Result<Self> {
        let paths = CachePaths::from_root(root);
        paths.create_directories()?;
        Ok(SnapshotCache { paths, config })
    }

    /// Directory layout
    pub fn paths(&self) -> &CachePaths {
        &self.paths
    }

    /// Active settings
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Manifest currently on disk
    pub fn manifest(&self) -> Result<Manifest> {
        Manifest::load(&self.paths.manifest())
    }

    // =========================================================================
    // Dump
    // =========================================================================

    /// Write every store in the Dump Registry to a fresh blob.
    ///
    /// Stores holding values that cannot be snapshotted are skipped and keep
    /// whatever entry they had.
    pub fn dump_all(&self, ctx: &AppContext) -> Result<DumpReport> {
        let mut manifest = match Manifest::load(&self.paths.manifest()) {
            Ok(manifest) => manifest,
            Err(CacheError::Io(e)) if e.kind() == io::ErrorKind::NotFound => Manifest::new(),
            Err(e) => {
                warn!(target: "strataconf::cache", error = %e, "Unreadable manifest, starting a new one");
                Manifest::new()
            }
        };

        let mut report = DumpReport::default();
        let mut superseded = Vec::new();
        let mut fresh = Vec::new();
        for (name, store) in ctx.persisted() {
            let prior = manifest.get(&name).map(|entry| entry.filename.clone());
            let outcome = self.dump_store(&name, &store, prior.as_deref());
            match outcome {
                Ok(Some(entry)) => {
                    fresh.push(entry.filename.clone());
                    superseded.extend(prior);
                    manifest.insert(name.clone(), entry);
                    report.written.push(name);
                }
                Ok(None) => report.skipped.push(name),
                Err(e) => {
                    self.discard_blobs(&fresh);
                    return Err(e);
                }
            }
        }

        if let Err(e) = manifest.write(&self.paths.manifest(), self.config.fsync) {
            self.discard_blobs(&fresh);
            return Err(e);
        }
        self.discard_blobs(&superseded);
        info!(
            target: "strataconf::cache",
            written = report.written.len(),
            skipped = report.skipped.len(),
            "Snapshot cache dumped"
        );
        Ok(report)
    }

    fn dump_store(
        &self,
        name: &str,
        store: &ConfigStore,
        prior: Option<&str>,
    ) -> Result<Option<ManifestEntry>> {
        let mut buf = Vec::new();
        match store.snapshot(&mut buf) {
            Ok(()) => {}
            Err(ConfigError::Unsupported { field, .. }) => {
                debug!(target: "strataconf::cache", store = name, field = %field, "Store content cannot be snapshotted, skipping");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        }

        let filename = self.fresh_blob_name(name, prior);
        let path = self.paths.blob(&filename);
        let written = self.write_blob(&path, &buf).and_then(|()| self.hash_file(&path));
        let hash_check = match written {
            Ok(hash_check) => hash_check,
            Err(e) => {
                self.discard_blobs(std::slice::from_ref(&filename));
                return Err(e.into());
            }
        };

        debug!(target: "strataconf::cache", store = name, blob = %filename, bytes = buf.len(), "Wrote blob");
        Ok(Some(ManifestEntry {
            filename,
            hash_check,
        }))
    }

    fn fresh_blob_name(&self, name: &str, prior: Option<&str>) -> String {
        let mut rng = rand::thread_rng();
        loop {
            let candidate = format!(
                "{}_{}.{}",
                name,
                rng.gen_range(0..BLOB_ID_BOUND),
                self.config.blob_extension
            );
            if Some(candidate.as_str()) != prior && !self.paths.blob(&candidate).exists() {
                return candidate;
            }
        }
    }

    /// Delete blobs the on-disk manifest no longer refers to
    fn discard_blobs(&self, filenames: &[String]) {
        for filename in filenames.iter().filter(|f| is_plain_file_name(f)) {
            match std::fs::remove_file(self.paths.blob(filename)) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(target: "strataconf::cache", blob = %filename, error = %e, "Could not delete blob")
                }
            }
        }
    }

    fn write_blob(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        let mut file = std::fs::File::create(path)?;
        file.write_all(bytes)?;
        if self.config.fsync {
            file.sync_all()?;
        }
        Ok(())
    }

    fn hash_file(&self, path: &Path) -> io::Result<String> {
        let bytes = std::fs::read(path)?;
        Ok(self.hash_bytes(&bytes))
    }

    fn hash_bytes(&self, bytes: &[u8]) -> String {
        let digest = Sha256::digest(bytes);
        if self.config.uppercase_hash {
            hex::encode_upper(digest)
        } else {
            hex::encode(digest)
        }
    }

    // =========================================================================
    // Load
    // =========================================================================

    /// Restore every store named in the manifest from its blob.
    ///
    /// The Dump Registry's own entry goes first so that members it lists are
    /// resolvable. Invalid entries are purged and the pruned manifest is
    /// written back.
    pub fn load_all(&self, ctx: &AppContext) -> Result<LoadReport> {
        let mut report = LoadReport::default();
        let mut manifest = match Manifest::load(&self.paths.manifest()) {
            Ok(manifest) => manifest,
            Err(CacheError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                self.paths.create_directories()?;
                Manifest::new()
            }
            Err(e) => {
                warn!(target: "strataconf::cache", error = %e, dir = %self.paths.root().display(), "Unreadable manifest, resetting cache directory");
                self.reset()?;
                report.reset = true;
                Manifest::new()
            }
        };
        manifest.move_to_front(Dump::TYPE_NAME);

        let mut invalid = Vec::new();
        for (name, entry) in manifest.iter() {
            match self.load_entry(ctx, name, entry) {
                Ok(()) => report.restored.push(name.clone()),
                Err(e) => {
                    warn!(target: "strataconf::cache", store = %name, blob = %entry.filename, error = %e, "Discarding cached snapshot");
                    invalid.push(name.clone());
                }
            }
        }

        for name in invalid {
            if let Some(entry) = manifest.remove(&name) {
                if is_plain_file_name(&entry.filename) {
                    let _ = std::fs::remove_file(self.paths.blob(&entry.filename));
                }
            }
            report.purged.push(name);
        }

        manifest.write(&self.paths.manifest(), self.config.fsync)?;
        info!(
            target: "strataconf::cache",
            restored = report.restored.len(),
            purged = report.purged.len(),
            "Snapshot cache loaded"
        );
        Ok(report)
    }

    fn load_entry(&self, ctx: &AppContext, name: &str, entry: &ManifestEntry) -> Result<()> {
        if !is_plain_file_name(&entry.filename) {
            return Err(CacheError::Manifest {
                path: self.paths.manifest(),
                message: format!("blob name '{}' leaves the cache directory", entry.filename),
            });
        }

        let bytes = std::fs::read(self.paths.blob(&entry.filename))?;
        let actual = self.hash_bytes(&bytes);
        if !actual.eq_ignore_ascii_case(&entry.hash_check) {
            return Err(CacheError::HashVerificationFailed {
                store: name.to_string(),
                expected: entry.hash_check.clone(),
                actual,
            });
        }

        let store = resolve(ctx, name)?;
        store.restore(&mut bytes.as_slice())?;
        debug!(target: "strataconf::cache", store = name, fields = store.len(), "Restored store");
        Ok(())
    }

    fn reset(&self) -> Result<()> {
        let settings = self.paths.config();
        let had_settings = settings.exists();
        self.paths.reset()?;
        if had_settings {
            self.config.write_to_file(&settings)?;
        }
        Ok(())
    }
}

/// Store a manifest entry refers to: a Dump Registry member of that name, or
/// failing that a registered kind with that type identity.
fn resolve(ctx: &AppContext, name: &str) -> Result<Arc<ConfigStore>> {
    if name == Dump::TYPE_NAME {
        return Ok(Arc::clone(ctx.dump_registry()));
    }
    if let Some((_, store)) = ctx.persisted().into_iter().find(|(n, _)| n == name) {
        return Ok(store);
    }
    Ok(ctx.stores().instance_by_name(name)?)
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && Path::new(name)
            .file_name()
            .map_or(false, |f| f == std::ffi::OsStr::new(name))
}
