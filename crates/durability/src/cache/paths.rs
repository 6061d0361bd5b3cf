//! Cache directory structure
//!
//! The snapshot cache is one flat directory:
//!
//! ```text
//! cache/
//! ├── info.json              # Manifest: store name -> {filename, hash_check}
//! ├── cache.toml             # Optional cache settings
//! ├── Dump_1083722934455.bin # One blob per persisted store
//! └── Folder_52331904117.bin
//! ```

use std::path::{Path, PathBuf};

/// Manifest file name inside the cache directory
pub const MANIFEST_FILE_NAME: &str = "info.json";

/// Settings file name inside the cache directory
pub const CONFIG_FILE_NAME: &str = "cache.toml";

/// Cache directory paths
#[derive(Debug, Clone)]
pub struct CachePaths {
    root: PathBuf,
}

impl CachePaths {
    /// Create paths from root directory
    pub fn from_root(root: impl AsRef<Path>) -> Self {
        CachePaths {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Get the cache directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the manifest path
    pub fn manifest(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE_NAME)
    }

    /// Get the settings file path
    pub fn config(&self) -> PathBuf {
        self.root.join(CONFIG_FILE_NAME)
    }

    /// Get the path of a blob by file name
    pub fn blob(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }

    /// Create the cache directory if needed
    pub fn create_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)
    }

    /// Delete the cache directory with everything in it and recreate it empty
    pub fn reset(&self) -> std::io::Result<()> {
        match std::fs::remove_dir_all(&self.root) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        std::fs::create_dir_all(&self.root)
    }
}
