//! Cache configuration via `cache.toml`
//!
//! Settings are optional. On first use a commented default file can be
//! dropped into the cache directory; edit it and restart to change behavior.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CacheError, Result};

/// Snapshot cache settings loaded from `cache.toml`.
///
/// # Example
///
/// ```toml
/// blob_extension = "bin"
/// fsync = true
/// uppercase_hash = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Extension of blob files, without the dot
    #[serde(default = "default_blob_extension")]
    pub blob_extension: String,
    /// fsync blobs and the manifest before they are trusted
    #[serde(default = "default_true")]
    pub fsync: bool,
    /// Render hashes as uppercase hex
    #[serde(default = "default_true")]
    pub uppercase_hash: bool,
}

fn default_blob_extension() -> String {
    "bin".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            blob_extension: default_blob_extension(),
            fsync: true,
            uppercase_hash: true,
        }
    }
}

impl CacheConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Snapshot cache configuration
#
# Extension of blob files written next to info.json (default: "bin")
blob_extension = "bin"

# fsync each blob and the manifest before recording it (default: true)
# Turning this off is faster but a crash may leave a truncated blob,
# which the next load detects by hash and discards.
fsync = true

# Write SHA-256 hashes as uppercase hex (default: true)
# Verification compares case-insensitively either way.
uppercase_hash = true
"#
    }

    /// Read and parse config from a file path.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CacheError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config: CacheConfig = toml::from_str(&content).map_err(|e| CacheError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if config.blob_extension.is_empty() || config.blob_extension.contains(['/', '.']) {
            return Err(CacheError::Config {
                path: path.to_path_buf(),
                message: format!("invalid blob_extension '{}'", config.blob_extension),
            });
        }
        Ok(config)
    }

    /// Read config from `path`, or fall back to defaults if it does not exist.
    pub fn from_file_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| CacheError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }
}
