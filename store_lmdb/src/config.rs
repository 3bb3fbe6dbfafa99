//! Store configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::LmdbError;

/// Configuration for the LMDB store.
///
/// Can be loaded from a TOML file via [`StoreConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the LMDB data files. Created if missing.
    #[serde(default = "default_path")]
    pub path: PathBuf,

    /// Maximum size of the memory map in bytes. Writes past this fail with
    /// a retryable busy error until the map is grown.
    #[serde(default = "default_map_size")]
    pub map_size: usize,

    /// Maximum number of simultaneous reader slots.
    #[serde(default = "default_max_readers")]
    pub max_readers: u32,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_path() -> PathBuf {
    PathBuf::from("./teller_data")
}

fn default_map_size() -> usize {
    256 * 1024 * 1024
}

fn default_max_readers() -> u32 {
    126
}

// ── Impl ───────────────────────────────────────────────────────────────

impl StoreConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, LmdbError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| LmdbError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, LmdbError> {
        toml::from_str(s).map_err(|e| LmdbError::Config(e.to_string()))
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            map_size: default_map_size(),
            max_readers: default_max_readers(),
        }
    }
}
