//! Configuration schema for watchstore
//!
//! Configuration is stored in `watchstore.toml` at the project root.

use crate::store::Propagation;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory all relative paths are anchored to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<PathBuf>,

    /// Globs (relative to base) excluded from loading and watching
    pub skip: Vec<String>,

    /// Globs that override `skip`
    pub skip_except: Vec<String>,

    /// How far a change travels through dependents
    pub propagation: Propagation,

    /// General settings
    pub general: GeneralConfig,

    /// Watcher settings; absent disables watching
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watch: Option<WatchConfig>,

    /// Ordered transform specs
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub transpile: Vec<TranspileConfig>,
}

impl Config {
    /// Base directory, with a relative `base` resolved against `root`
    pub fn resolved_base(&self, root: &Path) -> PathBuf {
        match &self.base {
            Some(base) if base.is_absolute() => base.clone(),
            Some(base) => root.join(base),
            None => root.to_path_buf(),
        }
    }
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// File watcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Window in which raw events are collected into one batch
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: 50 }
    }
}

/// One transform spec backed by an external command
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TranspileConfig {
    /// Name shown in debug logs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Path tests: glob, or regex when no glob matches
    pub test: Vec<String>,

    /// Program and arguments; source on stdin, output on stdout
    pub command: Vec<String>,

    /// Content type of the output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Pass store contents to the transform
    pub cache: bool,

    /// Exposed to the command as `WATCHSTORE_OPTIONS`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<serde_json::Value>,
}
