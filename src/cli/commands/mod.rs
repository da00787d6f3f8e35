//! CLI command implementations

pub mod config;
pub mod get;
pub mod watch;

pub use config::execute as config;
pub use get::execute as get;
pub use watch::execute as watch;

use std::path::{Path, PathBuf};

/// Anchor a command-line path at the working directory
///
/// Absolute paths are kept so URL-style `/name` paths still resolve
/// against the configured base.
pub(crate) fn from_cwd(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let joined = std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf());
    std::fs::canonicalize(&joined).unwrap_or(joined)
}
