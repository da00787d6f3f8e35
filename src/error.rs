//! Error types for watchstore
//!
//! All modules use `WatchStoreResult<T>` as their return type.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for watchstore operations
pub type WatchStoreResult<T> = Result<T, WatchStoreError>;

/// All errors that can occur in watchstore
#[derive(Error, Debug)]
pub enum WatchStoreError {
    // File loading errors
    #[error("Cannot stat {path}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File is directory: {0}")]
    IsDirectory(PathBuf),

    #[error("File not found or skipped: {0}")]
    Unavailable(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Transform errors
    #[error("Transform of {path} failed: {message}")]
    Transform { path: PathBuf, message: String },

    // Pattern errors
    #[error("Invalid pattern {pattern}: {reason}")]
    Pattern { pattern: String, reason: String },

    // Watcher errors
    #[error("Watcher error: {0}")]
    Watcher(String),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl WatchStoreError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a transform error for a path
    pub fn transform(path: &Path, message: impl Into<String>) -> Self {
        Self::Transform {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    /// Whether the error means the file is missing or inaccessible
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Stat { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ConfigNotFound(_) => Some("Run: watchstore config init"),
            Self::IsDirectory(_) => Some("Pass a file path, not a directory"),
            Self::Unavailable(_) => Some("Check the path and the skip patterns in watchstore.toml"),
            Self::Watcher(_) => Some("Remove the [watch] section to run without watching"),
            _ => None,
        }
    }
}

impl From<notify::Error> for WatchStoreError {
    fn from(err: notify::Error) -> Self {
        Self::Watcher(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = WatchStoreError::IsDirectory(PathBuf::from("/proj/src"));
        assert_eq!(err.to_string(), "File is directory: /proj/src");
    }

    #[test]
    fn error_hint() {
        let err = WatchStoreError::ConfigNotFound(PathBuf::from("watchstore.toml"));
        assert_eq!(err.hint(), Some("Run: watchstore config init"));
    }

    #[test]
    fn stat_is_not_found() {
        let err = WatchStoreError::Stat {
            path: PathBuf::from("/missing"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.is_not_found());
        assert!(!WatchStoreError::IsDirectory(PathBuf::from("/d")).is_not_found());
    }

    #[test]
    fn transform_error_names_path() {
        let err = WatchStoreError::transform(Path::new("/proj/app.ts"), "unexpected token");
        assert!(err.to_string().contains("/proj/app.ts"));
        assert!(err.to_string().contains("unexpected token"));
    }
}
