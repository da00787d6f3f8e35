//! Watchstore - file cache with pluggable transforms and change propagation
//!
//! Files are loaded on first request, optionally run through a transform
//! plugin, and kept in memory. A watcher reports changes; changed files and
//! the files that declared them as dependencies are reloaded together and
//! reported to change listeners.

pub mod cli;
pub mod config;
pub mod error;
pub mod loader;
pub mod mime;
pub mod paths;
pub mod pattern;
pub mod store;
pub mod transform;
pub mod watch_store;
pub mod watcher;

pub use error::{WatchStoreError, WatchStoreResult};
pub use pattern::{Pattern, PatternSet};
pub use store::{FileData, FileEntry, Propagation};
pub use transform::{TransformSpec, TransformTest};
pub use watch_store::{ChangeListener, WatchStore, WatchStoreOptions};
pub use watcher::{FsWatcher, ManualWatcher, Watcher};
