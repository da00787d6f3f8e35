//! Filesystem change notification
//!
//! The store only talks to the [`Watcher`] trait. Two implementations ship:
//!
//! | Watcher | Source of batches |
//! |---------|-------------------|
//! | [`FsWatcher`] | native notifications, debounced |
//! | [`ManualWatcher`] | pushed by the embedding program |

pub mod fs;
pub mod manual;

pub use fs::FsWatcher;
pub use manual::ManualWatcher;

use crate::error::WatchStoreResult;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Channel a watcher delivers changed-path batches on
pub type BatchSender = mpsc::UnboundedSender<Vec<PathBuf>>;

/// Watcher lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatcherState {
    #[default]
    Idle,
    Running,
    Paused,
    Stopped,
}

/// Source of changed-path batches
pub trait Watcher: Send + Sync {
    /// Deliver future batches to `sink`
    fn on_change(&self, sink: BatchSender);

    fn start(&self) -> WatchStoreResult<()>;

    /// Stop delivering batches; in-flight work is not cancelled
    fn pause(&self);

    fn stop(&self);

    /// Begin tracking `path`
    fn add(&self, path: &Path);

    /// Tracked paths, sorted
    fn watched(&self) -> Vec<PathBuf>;
}

/// Bookkeeping shared by the shipped watchers
#[derive(Debug, Default)]
pub(crate) struct WatchRegistry {
    state: Mutex<WatcherState>,
    sinks: Mutex<Vec<BatchSender>>,
    watched: Mutex<BTreeSet<PathBuf>>,
}

impl WatchRegistry {
    pub(crate) fn state(&self) -> WatcherState {
        *self.state.lock()
    }

    pub(crate) fn set_state(&self, state: WatcherState) {
        *self.state.lock() = state;
    }

    pub(crate) fn subscribe(&self, sink: BatchSender) {
        self.sinks.lock().push(sink);
    }

    /// Returns true if the path was not tracked yet
    pub(crate) fn track(&self, path: &Path) -> bool {
        self.watched.lock().insert(path.to_path_buf())
    }

    pub(crate) fn is_watched(&self, path: &Path) -> bool {
        self.watched.lock().contains(path)
    }

    pub(crate) fn watched(&self) -> Vec<PathBuf> {
        self.watched.lock().iter().cloned().collect()
    }

    pub(crate) fn clear(&self) {
        self.watched.lock().clear();
    }

    /// Send `batch` to every live sink while running
    pub(crate) fn emit(&self, batch: Vec<PathBuf>) -> bool {
        if self.state() != WatcherState::Running || batch.is_empty() {
            return false;
        }
        let mut sinks = self.sinks.lock();
        sinks.retain(|sink| sink.send(batch.clone()).is_ok());
        !sinks.is_empty()
    }
}
