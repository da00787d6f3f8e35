//! Watcher driven by explicit calls

use super::{BatchSender, WatchRegistry, Watcher, WatcherState};
use crate::error::WatchStoreResult;
use std::path::{Path, PathBuf};

/// Watcher whose batches are pushed with [`ManualWatcher::emit`]
///
/// Useful when change detection lives elsewhere (a build tool, an editor
/// integration) and in tests.
#[derive(Debug, Default)]
pub struct ManualWatcher {
    registry: WatchRegistry,
}

impl ManualWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a batch; dropped unless the watcher is running
    pub fn emit<I, P>(&self, paths: I) -> bool
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.registry
            .emit(paths.into_iter().map(Into::into).collect())
    }

    pub fn state(&self) -> WatcherState {
        self.registry.state()
    }

    pub fn is_watching(&self, path: &Path) -> bool {
        self.registry.is_watched(path)
    }
}

impl Watcher for ManualWatcher {
    fn on_change(&self, sink: BatchSender) {
        self.registry.subscribe(sink);
    }

    fn start(&self) -> WatchStoreResult<()> {
        self.registry.set_state(WatcherState::Running);
        Ok(())
    }

    fn pause(&self) {
        self.registry.set_state(WatcherState::Paused);
    }

    fn stop(&self) {
        self.registry.set_state(WatcherState::Stopped);
        self.registry.clear();
    }

    fn add(&self, path: &Path) {
        self.registry.track(path);
    }

    fn watched(&self) -> Vec<PathBuf> {
        self.registry.watched()
    }
}
