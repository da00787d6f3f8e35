//! Native filesystem watcher with batch debouncing
//!
//! Tracked files are observed through their parent directories so editors
//! that save by rename keep producing events. Raw events are collected for
//! the debounce window, reduced to tracked paths, and emitted as one batch.

use super::{BatchSender, WatchRegistry, Watcher, WatcherState};
use crate::error::{WatchStoreError, WatchStoreResult};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as _};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Default debounce window
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(50);

struct Active {
    notifier: RecommendedWatcher,
    dirs: HashSet<PathBuf>,
    task: JoinHandle<()>,
}

impl Active {
    fn watch_parent(&mut self, path: &Path) {
        let Some(dir) = path.parent() else {
            return;
        };
        if self.dirs.contains(dir) {
            return;
        }
        match self.notifier.watch(dir, RecursiveMode::NonRecursive) {
            Ok(()) => {
                debug!("Watching directory {}", dir.display());
                self.dirs.insert(dir.to_path_buf());
            }
            Err(e) => warn!("Could not watch {}: {}", dir.display(), e),
        }
    }
}

/// Watcher backed by `notify`
pub struct FsWatcher {
    registry: Arc<WatchRegistry>,
    active: Mutex<Option<Active>>,
    debounce: Duration,
}

impl FsWatcher {
    pub fn new(debounce: Duration) -> Self {
        Self {
            registry: Arc::new(WatchRegistry::default()),
            active: Mutex::new(None),
            debounce,
        }
    }

    pub fn state(&self) -> WatcherState {
        self.registry.state()
    }

    fn activate(&self) -> WatchStoreResult<Active> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| WatchStoreError::Watcher("starting requires a tokio runtime".into()))?;

        let (tx, rx) = mpsc::unbounded_channel();
        let notifier = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if is_content_change(&event.kind) => {
                    for path in event.paths {
                        let _ = tx.send(path);
                    }
                }
                Ok(_) => {}
                Err(e) => warn!("Watch error: {}", e),
            },
            notify::Config::default(),
        )?;

        let task = runtime.spawn(debounce_loop(rx, self.registry.clone(), self.debounce));
        let mut active = Active {
            notifier,
            dirs: HashSet::new(),
            task,
        };
        for path in self.registry.watched() {
            active.watch_parent(&path);
        }
        Ok(active)
    }
}

impl Default for FsWatcher {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl Watcher for FsWatcher {
    fn on_change(&self, sink: BatchSender) {
        self.registry.subscribe(sink);
    }

    fn start(&self) -> WatchStoreResult<()> {
        let mut active = self.active.lock();
        if active.is_none() {
            *active = Some(self.activate()?);
        }
        self.registry.set_state(WatcherState::Running);
        debug!("File watcher started");
        Ok(())
    }

    fn pause(&self) {
        if self.registry.state() == WatcherState::Running {
            self.registry.set_state(WatcherState::Paused);
            debug!("File watcher paused");
        }
    }

    fn stop(&self) {
        if let Some(active) = self.active.lock().take() {
            active.task.abort();
        }
        self.registry.set_state(WatcherState::Stopped);
        self.registry.clear();
        debug!("File watcher stopped");
    }

    fn add(&self, path: &Path) {
        if !self.registry.track(path) {
            return;
        }
        if let Some(active) = self.active.lock().as_mut() {
            active.watch_parent(path);
        }
    }

    fn watched(&self) -> Vec<PathBuf> {
        self.registry.watched()
    }
}

fn is_content_change(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

async fn debounce_loop(
    mut rx: mpsc::UnboundedReceiver<PathBuf>,
    registry: Arc<WatchRegistry>,
    debounce: Duration,
) {
    while let Some(first) = rx.recv().await {
        let mut batch = vec![first];
        let deadline = tokio::time::sleep(debounce);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => break,
                next = rx.recv() => match next {
                    Some(path) => {
                        if !batch.contains(&path) {
                            batch.push(path);
                        }
                    }
                    None => break,
                },
            }
        }

        batch.retain(|p| registry.is_watched(p));
        if !batch.is_empty() {
            debug!("Emitting batch of {} changed files", batch.len());
            registry.emit(batch);
        }
    }
}
