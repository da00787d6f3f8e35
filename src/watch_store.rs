//! The watch store: load-on-demand file cache with transforms and invalidation
//!
//! A [`WatchStore`] answers `get_file` from its [`EntryStore`], loading and
//! transforming files the first time they are asked for. When a watcher is
//! attached, every tracked file and every dependency a transform reports is
//! handed to it; change batches are expanded through the dependency index,
//! reloaded together and reported to change listeners as one list.

use crate::config::Config;
use crate::error::{WatchStoreError, WatchStoreResult};
use crate::loader;
use crate::mime;
use crate::paths;
use crate::pattern::PatternSet;
use crate::store::{EntryStore, FileData, FileEntry, Propagation, StoreWrite, WriteOutcome};
use crate::transform::{
    self, dispatch, CommandTransform, InputMode, TransformContext, TransformInput, TransformSpec,
    TransformTest,
};
use crate::watcher::{FsWatcher, Watcher};
use futures_util::future::join_all;
use parking_lot::Mutex;
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Receives every successfully reloaded batch
pub type ChangeListener = Arc<dyn Fn(&[FileEntry]) + Send + Sync>;

/// Programmatic configuration of a [`WatchStore`]
#[derive(Clone, Default)]
pub struct WatchStoreOptions {
    /// Anchor for relative paths and for skip matching
    pub base: Option<PathBuf>,
    pub skip: PatternSet,
    /// Overrides `skip`
    pub skip_except: PatternSet,
    /// Tried in order; the first match is applied
    pub transpile: Vec<TransformSpec>,
    pub propagation: Propagation,
    /// Without a watcher the store only loads on demand
    pub watcher: Option<Arc<dyn Watcher>>,
}

impl fmt::Debug for WatchStoreOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchStoreOptions")
            .field("base", &self.base)
            .field("skip", &self.skip)
            .field("skip_except", &self.skip_except)
            .field("transpile", &self.transpile)
            .field("propagation", &self.propagation)
            .field("watcher", &self.watcher.is_some())
            .finish_non_exhaustive()
    }
}

impl WatchStoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn with_skip(mut self, skip: PatternSet) -> Self {
        self.skip = skip;
        self
    }

    pub fn with_skip_except(mut self, skip_except: PatternSet) -> Self {
        self.skip_except = skip_except;
        self
    }

    pub fn with_transform(mut self, spec: TransformSpec) -> Self {
        self.transpile.push(spec);
        self
    }

    pub fn with_propagation(mut self, propagation: Propagation) -> Self {
        self.propagation = propagation;
        self
    }

    pub fn with_watcher(mut self, watcher: Arc<dyn Watcher>) -> Self {
        self.watcher = Some(watcher);
        self
    }

    /// Options described by a config file whose directory is `root`
    ///
    /// A `[watch]` section attaches an [`FsWatcher`]; each `[[transpile]]`
    /// entry becomes a [`CommandTransform`].
    pub fn from_config(config: &Config, root: &Path) -> WatchStoreResult<Self> {
        let mut transpile = Vec::with_capacity(config.transpile.len());
        for (i, entry) in config.transpile.iter().enumerate() {
            let plugin = CommandTransform::from_argv(&entry.command).ok_or_else(|| {
                WatchStoreError::ConfigInvalid {
                    path: root.join(crate::config::CONFIG_FILE_NAME),
                    reason: format!("transpile entry {} has an empty command", i + 1),
                }
            })?;
            let tests: Vec<TransformTest> =
                entry.test.iter().map(|t| TransformTest::pattern(t)).collect();
            if tests.is_empty() {
                return Err(WatchStoreError::ConfigInvalid {
                    path: root.join(crate::config::CONFIG_FILE_NAME),
                    reason: format!("transpile entry {} has no test", i + 1),
                });
            }

            transpile.push(TransformSpec {
                test: tests,
                plugin: Arc::new(plugin),
                options: entry.options.clone(),
                content_type: entry.content_type.clone(),
                cache: entry.cache,
                name: entry.name.clone(),
            });
        }

        let watcher = config.watch.as_ref().map(|w| {
            Arc::new(FsWatcher::new(Duration::from_millis(w.debounce_ms))) as Arc<dyn Watcher>
        });

        Ok(Self {
            base: Some(paths::normalize(&config.resolved_base(root))),
            skip: PatternSet::from_globs(&config.skip)?,
            skip_except: PatternSet::from_globs(&config.skip_except)?,
            transpile,
            propagation: config.propagation,
            watcher,
        })
    }
}

struct Inner {
    options: WatchStoreOptions,
    store: EntryStore,
    listeners: Mutex<Vec<ChangeListener>>,
    batch_task: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(task) = self.batch_task.get_mut().take() {
            task.abort();
        }
    }
}

/// Cheaply cloneable handle to one store
#[derive(Clone)]
pub struct WatchStore {
    inner: Arc<Inner>,
}

impl WatchStore {
    /// A relative base is anchored at the working directory
    pub fn new(mut options: WatchStoreOptions) -> Self {
        options.base = options.base.map(|base| paths::absolute(&base));
        Self {
            inner: Arc::new(Inner {
                options,
                store: EntryStore::new(),
                listeners: Mutex::new(Vec::new()),
                batch_task: Mutex::new(None),
            }),
        }
    }

    fn watcher(&self) -> Option<&Arc<dyn Watcher>> {
        self.inner.options.watcher.as_ref()
    }

    pub fn options(&self) -> &WatchStoreOptions {
        &self.inner.options
    }

    /// Map a requested path onto the filesystem
    ///
    /// With a base, absolute paths already inside it are kept; any other
    /// leading `/` is URL-style and the path is taken relative to the base.
    pub fn resolve_base(&self, file: &Path) -> PathBuf {
        let Some(base) = &self.inner.options.base else {
            return paths::absolute(file);
        };
        if file.is_absolute() && file.starts_with(base) {
            return paths::normalize(file);
        }
        let relative = file.strip_prefix("/").unwrap_or(file);
        paths::normalize(&base.join(relative))
    }

    /// `path` relative to the base, `/`-separated
    pub fn relative_base(&self, path: &Path) -> String {
        match &self.inner.options.base {
            Some(base) => paths::relative_to(path, base),
            None => paths::to_slashes(&path.to_string_lossy()),
        }
    }

    /// True when `path` matches `skip` and not `skip_except`
    pub fn should_skip_watch(&self, path: &Path) -> bool {
        let relative = self.relative_base(path);
        let options = &self.inner.options;
        options.skip.matches(&relative) && !options.skip_except.matches(&relative)
    }

    /// Transform specs matching `path`, in order; only the first is applied
    pub fn get_transpilers(&self, path: &Path) -> Vec<&TransformSpec> {
        transform::get_transpilers(&self.inner.options.transpile, path)
    }

    /// Entry for `path`, loading it on a miss
    ///
    /// `None` when the path is skipped or the file does not exist.
    pub async fn get_file(&self, path: impl AsRef<Path>) -> WatchStoreResult<Option<FileEntry>> {
        let path = self.resolve_base(path.as_ref());
        if self.should_skip_watch(&path) {
            debug!("Skipping {}", path.display());
            return Ok(None);
        }
        if let Some(entry) = self.inner.store.get(&path) {
            return Ok(Some(entry));
        }

        self.add_file(&path).await?;
        Ok(self.inner.store.mark_requested(&path))
    }

    /// Transformed content of `path` if it has any, else its raw content
    pub async fn get_file_data(&self, path: impl AsRef<Path>) -> WatchStoreResult<Option<FileData>> {
        Ok(self.get_file(path).await?.and_then(|entry| entry.data()))
    }

    /// Content of an already cached path; never loads
    pub fn get_cached_data(&self, path: &Path) -> Option<FileData> {
        self.inner.store.get(path).and_then(|entry| entry.data())
    }

    /// Cached content of the first watched path matching `pattern`
    pub fn get_cached_data_matching(&self, pattern: &Regex) -> Option<FileData> {
        self.get_watched()
            .into_iter()
            .find(|p| pattern.is_match(&paths::to_slashes(&p.to_string_lossy())))
            .and_then(|p| self.get_cached_data(&p))
    }

    /// (Re)load `path` into the store, transforming it when a spec matches
    ///
    /// Returns the new entry, or `None` when the content was unchanged or the
    /// file could not be found.
    pub async fn add_file(&self, path: &Path) -> WatchStoreResult<Option<FileEntry>> {
        let outcome = match self.add_with_transpile(path).await {
            Ok(Some(outcome)) => Ok(outcome),
            Ok(None) => loader::read_file_correctly(path)
                .await
                .map(|data| self.add_to_store(path, StoreWrite::raw(data))),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(outcome) => Ok(outcome.into_entry()),
            Err(e) if e.is_not_found() => {
                log_missing(path, &e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Run the first matching transform over `path`; `Ok(None)` when none matches
    async fn add_with_transpile(&self, path: &Path) -> WatchStoreResult<Option<WriteOutcome>> {
        let Some(spec) = transform::select(&self.inner.options.transpile, path).cloned() else {
            return Ok(None);
        };

        let (input, raw) = match spec.plugin.input_mode() {
            InputMode::Content => {
                let data = loader::read_file_correctly(path).await?;
                let source = match &data {
                    FileData::Text(text) => text.to_string(),
                    FileData::Binary(bytes) => String::from_utf8_lossy(bytes).into_owned(),
                };
                (TransformInput::Source(source), Some(data))
            }
            InputMode::File => (TransformInput::File(path.to_path_buf()), None),
        };

        let ctx = TransformContext {
            path: path.to_path_buf(),
            options: spec.options.clone(),
            cached: spec.cache.then(|| Arc::new(self.inner.store.snapshot())),
        };

        let output = dispatch::invoke(&spec, input, ctx).await?;

        let content_type = output
            .content_type
            .or_else(|| spec.content_type.clone())
            .unwrap_or_else(|| mime::content_type_for(path).to_string());
        let dependencies: Vec<PathBuf> = output
            .dependencies
            .iter()
            .map(|dep| resolve_dependency(path, dep))
            .collect();

        let outcome = self.add_to_store(
            path,
            StoreWrite {
                raw,
                transpiled: Some(output.data.into()),
                content_type: Some(content_type),
            },
        );
        self.modify_deps(path, &dependencies);

        // report the entry with its new dependency list
        let outcome = match outcome {
            WriteOutcome::Written(entry) => {
                WriteOutcome::Written(self.inner.store.get(path).unwrap_or(entry))
            }
            WriteOutcome::Unchanged => WriteOutcome::Unchanged,
        };
        Ok(Some(outcome))
    }

    /// Write one entry; a new entry is handed to the watcher
    fn add_to_store(&self, path: &Path, write: StoreWrite) -> WriteOutcome {
        let content_type = write
            .content_type
            .clone()
            .unwrap_or_else(|| mime::content_type_for(path).to_string());
        let relative = self.relative_base(path);

        let outcome = self.inner.store.write(path, relative, content_type, write);
        match &outcome {
            WriteOutcome::Written(_) => {
                if let Some(watcher) = self.watcher() {
                    watcher.add(path);
                }
            }
            WriteOutcome::Unchanged => {
                warn!("Content unchanged for {}, skipping store write", path.display());
            }
        }
        outcome
    }

    /// Replace the dependency list of `path` and watch the new dependencies
    pub fn modify_deps(&self, path: &Path, dependencies: &[PathBuf]) {
        let linked = self.inner.store.modify_deps(path, dependencies);
        let Some(watcher) = self.watcher() else {
            return;
        };
        for dep in linked {
            if !self.should_skip_watch(&dep) {
                watcher.add(&dep);
            }
        }
    }

    /// Drop the entry for `path`; reloads never call this
    pub fn remove_from_store(&self, path: &Path) -> Option<FileEntry> {
        self.inner.store.remove(path)
    }

    pub fn entry(&self, path: &Path) -> Option<FileEntry> {
        self.inner.store.get(path)
    }

    /// Entries that declared `path` as a dependency, sorted
    pub fn dependents_of(&self, path: &Path) -> Vec<PathBuf> {
        self.inner.store.dependents_of(path)
    }

    pub fn len(&self) -> usize {
        self.inner.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.store.is_empty()
    }

    pub fn on_change(&self, listener: ChangeListener) {
        let mut listeners = self.inner.listeners.lock();
        if !listeners.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            listeners.push(listener);
        }
    }

    pub fn off_change(&self, listener: &ChangeListener) {
        self.inner
            .listeners
            .lock()
            .retain(|l| !Arc::ptr_eq(l, listener));
    }

    /// Reload a batch of changed paths plus their dependents
    ///
    /// On success the reloaded entries are reported to every listener. A
    /// failing reload fails the whole batch and nothing is reported; the
    /// other reloads still run to completion.
    pub async fn process_changes(&self, changed: &[PathBuf]) -> WatchStoreResult<Vec<FileEntry>> {
        let working = self
            .inner
            .store
            .expand(changed, self.inner.options.propagation);
        if working.is_empty() {
            return Ok(Vec::new());
        }
        debug!("Reloading {} files for {} changes", working.len(), changed.len());

        let results = join_all(working.iter().map(|path| self.add_file(path))).await;
        let mut entries = Vec::with_capacity(results.len());
        for result in results {
            if let Some(entry) = result? {
                entries.push(entry);
            }
        }

        if !entries.is_empty() {
            self.notify(&entries);
        }
        Ok(entries)
    }

    fn notify(&self, entries: &[FileEntry]) {
        let listeners = self.inner.listeners.lock().clone();
        for listener in listeners {
            listener(entries);
        }
    }

    /// Begin reacting to watcher batches; a no-op without a watcher
    pub fn start(&self) -> WatchStoreResult<()> {
        let Some(watcher) = self.watcher() else {
            return Ok(());
        };

        {
            let mut task = self.inner.batch_task.lock();
            if task.is_none() {
                let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
                    WatchStoreError::Watcher("starting requires a tokio runtime".into())
                })?;
                let (tx, rx) = mpsc::unbounded_channel();
                watcher.on_change(tx);
                *task = Some(runtime.spawn(batch_loop(Arc::downgrade(&self.inner), rx)));
            }
        }

        watcher.start()
    }

    /// Stop reporting batches; in-flight reloads finish
    pub fn pause(&self) {
        if let Some(watcher) = self.watcher() {
            watcher.pause();
        }
    }

    /// Forget everything and stop watching; a no-op without a watcher
    pub fn stop(&self) {
        let Some(watcher) = self.watcher() else {
            return;
        };
        self.inner.store.clear();
        watcher.stop();
        if let Some(task) = self.inner.batch_task.lock().take() {
            task.abort();
        }
        debug!("Watch store stopped");
    }

    /// Paths handed to the watcher, sorted
    pub fn get_watched(&self) -> Vec<PathBuf> {
        self.watcher().map(|w| w.watched()).unwrap_or_default()
    }
}

async fn batch_loop(inner: Weak<Inner>, mut rx: mpsc::UnboundedReceiver<Vec<PathBuf>>) {
    while let Some(batch) = rx.recv().await {
        let Some(inner) = inner.upgrade() else {
            break;
        };
        let store = WatchStore { inner };
        if let Err(e) = store.process_changes(&batch).await {
            error!("Watch batch failed: {}", e);
        }
    }
}

/// Dependencies are resolved against the directory of the file reporting them
fn resolve_dependency(file: &Path, dep: &str) -> PathBuf {
    let dep = Path::new(dep);
    if dep.is_absolute() {
        return paths::normalize(dep);
    }
    let dir = file.parent().unwrap_or_else(|| Path::new(""));
    paths::normalize(&dir.join(dep))
}

fn log_missing(path: &Path, err: &WatchStoreError) {
    let probe = path.extension().is_none()
        || path.file_name().is_some_and(|name| name == "favicon.ico");
    if probe {
        debug!("Could not find {}: {}", path.display(), err);
    } else {
        warn!("Could not find {}: {}", path.display(), err);
    }
}
