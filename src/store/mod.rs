//! Entry store and reverse dependency index
//!
//! Both maps live behind one mutex and are only reachable through
//! [`EntryStore`], so every write keeps them consistent:
//!
//! - an entry listing dependency `d` is a member of `d`'s dependent set
//! - replacing a dependency list drops the edges that are no longer listed
//! - entries are replaced wholesale, never evicted implicitly

pub mod entry;
pub mod index;
pub mod propagation;

pub use entry::{FileData, FileEntry, StoreWrite, WriteOutcome};
pub use index::DependencyIndex;
pub use propagation::Propagation;

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
struct Maps {
    entries: HashMap<PathBuf, FileEntry>,
    index: DependencyIndex,
}

/// Owner of the path -> entry map and the dependency index
#[derive(Debug)]
pub struct EntryStore {
    maps: Mutex<Maps>,
    cache_enabled: bool,
}

impl EntryStore {
    pub fn new() -> Self {
        Self {
            maps: Mutex::new(Maps::default()),
            cache_enabled: true,
        }
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache_enabled
    }

    pub fn get(&self, path: &Path) -> Option<FileEntry> {
        self.maps.lock().entries.get(path).cloned()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.maps.lock().entries.contains_key(path)
    }

    /// Write content for `path`, replacing any prior entry
    ///
    /// Returns `Unchanged` without touching the store when caching is enabled
    /// and the prior entry holds the same raw and transpiled content. The
    /// `requested` flag and dependency list of a replaced entry carry over.
    pub fn write(
        &self,
        path: &Path,
        relative_path: String,
        content_type: String,
        write: StoreWrite,
    ) -> WriteOutcome {
        let mut maps = self.maps.lock();
        let prior = maps.entries.get(path);

        if self.cache_enabled {
            if let Some(prior) = prior {
                if prior.raw_data == write.raw && prior.transpiled_data == write.transpiled {
                    return WriteOutcome::Unchanged;
                }
            }
        }

        let (requested, dependencies) = prior
            .map(|p| (p.requested, p.dependencies.clone()))
            .unwrap_or_default();

        let entry = FileEntry {
            path: path.to_path_buf(),
            relative_path,
            content_type,
            raw_data: if self.cache_enabled { write.raw } else { None },
            transpiled_data: write.transpiled,
            dependencies,
            requested,
        };
        maps.entries.insert(path.to_path_buf(), entry.clone());
        WriteOutcome::Written(entry)
    }

    /// Replace the dependency list of `path` and update the reverse index
    ///
    /// An empty list is a no-op. Returns the dependencies that are now linked,
    /// so the caller can start watching them.
    pub fn modify_deps(&self, path: &Path, dependencies: &[PathBuf]) -> Vec<PathBuf> {
        if dependencies.is_empty() {
            return Vec::new();
        }

        let mut maps = self.maps.lock();
        let Maps { entries, index } = &mut *maps;

        for dep in dependencies {
            index.link(dep, path);
        }

        let Some(entry) = entries.get_mut(path) else {
            return dependencies.to_vec();
        };

        let listed: HashSet<&PathBuf> = dependencies.iter().collect();
        for old in entry.dependencies.iter().filter(|d| !listed.contains(d)) {
            index.unlink(old, path);
        }
        entry.dependencies = dependencies.to_vec();

        dependencies.to_vec()
    }

    /// Set the `requested` flag and return the updated entry
    pub fn mark_requested(&self, path: &Path) -> Option<FileEntry> {
        let mut maps = self.maps.lock();
        let entry = maps.entries.get_mut(path)?;
        entry.requested = true;
        Some(entry.clone())
    }

    /// Direct dependents of `path`, sorted
    pub fn dependents_of(&self, path: &Path) -> Vec<PathBuf> {
        self.maps.lock().index.dependents_of(path).cloned().collect()
    }

    /// Paths that must reload when `changed` paths change
    pub fn expand(&self, changed: &[PathBuf], propagation: Propagation) -> Vec<PathBuf> {
        let maps = self.maps.lock();
        propagation.expand(changed, &maps.entries, &maps.index)
    }

    /// Raw content of every entry that has some
    pub fn snapshot(&self) -> HashMap<PathBuf, FileData> {
        self.maps
            .lock()
            .entries
            .iter()
            .filter_map(|(path, e)| e.raw_data.clone().map(|d| (path.clone(), d)))
            .collect()
    }

    pub fn remove(&self, path: &Path) -> Option<FileEntry> {
        self.maps.lock().entries.remove(path)
    }

    /// Drop every entry and dependency edge
    pub fn clear(&self) {
        let mut maps = self.maps.lock();
        maps.entries.clear();
        maps.index.clear();
    }

    pub fn len(&self) -> usize {
        self.maps.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn index_len(&self) -> usize {
        self.maps.lock().index.len()
    }
}

impl Default for EntryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_text(store: &EntryStore, path: &str, text: &str) -> WriteOutcome {
        store.write(
            Path::new(path),
            path.trim_start_matches('/').to_string(),
            "text/plain".to_string(),
            StoreWrite::raw(FileData::text(text)),
        )
    }

    fn paths(list: &[&str]) -> Vec<PathBuf> {
        list.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn identical_write_is_unchanged() {
        let store = EntryStore::new();
        assert!(matches!(write_text(&store, "/p/a.txt", "hi"), WriteOutcome::Written(_)));
        assert_eq!(write_text(&store, "/p/a.txt", "hi"), WriteOutcome::Unchanged);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn different_content_replaces_entry() {
        let store = EntryStore::new();
        write_text(&store, "/p/a.txt", "one");
        let outcome = write_text(&store, "/p/a.txt", "two");

        let entry = outcome.into_entry().unwrap();
        assert_eq!(entry.raw_data, Some(FileData::text("two")));
        assert_eq!(store.get(Path::new("/p/a.txt")).unwrap(), entry);
    }

    #[test]
    fn same_source_new_output_is_written() {
        let store = EntryStore::new();
        let path = Path::new("/p/a.less");
        let write = |out: &str| StoreWrite {
            raw: Some(FileData::text("@import 'b';")),
            transpiled: Some(out.into()),
            content_type: None,
        };
        store.write(path, "a.less".into(), "text/css".into(), write("a{}"));
        let second = store.write(path, "a.less".into(), "text/css".into(), write("a{color:red}"));
        assert!(matches!(second, WriteOutcome::Written(_)));
    }

    #[test]
    fn modify_deps_replaces_edges() {
        let store = EntryStore::new();
        write_text(&store, "/p/f", "f");
        let f = Path::new("/p/f");

        store.modify_deps(f, &paths(&["/p/a", "/p/b"]));
        store.modify_deps(f, &paths(&["/p/b", "/p/c"]));

        assert!(store.dependents_of(Path::new("/p/a")).is_empty());
        assert_eq!(store.dependents_of(Path::new("/p/b")), paths(&["/p/f"]));
        assert_eq!(store.dependents_of(Path::new("/p/c")), paths(&["/p/f"]));
        assert_eq!(store.get(f).unwrap().dependencies, paths(&["/p/b", "/p/c"]));
    }

    #[test]
    fn modify_deps_leaves_other_dependents() {
        let store = EntryStore::new();
        write_text(&store, "/p/f", "f");
        write_text(&store, "/p/g", "g");

        store.modify_deps(Path::new("/p/f"), &paths(&["/p/a"]));
        store.modify_deps(Path::new("/p/g"), &paths(&["/p/a"]));
        store.modify_deps(Path::new("/p/f"), &paths(&["/p/z"]));

        assert_eq!(store.dependents_of(Path::new("/p/a")), paths(&["/p/g"]));
    }

    #[test]
    fn empty_deps_is_noop() {
        let store = EntryStore::new();
        write_text(&store, "/p/f", "f");
        store.modify_deps(Path::new("/p/f"), &paths(&["/p/a"]));

        assert!(store.modify_deps(Path::new("/p/f"), &[]).is_empty());
        assert_eq!(store.get(Path::new("/p/f")).unwrap().dependencies, paths(&["/p/a"]));
        assert_eq!(store.index_len(), 1);
    }

    #[test]
    fn rewrite_keeps_requested_and_deps() {
        let store = EntryStore::new();
        write_text(&store, "/p/f", "v1");
        store.modify_deps(Path::new("/p/f"), &paths(&["/p/a"]));
        store.mark_requested(Path::new("/p/f"));

        let entry = write_text(&store, "/p/f", "v2").into_entry().unwrap();
        assert!(entry.requested);
        assert_eq!(entry.dependencies, paths(&["/p/a"]));
    }

    #[test]
    fn clear_drops_entries_and_index() {
        let store = EntryStore::new();
        write_text(&store, "/p/f", "f");
        store.modify_deps(Path::new("/p/f"), &paths(&["/p/a"]));

        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.index_len(), 0);
    }

    #[test]
    fn remove_is_explicit() {
        let store = EntryStore::new();
        write_text(&store, "/p/f", "f");
        assert!(store.remove(Path::new("/p/f")).is_some());
        assert!(!store.contains(Path::new("/p/f")));
        assert!(store.remove(Path::new("/p/f")).is_none());
    }
}
