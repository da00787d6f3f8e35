//! Expansion of a changed-path batch into the entries that must reload

use super::entry::FileEntry;
use super::index::DependencyIndex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;

/// How far a change travels through the dependency index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Propagation {
    /// Changed entries plus their direct dependents only
    #[default]
    OneHop,
    /// Changed entries plus every dependent reachable through the index
    Transitive,
}

impl Propagation {
    pub(crate) fn expand(
        self,
        changed: &[PathBuf],
        store: &HashMap<PathBuf, FileEntry>,
        index: &DependencyIndex,
    ) -> Vec<PathBuf> {
        match self {
            Self::OneHop => expand_one_hop(changed, store, index),
            Self::Transitive => expand_transitive(changed, store, index),
        }
    }
}

/// Keep changed paths that are stored and add their direct dependents
///
/// A dependent of a dependent is not included unless it is also a direct
/// dependent of one of the changed paths.
pub(crate) fn expand_one_hop(
    changed: &[PathBuf],
    store: &HashMap<PathBuf, FileEntry>,
    index: &DependencyIndex,
) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut working = Vec::new();

    for path in changed {
        if store.contains_key(path) && seen.insert(path.clone()) {
            working.push(path.clone());
        }
        for dependent in index.dependents_of(path) {
            if seen.insert(dependent.clone()) {
                working.push(dependent.clone());
            }
        }
    }

    working
}

/// Walk the reverse index breadth-first from every changed path
pub(crate) fn expand_transitive(
    changed: &[PathBuf],
    store: &HashMap<PathBuf, FileEntry>,
    index: &DependencyIndex,
) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut working = Vec::new();
    let mut queue = VecDeque::new();

    for path in changed {
        if store.contains_key(path) && seen.insert(path.clone()) {
            working.push(path.clone());
        }
        queue.push_back(path.clone());
    }

    let mut visited: HashSet<PathBuf> = changed.iter().cloned().collect();
    while let Some(path) = queue.pop_front() {
        for dependent in index.dependents_of(&path) {
            if seen.insert(dependent.clone()) {
                working.push(dependent.clone());
            }
            if visited.insert(dependent.clone()) {
                queue.push_back(dependent.clone());
            }
        }
    }

    working
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn entry(path: &str) -> (PathBuf, FileEntry) {
        let path = PathBuf::from(path);
        let entry = FileEntry {
            path: path.clone(),
            relative_path: path.display().to_string(),
            content_type: "text/plain".to_string(),
            raw_data: None,
            transpiled_data: None,
            dependencies: vec![],
            requested: false,
        };
        (path, entry)
    }

    // a <- b <- c : b depends on a, c depends on b
    fn chain() -> (HashMap<PathBuf, FileEntry>, DependencyIndex) {
        let store: HashMap<_, _> = ["/p/a", "/p/b", "/p/c"].into_iter().map(entry).collect();
        let mut index = DependencyIndex::new();
        index.link(Path::new("/p/a"), Path::new("/p/b"));
        index.link(Path::new("/p/b"), Path::new("/p/c"));
        (store, index)
    }

    #[test]
    fn one_hop_stops_at_direct_dependents() {
        let (store, index) = chain();
        let working = expand_one_hop(&[PathBuf::from("/p/a")], &store, &index);
        assert_eq!(working, vec![PathBuf::from("/p/a"), PathBuf::from("/p/b")]);
    }

    #[test]
    fn transitive_reaches_every_dependent() {
        let (store, index) = chain();
        let working = expand_transitive(&[PathBuf::from("/p/a")], &store, &index);
        assert_eq!(
            working,
            vec![
                PathBuf::from("/p/a"),
                PathBuf::from("/p/b"),
                PathBuf::from("/p/c")
            ]
        );
    }

    #[test]
    fn unstored_change_still_pulls_dependents() {
        let (mut store, index) = chain();
        store.remove(Path::new("/p/a"));
        let working = expand_one_hop(&[PathBuf::from("/p/a")], &store, &index);
        assert_eq!(working, vec![PathBuf::from("/p/b")]);
    }

    #[test]
    fn duplicates_are_collapsed() {
        let (store, index) = chain();
        let working = expand_one_hop(
            &[PathBuf::from("/p/b"), PathBuf::from("/p/a"), PathBuf::from("/p/b")],
            &store,
            &index,
        );
        assert_eq!(
            working,
            vec![
                PathBuf::from("/p/b"),
                PathBuf::from("/p/c"),
                PathBuf::from("/p/a")
            ]
        );
    }

    #[test]
    fn transitive_terminates_on_cycles() {
        let (store, mut index) = chain();
        index.link(Path::new("/p/c"), Path::new("/p/a"));
        let working = expand_transitive(&[PathBuf::from("/p/a")], &store, &index);
        assert_eq!(working.len(), 3);
    }

    #[test]
    fn unrelated_paths_are_ignored() {
        let (store, index) = chain();
        let working = Propagation::default().expand(&[PathBuf::from("/p/zzz")], &store, &index);
        assert!(working.is_empty());
    }
}
