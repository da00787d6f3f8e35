//! Reverse dependency index: dependency path -> dependent paths

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct DependencyIndex {
    dependents: HashMap<PathBuf, BTreeSet<PathBuf>>,
}

impl DependencyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `dependent` is derived from `dependency`
    pub fn link(&mut self, dependency: &Path, dependent: &Path) {
        self.dependents
            .entry(dependency.to_path_buf())
            .or_default()
            .insert(dependent.to_path_buf());
    }

    /// Drop the edge `dependency -> dependent`, keeping the key and other dependents
    pub fn unlink(&mut self, dependency: &Path, dependent: &Path) {
        if let Some(set) = self.dependents.get_mut(dependency) {
            set.remove(dependent);
        }
    }

    /// Direct dependents of `dependency`
    pub fn dependents_of(&self, dependency: &Path) -> impl Iterator<Item = &PathBuf> {
        self.dependents.get(dependency).into_iter().flatten()
    }

    pub fn contains_key(&self, dependency: &Path) -> bool {
        self.dependents.contains_key(dependency)
    }

    pub fn clear(&mut self) {
        self.dependents.clear();
    }

    pub fn len(&self) -> usize {
        self.dependents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependents.is_empty()
    }
}
