//! Project-wide index over the contributions of every indexed file

use crate::index::IndexContributions;
use crate::index::IndexKey;
use crate::stub::StubId;
use dashmap::DashMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

/// Occurrence of a key in one file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct IndexHit {
    pub path: PathBuf,
    pub stub: StubId,
}

/// Index contributions per file, queried across the project
#[derive(Debug, Default)]
pub struct ProjectIndex {
    /// File index: file_path -> contributions of its latest stub tree
    files: DashMap<PathBuf, Arc<IndexContributions>>,
}

impl ProjectIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything a file contributed with `contributions`.
    pub fn update_file(&self, path: PathBuf, contributions: Arc<IndexContributions>) {
        self.files.insert(path, contributions);
    }

    /// Forget a file. Returns whether it was indexed.
    pub fn remove_file(&self, path: &Path) -> bool {
        self.files.remove(path).is_some()
    }

    pub fn contains_file(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Every occurrence of `key` in `index`, ordered by path then stub id.
    pub fn get(&self, index: &str, key: &IndexKey) -> Vec<IndexHit> {
        self.get_filtered(index, key, |_| true)
    }

    /// Like [`ProjectIndex::get`], restricted to paths accepted by `filter`.
    pub fn get_filtered<F>(&self, index: &str, key: &IndexKey, filter: F) -> Vec<IndexHit>
    where
        F: Fn(&Path) -> bool,
    {
        let mut hits = Vec::new();
        for entry in &self.files {
            if !filter(entry.key()) {
                continue;
            }
            hits.extend(entry.value().get(index, key).iter().map(|stub| IndexHit {
                path: entry.key().clone(),
                stub: *stub,
            }));
        }
        hits.sort();
        hits
    }

    /// Contributions currently recorded for a file.
    pub fn file_contributions(&self, path: &Path) -> Option<Arc<IndexContributions>> {
        self.files.get(path).map(|entry| Arc::clone(entry.value()))
    }

    pub fn clear(&self) {
        self.files.clear();
    }
}
