//! # Cache Module
//!
//! Persists fingerprints so unchanged files are not rehashed.
//!
//! ## Lifecycle per run
//! 1. `load` - read the previous mapping (or start empty when rebuilding)
//! 2. `update` - merge freshly computed fingerprints
//! 3. `prune` - drop paths that are no longer candidates
//! 4. `save` - atomically replace the cache file
//!
//! ## Backends
//! - `TextFileStore` - one `path,hex` line per record
//! - `InMemoryStore` - For testing and embedding

mod file;
mod memory;
mod traits;

pub use file::TextFileStore;
pub use memory::InMemoryStore;
pub use traits::CacheStore;

use crate::core::hasher::Fingerprint;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// In-memory path to fingerprint mapping for one run.
///
/// Iteration is always sorted by path, which keeps saved files and
/// matcher output reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashCache {
    entries: BTreeMap<PathBuf, Fingerprint>,
}

impl HashCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite fingerprints for freshly hashed paths
    pub fn update<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = (PathBuf, Fingerprint)>,
    {
        for (path, fingerprint) in records {
            self.entries.insert(path, fingerprint);
        }
    }

    /// Remove every entry whose path is not in `live_paths`.
    ///
    /// Returns the removed paths, in path order.
    pub fn prune(&mut self, live_paths: &HashSet<PathBuf>) -> Vec<PathBuf> {
        let stale: Vec<PathBuf> = self
            .entries
            .keys()
            .filter(|path| !live_paths.contains(*path))
            .cloned()
            .collect();

        for path in &stale {
            self.entries.remove(path);
            tracing::debug!(path = %path.display(), "Removed hash for file no longer present");
        }

        stale
    }

    /// Look up the fingerprint for a path
    pub fn get(&self, path: &Path) -> Option<&Fingerprint> {
        self.entries.get(path)
    }

    /// Check whether a path has a fingerprint
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no fingerprints are cached
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by path
    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &Fingerprint)> {
        self.entries.iter()
    }

    /// Owned `(path, fingerprint)` records sorted by path
    pub fn to_records(&self) -> Vec<(PathBuf, Fingerprint)> {
        self.entries
            .iter()
            .map(|(path, fingerprint)| (path.clone(), fingerprint.clone()))
            .collect()
    }
}

impl FromIterator<(PathBuf, Fingerprint)> for HashCache {
    fn from_iter<I: IntoIterator<Item = (PathBuf, Fingerprint)>>(iter: I) -> Self {
        let mut cache = HashCache::new();
        cache.update(iter);
        cache
    }
}
