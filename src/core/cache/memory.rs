//! In-memory cache store for testing.

use super::{CacheStore, HashCache};
use crate::error::CacheError;
use std::sync::RwLock;

/// In-memory cache store
///
/// Useful for testing and for embedders that keep fingerprints elsewhere.
#[derive(Default)]
pub struct InMemoryStore {
    saved: RwLock<Option<HashCache>>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `cache`
    pub fn with_cache(cache: HashCache) -> Self {
        Self {
            saved: RwLock::new(Some(cache)),
        }
    }

    /// The last saved mapping, if any
    pub fn snapshot(&self) -> Option<HashCache> {
        self.saved.read().ok().and_then(|saved| saved.clone())
    }
}

impl CacheStore for InMemoryStore {
    fn load(&self, rebuild: bool) -> HashCache {
        if rebuild {
            return HashCache::new();
        }
        self.snapshot().unwrap_or_default()
    }

    fn save(&self, cache: &HashCache) -> Result<(), CacheError> {
        let mut saved = self.saved.write().map_err(|_| CacheError::Poisoned)?;
        *saved = Some(cache.clone());
        Ok(())
    }
}
