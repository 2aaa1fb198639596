//! Cache store trait definition.

use super::HashCache;
use crate::error::CacheError;

/// Where a `HashCache` is loaded from and saved to
pub trait CacheStore: Send + Sync {
    /// Load the previously saved mapping.
    ///
    /// Returns an empty cache when `rebuild` is set or nothing was saved yet.
    /// Loading never fails: unreadable data is logged and skipped.
    fn load(&self, rebuild: bool) -> HashCache;

    /// Replace the saved mapping with `cache`.
    ///
    /// Either the whole new mapping is stored or the previous one is left
    /// untouched.
    fn save(&self, cache: &HashCache) -> Result<(), CacheError>;
}
