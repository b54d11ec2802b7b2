//! # BPE Word Cache

use compact_str::CompactString;
use dashmap::DashMap;
use dashmap::try_result::TryResult;

/// Default cache capacity, in words.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Sharded, bounded memo of merged words.
///
/// Reads never block: a locked shard is a miss, and the caller recomputes.
/// Once full, the cache stops accepting new entries.
#[derive(Debug)]
pub struct WordCache<V: Clone> {
    map: DashMap<CompactString, V, ahash::RandomState>,
    capacity: usize,
}

impl<V: Clone> Clone for WordCache<V> {
    /// Clones start cold.
    fn clone(&self) -> Self {
        Self::new(self.capacity)
    }
}

impl<V: Clone> Default for WordCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl<V: Clone> WordCache<V> {
    /// Create a cache holding at most `capacity` words.
    pub fn new(capacity: usize) -> Self {
        Self {
            map: DashMap::with_hasher(ahash::RandomState::new()),
            capacity,
        }
    }

    /// The maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The number of cached words.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Look up a word without blocking.
    pub fn get(
        &self,
        key: &str,
    ) -> Option<V> {
        match self.map.try_get(key) {
            TryResult::Present(entry) => Some(entry.value().clone()),
            TryResult::Absent | TryResult::Locked => None,
        }
    }

    /// Insert a word, unless the cache is full.
    pub fn set(
        &self,
        key: &str,
        value: V,
    ) {
        if self.capacity == 0 || self.map.len() >= self.capacity {
            return;
        }
        self.map.insert(CompactString::from(key), value);
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.map.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{check_is_send, check_is_sync};

    #[test]
    fn test_bounded() {
        let cache: WordCache<u32> = WordCache::new(2);
        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("c", 3);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("c"), None);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clone_is_cold() {
        let cache: WordCache<u32> = WordCache::default();
        cache.set("a", 1);
        let copy = cache.clone();
        assert!(copy.is_empty());
        assert_eq!(copy.capacity(), DEFAULT_CACHE_CAPACITY);

        check_is_send(&copy);
        check_is_sync(&copy);
    }
}
