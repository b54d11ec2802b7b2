//! # Thread Regex Pool

use crate::util::regex::{RegexSupplier, RegexWrapper};
use ahash::AHashMap;
use std::sync::{Arc, RwLock};

/// Interior-mutable pool of regex clones, one per thread slot.
///
/// Threads are hashed onto `max_pool` slots; each slot lazily holds its own
/// clone, so hot threads stop sharing the compiled regex's scratch space.
#[derive(Clone)]
pub struct RegexWrapperPool {
    regex: Arc<RegexWrapper>,

    max_pool: u64,
    hasher: ahash::RandomState,
    pool: Arc<RwLock<AHashMap<u64, Arc<RegexWrapper>>>>,
}

impl From<Arc<RegexWrapper>> for RegexWrapperPool {
    fn from(regex: Arc<RegexWrapper>) -> Self {
        Self::new(regex)
    }
}

impl RegexWrapperPool {
    /// Create a new `RegexWrapperPool`.
    pub fn new(regex: Arc<RegexWrapper>) -> Self {
        let max_pool = std::thread::available_parallelism()
            .map(|n| n.get() as u64)
            .unwrap_or(128);

        Self {
            regex,
            max_pool,
            hasher: ahash::RandomState::new(),
            pool: Default::default(),
        }
    }

    /// Clear the regex pool.
    pub fn clear(&self) {
        if let Ok(mut pool) = self.pool.write() {
            pool.clear();
        }
    }

    /// Get a Regex from the pool for the current thread.
    pub fn get(&self) -> Arc<RegexWrapper> {
        let slot = self.hasher.hash_one(std::thread::current().id()) % self.max_pool;

        if let Ok(pool) = self.pool.read()
            && let Some(regex) = pool.get(&slot)
        {
            return regex.clone();
        }

        let Ok(mut writer) = self.pool.write() else {
            // Poisoned; hand out the shared regex.
            return self.regex.clone();
        };
        writer
            .entry(slot)
            .or_insert_with(|| Arc::new((*self.regex).clone()))
            .clone()
    }
}

impl RegexSupplier for RegexWrapperPool {
    fn get_regex(&self) -> Arc<RegexWrapper> {
        self.get()
    }

    fn get_pattern(&self) -> String {
        self.regex.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::regex::RegexWrapperPattern;

    #[test]
    fn test_regex_pool() {
        let pattern: RegexWrapperPattern = r"foo".into();
        let regex = Arc::new(pattern.compile().unwrap());

        let pool = RegexWrapperPool::new(regex);

        let r0 = pool.get();
        assert_eq!(r0.as_str(), r"foo");
        assert!(Arc::ptr_eq(&r0, &pool.get()));

        pool.clear();
        assert!(!Arc::ptr_eq(&r0, &pool.get()));
    }
}
