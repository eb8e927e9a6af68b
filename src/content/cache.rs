//! Time-bounded LRU cache for CMS responses.
//!
//! Entries are immutable `Arc` values keyed by the query that produced
//! them. A write replaces the entry; nothing is mutated in place. The lock
//! is only held for map operations, never across an await.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::config::CacheSettings;

struct CacheEntry<V> {
    stored_at: Instant,
    value: Arc<V>,
}

/// An LRU cache whose entries expire after a fixed time to live.
pub struct TtlCache<V> {
    entries: Mutex<LruCache<String, CacheEntry<V>>>,
    ttl: Duration,
}

impl<V> TtlCache<V> {
    pub fn new(settings: CacheSettings) -> Self {
        let capacity = NonZeroUsize::new(settings.capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl: settings.ttl,
        }
    }

    /// Returns a fresh entry. Expired entries are dropped on the way.
    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        let mut entries = self.lock();
        let hit = entries
            .get(key)
            .map(|entry| (entry.stored_at.elapsed() < self.ttl, Arc::clone(&entry.value)));
        match hit {
            Some((true, value)) => Some(value),
            Some((false, _)) => {
                entries.pop(key);
                None
            }
            None => None,
        }
    }

    /// Stores a value, replacing any previous entry, and returns the shared
    /// handle.
    pub fn insert(&self, key: String, value: V) -> Arc<V> {
        let value = Arc::new(value);
        let entry = CacheEntry {
            stored_at: Instant::now(),
            value: Arc::clone(&value),
        };
        self.lock().put(key, entry);
        value
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
