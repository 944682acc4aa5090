//! In-process cache backend: LRU bounded, per-entry expiry.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;

use crate::cache::CacheBackend;
use crate::error::CacheError;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// LRU-based store with TTL
pub struct MemoryCache {
    entries: Mutex<LruCache<String, Entry>>,
}

impl MemoryCache {
    /// * `capacity` - Maximum number of keys kept; 0 is treated as 1
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, LruCache<String, Entry>>, CacheError> {
        self.entries
            .lock()
            .map_err(|_| CacheError::Unavailable("memory cache lock poisoned".to_string()))
    }
}

impl CacheBackend for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut entries = self.lock()?;

        match entries.get(key) {
            None => return Ok(None),
            Some(entry) if entry.expires_at > Instant::now() => {
                return Ok(Some(entry.value.clone()));
            }
            Some(_) => {}
        }

        // Expired.
        entries.pop(key);
        Ok(None)
    }

    fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| CacheError::Unavailable(format!("ttl {ttl:?} is out of range")))?;
        let mut entries = self.lock()?;
        entries.put(key.to_string(), Entry { value, expires_at });
        Ok(())
    }
}
