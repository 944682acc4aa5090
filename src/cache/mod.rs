//! Cache-aside layer in front of rate-limited upstream calls.
//!
//! - `CacheBackend`: minimal get / set-with-expiry contract over opaque strings
//! - `MemoryCache`: the in-process backend (`memory`)
//! - `CacheKey`: versioned, day-bucketed keys (`key`)
//! - `ResultCache`: JSON-encodes values, downgrades backend failures, and
//!   collapses concurrent cold fetches for the same key

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{CacheError, FetchError};

pub mod key;
pub mod memory;

pub use key::{CacheKey, day_bucket};
pub use memory::MemoryCache;

/// Key-value store with per-entry expiry. Values are opaque blobs.
pub trait CacheBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;
}

pub struct ResultCache {
    backend: Arc<dyn CacheBackend>,
    ttl: Duration,
    version: String,
    inflight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ResultCache {
    pub fn new(backend: Arc<dyn CacheBackend>, ttl: Duration, version: impl Into<String>) -> Self {
        Self {
            backend,
            ttl,
            version: version.into(),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    pub fn key(&self, metric: &str, subject: &str, now: DateTime<Utc>) -> CacheKey {
        CacheKey::at(self.version.as_str(), metric, subject, now)
    }

    /// Cached value, or `None` on miss, backend failure, or undecodable entry.
    pub fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let key = key.to_string();
        let raw = match self.backend.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(%key, "cache miss");
                return None;
            }
            Err(err) => {
                warn!(%key, error = %err, "cache read failed; treating as miss");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!(%key, "cache hit");
                Some(value)
            }
            Err(err) => {
                warn!(%key, error = %CacheError::Codec(err.to_string()), "discarding cache entry");
                None
            }
        }
    }

    /// Store `value`; failures are logged and dropped.
    pub fn set<T: Serialize>(&self, key: &CacheKey, value: &T) {
        let key = key.to_string();
        let encoded = match serde_json::to_string(value) {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(%key, error = %CacheError::Codec(err.to_string()), "cache write skipped");
                return;
            }
        };

        if let Err(err) = self.backend.set(&key, encoded, self.ttl) {
            warn!(%key, error = %err, "cache write failed");
        }
    }

    /// Serve from cache, or run `fetch` once and store its result.
    ///
    /// Concurrent callers missing on the same key wait for the first fetch
    /// instead of issuing their own. Fetch errors are returned unchanged and
    /// nothing is cached for them.
    pub fn get_or_fetch<T, F>(&self, key: &CacheKey, fetch: F) -> Result<T, FetchError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T, FetchError>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        let name = key.to_string();
        let gate = self.gate(&name);
        let result = {
            let _turn = gate.lock().unwrap_or_else(PoisonError::into_inner);
            match self.get(key) {
                Some(value) => Ok(value),
                None => fetch().inspect(|value| self.set(key, value)),
            }
        };
        self.release(&name, gate);

        result
    }

    fn gate(&self, name: &str) -> Arc<Mutex<()>> {
        let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        inflight.entry(name.to_string()).or_default().clone()
    }

    fn release(&self, name: &str, gate: Arc<Mutex<()>>) {
        let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        // Map + this handle: nobody else is waiting.
        let current = inflight.get(name).is_some_and(|g| Arc::ptr_eq(g, &gate));
        if current && Arc::strong_count(&gate) <= 2 {
            inflight.remove(name);
        }
    }

    #[cfg(test)]
    fn inflight_len(&self) -> usize {
        self.inflight.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
