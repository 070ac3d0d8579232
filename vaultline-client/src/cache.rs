//! Process-local read-model cache with per-entry TTL.
//!
//! The cache is a latency optimization, never a source of truth: every
//! entry carries an explicit staleness bound, and an expired entry is
//! indistinguishable from a missing one. Expiry is lazy, on read; there is
//! no background sweep. Writes are last-write-wins per key, which is
//! sufficient because all mutation happens synchronously within one call.

use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use vaultline_core::UserId;

struct CacheEntry {
    value: serde_json::Value,
    stored_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.stored_at) >= self.ttl
    }
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Reads that found an entry past its TTL (also counted as misses).
    pub expired: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Default)]
pub struct CacheStore {
    entries: Mutex<HashMap<String, CacheEntry>>,
    stats: Mutex<CacheStats>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a value, treating an expired entry identically to a missing one.
    ///
    /// An entry that fails to deserialize into `T` counts as a miss; the
    /// stale bytes are dropped rather than surfaced.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let now = Instant::now();
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        let mut stats = self.stats.lock().expect("cache stats mutex poisoned");

        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                stats.expired += 1;
                stats.misses += 1;
                None
            }
            Some(entry) => match serde_json::from_value(entry.value.clone()) {
                Ok(value) => {
                    stats.hits += 1;
                    Some(value)
                }
                Err(_) => {
                    entries.remove(key);
                    stats.misses += 1;
                    None
                }
            },
            None => {
                stats.misses += 1;
                None
            }
        }
    }

    /// Store a value under `key` for `ttl`. Overwrites any existing entry.
    pub fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let Ok(value) = serde_json::to_value(value) else {
            return;
        };
        let entry = CacheEntry {
            value,
            stored_at: Instant::now(),
            ttl,
        };
        self.entries
            .lock()
            .expect("cache mutex poisoned")
            .insert(key.to_string(), entry);
    }

    pub fn invalidate(&self, key: &str) {
        self.entries
            .lock()
            .expect("cache mutex poisoned")
            .remove(key);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        *self.stats.lock().expect("cache stats mutex poisoned")
    }
}

pub fn pending_key(user_id: UserId) -> String {
    format!("pending-consents:{user_id}")
}

pub fn audit_key(user_id: UserId) -> String {
    format!("consent-history:{user_id}")
}

pub fn active_key(user_id: UserId) -> String {
    format!("active-consents:{user_id}")
}
