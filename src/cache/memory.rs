//! Memory Store Module
//!
//! Bounded in-process tier: HashMap storage with LRU tracking and TTL expiry,
//! serialized behind a single lock.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::trace;

use crate::cache::{CacheEntry, CacheStats, LruTracker, MemoryStats};
use crate::error::{CacheError, Result};

#[derive(Debug)]
struct StoreInner<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// LRU access tracker
    lru: LruTracker,
    /// Hit/miss/eviction counters
    stats: CacheStats,
}

impl<V> StoreInner<V> {
    fn remove(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.lru.remove(key);
        }
        removed
    }
}

// == Memory Store ==
/// Thread-safe bounded LRU store with optional per-entry TTL.
///
/// Holds at most `max_size` entries. Inserting a new key at capacity evicts
/// exactly one least recently used entry. Every hit promotes the entry to
/// most recently used.
#[derive(Debug)]
pub struct MemoryStore<V> {
    inner: Mutex<StoreInner<V>>,
    max_size: usize,
}

impl<V: Clone> MemoryStore<V> {
    // == Constructor ==
    /// Creates a new store holding at most `max_size` entries.
    pub fn new(max_size: usize) -> Result<Self> {
        if max_size == 0 {
            return Err(CacheError::InvalidConfig(
                "memory tier capacity must be positive".to_string(),
            ));
        }

        Ok(Self {
            inner: Mutex::new(StoreInner {
                entries: HashMap::new(),
                lru: LruTracker::new(),
                stats: CacheStats::new(),
            }),
            max_size,
        })
    }

    // == Get ==
    /// Retrieves a clone of the value stored under `key`.
    ///
    /// A hit promotes the entry to most recently used. Absent and expired
    /// entries count as misses; expired entries are dropped.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.lock();

        let Some(expired) = inner.entries.get(key).map(|entry| entry.is_expired()) else {
            inner.stats.record_miss();
            return None;
        };

        if expired {
            trace!(key, "memory entry expired");
            inner.remove(key);
            inner.stats.record_miss();
            return None;
        }

        inner.stats.record_hit();
        inner.lru.touch(key);
        inner.entries.get(key).map(|entry| entry.value.clone())
    }

    // == Put ==
    /// Stores `value` under `key`, expiring after `ttl` if given.
    ///
    /// Overwrites reset the TTL. A new key at capacity evicts the least
    /// recently used entry first.
    pub fn put(&self, key: &str, value: V, ttl: Option<Duration>) {
        let mut inner = self.lock();

        if !inner.entries.contains_key(key) && inner.entries.len() >= self.max_size {
            if let Some(evicted) = inner.lru.evict_oldest() {
                trace!(key = %evicted, "evicting least recently used entry");
                inner.entries.remove(&evicted);
                inner.stats.record_eviction();
            }
        }

        inner
            .entries
            .insert(key.to_string(), CacheEntry::new(value, ttl));
        inner.lru.touch(key);
    }

    // == Remove ==
    /// Drops `key` without touching counters. Returns whether it was present.
    pub fn remove(&self, key: &str) -> bool {
        self.lock().remove(key).is_some()
    }

    /// Checks presence without touching recency or counters.
    pub fn contains(&self, key: &str) -> bool {
        self.lock().entries.contains_key(key)
    }

    /// Returns the expiry of `key`: `None` if absent, `Some(None)` if it
    /// never expires.
    pub fn expires_at(&self, key: &str) -> Option<Option<Instant>> {
        self.lock().entries.get(key).map(|entry| entry.expires_at)
    }

    // == Purge Expired ==
    /// Removes all expired entries. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        let mut inner = self.lock();
        let now = Instant::now();

        let expired_keys: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            inner.remove(key);
        }

        expired_keys.len()
    }

    // == Clear ==
    /// Empties the store and resets its counters.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.lru.clear();
        inner.stats.reset();
    }

    // == Stats ==
    pub fn stats(&self) -> MemoryStats {
        let inner = self.lock();
        inner.stats.snapshot(inner.entries.len(), self.max_size)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    // A panic while holding the lock leaves the map consistent enough for a cache.
    fn lock(&self) -> MutexGuard<'_, StoreInner<V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
