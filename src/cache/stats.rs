//! Cache Statistics Module
//!
//! Tracks hit/miss/eviction counts for the memory tier and per-tier hit
//! counts for the tiered manager.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Returns `hits / total`, or 0.0 when nothing was requested.
pub fn hit_rate(hits: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

// == Cache Stats ==
/// Memory-tier counters, guarded by the store's lock.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of successful retrievals
    pub hits: u64,
    /// Number of failed retrievals (key absent or expired)
    pub misses: u64,
    /// Number of entries evicted due to LRU policy
    pub evictions: u64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    /// Total number of lookups seen.
    pub fn total(&self) -> u64 {
        self.hits + self.misses
    }

    /// Calculates hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        hit_rate(self.hits, self.total())
    }

    /// Zeroes every counter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Builds a serializable snapshot including store occupancy.
    pub fn snapshot(&self, size: usize, max_size: usize) -> MemoryStats {
        MemoryStats {
            hits: self.hits,
            misses: self.misses,
            total_requests: self.total(),
            hit_rate: self.hit_rate(),
            evictions: self.evictions,
            size,
            max_size,
        }
    }
}

// == Memory Stats ==
/// Point-in-time view of the memory tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryStats {
    pub hits: u64,
    pub misses: u64,
    pub total_requests: u64,
    pub hit_rate: f64,
    pub evictions: u64,
    pub size: usize,
    pub max_size: usize,
}

// == Tier Counters ==
/// Lock-free counters recording which tier answered each manager lookup.
#[derive(Debug, Default)]
pub struct TierCounters {
    memory_hits: AtomicU64,
    disk_hits: AtomicU64,
    misses: AtomicU64,
}

impl TierCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_memory_hit(&self) {
        self.memory_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_disk_hit(&self) {
        self.disk_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn memory_hits(&self) -> u64 {
        self.memory_hits.load(Ordering::Relaxed)
    }

    pub fn disk_hits(&self) -> u64 {
        self.disk_hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.memory_hits.store(0, Ordering::Relaxed);
        self.disk_hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}
