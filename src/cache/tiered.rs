//! Tiered Cache Module
//!
//! Memory tier in front of a TTL-aware disk tier, addressed by `CacheKey`.
//! Storage problems never fail a lookup or an insert; they are logged and
//! surface only as misses.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::cache::disk::{DiskLookup, DiskStore};
use crate::cache::stats::{hit_rate, TierCounters};
use crate::cache::{CacheKey, MemoryStats, MemoryStore};
use crate::config::{expand_home, Config};
use crate::error::{CacheError, Result};

/// Longest time any value stays in the memory tier.
pub const MAX_MEMORY_TTL: Duration = Duration::from_secs(3600);

// == Cache Report ==
/// Combined statistics for both tiers.
#[derive(Debug, Clone, Serialize)]
pub struct CacheReport {
    pub memory_cache: MemoryStats,
    pub memory_hits: u64,
    pub disk_hits: u64,
    pub misses: u64,
    pub total_requests: u64,
    pub overall_hit_rate: f64,
    pub cache_dir: PathBuf,
    pub disk_cache_enabled: bool,
}

// == Tiered Cache ==
/// Two-level cache: a bounded LRU memory store backed by disk records.
///
/// Lookups try memory, then disk (promoting disk hits into memory), then
/// report a miss. Share one instance across threads with `Arc`.
#[derive(Debug)]
pub struct TieredCache<V> {
    memory: MemoryStore<V>,
    disk: DiskStore,
    disk_enabled: bool,
    counters: TierCounters,
}

impl<V> TieredCache<V>
where
    V: Clone + Serialize + DeserializeOwned,
{
    // == Constructor ==
    /// Creates a cache persisting under `cache_dir` with a memory tier of
    /// `max_memory_items` entries.
    ///
    /// A leading `~` in `cache_dir` is expanded. Fails if the directory cannot
    /// be created or the capacity is zero.
    pub fn new(cache_dir: impl AsRef<Path>, max_memory_items: usize) -> Result<Self> {
        let dir = match cache_dir.as_ref().to_str() {
            Some(raw) => expand_home(raw),
            None => cache_dir.as_ref().to_path_buf(),
        };

        let memory = MemoryStore::new(max_memory_items)?;
        let disk = DiskStore::open(&dir)?;

        info!(
            cache_dir = %disk.dir().display(),
            max_memory_items,
            "tiered cache initialized"
        );

        Ok(Self {
            memory,
            disk,
            disk_enabled: true,
            counters: TierCounters::new(),
        })
    }

    /// Creates a cache from loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut cache = Self::new(&config.cache_dir, config.max_memory_items)?;
        cache.disk_enabled = config.disk_cache_enabled;
        Ok(cache)
    }

    /// Enables or disables the disk tier for reads and writes.
    pub fn with_disk_enabled(mut self, enabled: bool) -> Self {
        self.disk_enabled = enabled;
        self
    }

    // == Get ==
    /// Returns the value cached for `key`, if any tier holds a live copy.
    pub fn get(&self, key: &CacheKey) -> Option<V> {
        let digest = key.digest();

        if let Some(value) = self.memory.get(&digest) {
            self.counters.record_memory_hit();
            debug!(key = %digest, "memory cache hit");
            return Some(value);
        }

        match self.load_from_disk(&digest) {
            Ok(DiskLookup::Hit(record)) => {
                self.counters.record_disk_hit();
                debug!(key = %digest, "disk cache hit");
                let ttl = record.remaining().min(MAX_MEMORY_TTL);
                self.memory.put(&digest, record.data.clone(), Some(ttl));
                return Some(record.data);
            }
            Ok(DiskLookup::Expired) => {
                debug!(key = %digest, "disk cache record expired");
            }
            Ok(DiskLookup::Miss) => {}
            Err(e) => {
                warn!(key = %digest, error = %e, "failed to load from disk cache");
            }
        }

        self.counters.record_miss();
        debug!(key = %digest, "cache miss");
        None
    }

    // == Put ==
    /// Caches `data` under `key`.
    ///
    /// The memory copy expires after `ttl`, capped at one hour (one hour when
    /// no `ttl` is given). When `persist_to_disk` is set and a `ttl` is given,
    /// a disk record expiring after the full `ttl` is written too. A failed
    /// write is logged and drops any older record for `key`, so the disk tier
    /// never serves a value this call replaced. A zero `ttl` counts as none.
    pub fn put(&self, data: V, ttl: Option<Duration>, persist_to_disk: bool, key: &CacheKey) {
        let digest = key.digest();
        let ttl = ttl.filter(|ttl| !ttl.is_zero());

        if persist_to_disk && self.disk_enabled {
            if let Some(ttl) = ttl {
                if let Err(e) = self.disk.store(&digest, &data, ttl) {
                    error!(key = %digest, error = %e, "failed to save to disk cache");
                    if self.disk.remove(&digest) {
                        warn!(key = %digest, "dropped outdated disk record");
                    }
                }
            }
        }

        let memory_ttl = ttl.map_or(MAX_MEMORY_TTL, |ttl| ttl.min(MAX_MEMORY_TTL));
        self.memory.put(&digest, data, Some(memory_ttl));
    }

    // == Get Or Insert ==
    /// Returns the cached value for `key`, or computes, caches and returns it.
    ///
    /// Errors from `compute` are returned as-is and nothing is cached.
    pub fn get_or_insert_with<F, E>(
        &self,
        key: &CacheKey,
        ttl: Option<Duration>,
        persist_to_disk: bool,
        compute: F,
    ) -> std::result::Result<V, E>
    where
        F: FnOnce() -> std::result::Result<V, E>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        let value = compute()?;
        self.put(value.clone(), ttl, persist_to_disk, key);
        Ok(value)
    }

    // == Clear ==
    /// Empties the memory tier and resets its counters.
    pub fn clear_memory(&self) {
        self.memory.clear();
    }

    /// Empties both tiers and resets all counters.
    pub fn clear_all(&self) {
        self.memory.clear();
        self.counters.reset();

        match self.disk.clear() {
            Ok(removed) => info!(removed, "cleared disk cache files"),
            Err(e) => error!(error = %e, "failed to clear disk cache"),
        }
    }

    // == Stats ==
    pub fn get_cache_stats(&self) -> CacheReport {
        let memory_hits = self.counters.memory_hits();
        let disk_hits = self.counters.disk_hits();
        let misses = self.counters.misses();
        let total_requests = memory_hits + disk_hits + misses;

        CacheReport {
            memory_cache: self.memory.stats(),
            memory_hits,
            disk_hits,
            misses,
            total_requests,
            overall_hit_rate: hit_rate(memory_hits + disk_hits, total_requests),
            cache_dir: self.disk.dir().to_path_buf(),
            disk_cache_enabled: self.disk_enabled,
        }
    }

    // == Optimize ==
    /// Deletes expired and corrupted disk records. Returns the number removed.
    pub fn optimize_cache(&self) -> usize {
        match self.disk.sweep() {
            Ok(removed) => {
                if removed > 0 {
                    info!(removed, "cache optimization removed expired items");
                }
                removed
            }
            Err(e) => {
                error!(error = %e, "cache optimization failed");
                0
            }
        }
    }

    /// Drops expired memory entries. Returns the number removed.
    pub fn purge_expired_memory(&self) -> usize {
        self.memory.purge_expired()
    }

    /// Expiry of the memory copy for `key`: `None` if not in memory,
    /// `Some(None)` if it never expires.
    pub fn memory_expiry(&self, key: &CacheKey) -> Option<Option<Instant>> {
        self.memory.expires_at(&key.digest())
    }

    /// Location of the disk record for `key`, whether or not it exists.
    pub fn disk_path(&self, key: &CacheKey) -> PathBuf {
        self.disk.path_for(&key.digest())
    }

    pub fn cache_dir(&self) -> &Path {
        self.disk.dir()
    }

    fn load_from_disk(&self, digest: &str) -> Result<DiskLookup<V>> {
        if !self.disk_enabled {
            return Ok(DiskLookup::Miss);
        }
        self.disk.load(digest)
    }
}

/// Converts a TTL in seconds, rejecting negative or non-finite values.
pub fn ttl_from_secs(secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs)
        .map_err(|_| CacheError::InvalidRequest(format!("invalid ttl: {secs}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use std::thread::sleep;

    fn cache(max: usize) -> (tempfile::TempDir, TieredCache<String>) {
        let tmp = tempfile::tempdir().unwrap();
        let cache = TieredCache::new(tmp.path().join("cache"), max).unwrap();
        (tmp, cache)
    }

    fn key(n: i64) -> CacheKey {
        CacheKey::new().kwarg("k", n)
    }

    #[test]
    fn test_read_your_write() {
        let (_tmp, cache) = cache(10);
        let key = CacheKey::new().kwarg("a", 1);

        cache.put("data".to_string(), None, true, &key);

        assert_eq!(cache.get(&key).as_deref(), Some("data"));
        assert_eq!(cache.get_cache_stats().memory_hits, 1);
    }

    #[test]
    fn test_put_without_ttl_skips_disk() {
        let (_tmp, cache) = cache(10);
        cache.put("data".to_string(), None, true, &key(1));
        assert!(!cache.disk_path(&key(1)).exists());
    }

    #[test]
    fn test_put_without_persist_skips_disk() {
        let (_tmp, cache) = cache(10);
        cache.put("data".to_string(), Some(Duration::from_secs(60)), false, &key(1));
        assert!(!cache.disk_path(&key(1)).exists());
    }

    #[test]
    fn test_memory_ttl_is_capped() {
        let (_tmp, cache) = cache(10);
        let start = Instant::now();

        cache.put("x".to_string(), Some(Duration::from_secs(7200)), true, &key(2));

        let expiry = cache.memory_expiry(&key(2)).flatten().unwrap();
        assert!(expiry <= Instant::now() + MAX_MEMORY_TTL);
        assert!(expiry >= start + MAX_MEMORY_TTL);
    }

    #[test]
    fn test_short_ttl_kept_in_memory() {
        let (_tmp, cache) = cache(10);
        let start = Instant::now();

        cache.put("x".to_string(), Some(Duration::from_secs(10)), false, &key(3));

        let expiry = cache.memory_expiry(&key(3)).flatten().unwrap();
        assert!(expiry >= start + Duration::from_secs(10));
        assert!(expiry <= Instant::now() + Duration::from_secs(10));
    }

    #[test]
    fn test_disk_hit_promotes_to_memory() {
        let (_tmp, cache) = cache(10);
        cache.put("x".to_string(), Some(Duration::from_secs(60)), true, &key(4));
        cache.clear_memory();

        assert_eq!(cache.get(&key(4)).as_deref(), Some("x"));
        assert_eq!(cache.get(&key(4)).as_deref(), Some("x"));

        let stats = cache.get_cache_stats();
        assert_eq!(stats.disk_hits, 1);
        assert_eq!(stats.memory_hits, 1);
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn test_promoted_entry_keeps_remaining_ttl() {
        let (_tmp, cache) = cache(10);
        cache.put("x".to_string(), Some(Duration::from_secs(60)), true, &key(5));
        cache.clear_memory();

        cache.get(&key(5)).unwrap();

        let expiry = cache.memory_expiry(&key(5)).flatten().unwrap();
        assert!(expiry <= Instant::now() + Duration::from_secs(60));
    }

    #[test]
    fn test_disk_expiry_deletes_record() {
        let (_tmp, cache) = cache(10);
        cache.put("x".to_string(), Some(Duration::from_millis(10)), true, &key(6));
        sleep(Duration::from_millis(40));
        cache.clear_memory();

        assert!(cache.get(&key(6)).is_none());
        assert!(!cache.disk_path(&key(6)).exists());
        assert_eq!(cache.get_cache_stats().misses, 1);
    }

    #[test]
    fn test_corrupt_record_is_a_miss() {
        let (_tmp, cache) = cache(10);
        fs::write(cache.disk_path(&key(7)), b"\xff\xfe garbage").unwrap();

        assert!(cache.get(&key(7)).is_none());
        assert!(cache.disk_path(&key(7)).exists());
    }

    #[test]
    fn test_disk_disabled() {
        let (_tmp, cache) = cache(10);
        let cache = cache.with_disk_enabled(false);

        cache.put("x".to_string(), Some(Duration::from_secs(60)), true, &key(8));
        assert!(!cache.disk_path(&key(8)).exists());
        assert!(!cache.get_cache_stats().disk_cache_enabled);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let result = TieredCache::<String>::new(tmp.path(), 0);
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_get_or_insert_with() {
        let (_tmp, cache) = cache(10);
        let mut calls = 0;

        for _ in 0..3 {
            let value: std::result::Result<String, ()> =
                cache.get_or_insert_with(&key(9), Some(Duration::from_secs(60)), true, || {
                    calls += 1;
                    Ok("computed".to_string())
                });
            assert_eq!(value.unwrap(), "computed");
        }

        assert_eq!(calls, 1);
    }

    #[test]
    fn test_get_or_insert_with_error_not_cached() {
        let (_tmp, cache) = cache(10);

        let result: std::result::Result<String, &str> =
            cache.get_or_insert_with(&key(10), None, false, || Err("upstream down"));

        assert_eq!(result, Err("upstream down"));
        assert!(cache.get(&key(10)).is_none());
    }

    #[test]
    fn test_failed_persist_drops_outdated_record() {
        // serde_json rejects maps with non-string keys
        type Table = HashMap<Vec<u8>, u32>;
        let tmp = tempfile::tempdir().unwrap();
        let cache: TieredCache<Table> = TieredCache::new(tmp.path(), 10).unwrap();
        let ttl = Some(Duration::from_secs(600));

        cache.put(Table::new(), ttl, true, &key(11));
        assert!(cache.disk_path(&key(11)).exists());

        let replacement = Table::from([(vec![1, 2], 3)]);
        cache.put(replacement.clone(), ttl, true, &key(11));

        assert!(!cache.disk_path(&key(11)).exists());
        assert_eq!(cache.get(&key(11)), Some(replacement));

        cache.clear_memory();
        assert!(cache.get(&key(11)).is_none());
    }

    #[test]
    fn test_unrepresentable_ttl_still_replaces_disk_record() {
        let (_tmp, cache) = cache(10);

        cache.put("v1".to_string(), Some(Duration::from_secs(600)), true, &key(12));
        let huge = ttl_from_secs(1e13).unwrap();
        cache.put("v2".to_string(), Some(huge), true, &key(12));
        cache.clear_memory();

        assert_eq!(cache.get(&key(12)).as_deref(), Some("v2"));
    }

    #[test]
    fn test_ttl_from_secs() {
        assert_eq!(ttl_from_secs(1.5).unwrap(), Duration::from_millis(1500));
        assert!(ttl_from_secs(-1.0).is_err());
        assert!(ttl_from_secs(f64::NAN).is_err());
    }
}
