//! Cache Module
//!
//! Tiered caching: a bounded LRU memory store with TTL expiry in front of a
//! TTL-aware disk tier, both addressed by the digest of a structured key.

pub mod disk;
mod entry;
mod key;
mod lru;
mod memory;
mod stats;
mod tiered;


// Re-export public types
pub use disk::{DiskLookup, DiskRecord, DiskStore};
pub use entry::CacheEntry;
pub use key::CacheKey;
pub use lru::LruTracker;
pub use memory::MemoryStore;
pub use stats::{CacheStats, MemoryStats, TierCounters};
pub use tiered::{ttl_from_secs, CacheReport, TieredCache, MAX_MEMORY_TTL};
