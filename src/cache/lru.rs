//! LRU Tracker Module
//!
//! Implements Least Recently Used tracking for memory-tier eviction.

use std::collections::{HashMap, VecDeque};

/// Stale slots tolerated before the queue is compacted.
const COMPACT_SLACK: usize = 32;

// == LRU Tracker ==
/// Tracks access order for LRU eviction strategy.
///
/// Keys are stored in a VecDeque of `(key, generation)` slots where:
/// - Front = Most recently used
/// - Back = Least recently used
///
/// A touch pushes a fresh slot instead of searching for the old one; slots
/// whose generation no longer matches `live` are stale and skipped. This keeps
/// `touch`, `remove` and `evict_oldest` O(1) amortized.
#[derive(Debug, Default)]
pub struct LruTracker {
    /// Access slots, possibly including stale ones
    order: VecDeque<(String, u64)>,
    /// Current generation of every tracked key
    live: HashMap<String, u64>,
    /// Next generation to hand out
    next_generation: u64,
}

impl LruTracker {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks a key as most recently used, tracking it if new.
    pub fn touch(&mut self, key: &str) {
        let generation = self.next_generation;
        self.next_generation += 1;
        self.live.insert(key.to_string(), generation);
        self.order.push_front((key.to_string(), generation));
        self.maybe_compact();
    }

    // == Remove ==
    /// Stops tracking a key.
    pub fn remove(&mut self, key: &str) {
        if self.live.remove(key).is_some() {
            self.maybe_compact();
        }
    }

    // == Evict Oldest ==
    /// Returns and untracks the least recently used key.
    ///
    /// Returns None if tracker is empty.
    pub fn evict_oldest(&mut self) -> Option<String> {
        while let Some((key, generation)) = self.order.pop_back() {
            if self.live.get(&key) == Some(&generation) {
                self.live.remove(&key);
                return Some(key);
            }
        }
        None
    }

    // == Peek Oldest ==
    /// Returns the least recently used key without removing it.
    #[cfg(test)]
    pub fn peek_oldest(&self) -> Option<&str> {
        self.order
            .iter()
            .rev()
            .find(|(key, generation)| self.is_current(key, *generation))
            .map(|(key, _)| key.as_str())
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    // == Contains ==
    /// Checks if a key is being tracked.
    #[cfg(test)]
    pub fn contains(&self, key: &str) -> bool {
        self.live.contains_key(key)
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.order.clear();
        self.live.clear();
    }

    #[cfg(test)]
    fn is_current(&self, key: &str, generation: u64) -> bool {
        self.live.get(key) == Some(&generation)
    }

    fn maybe_compact(&mut self) {
        if self.order.len() > self.live.len() * 2 + COMPACT_SLACK {
            let live = &self.live;
            self.order
                .retain(|(key, generation)| live.get(key) == Some(generation));
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lru_new() {
        let lru = LruTracker::new();
        assert!(lru.is_empty());
        assert_eq!(lru.len(), 0);
        assert_eq!(lru.peek_oldest(), None);
    }

    #[test]
    fn test_lru_touch_new_key() {
        let mut lru = LruTracker::new();

        lru.touch("key1");
        lru.touch("key2");
        lru.touch("key3");

        assert_eq!(lru.len(), 3);
        assert_eq!(lru.peek_oldest(), Some("key1"));
    }

    #[test]
    fn test_lru_touch_existing_key() {
        let mut lru = LruTracker::new();

        lru.touch("key1");
        lru.touch("key2");
        lru.touch("key3");
        lru.touch("key1");

        assert_eq!(lru.len(), 3);
        assert_eq!(lru.peek_oldest(), Some("key2"));
    }

    #[test]
    fn test_lru_evict_oldest() {
        let mut lru = LruTracker::new();

        lru.touch("key1");
        lru.touch("key2");
        lru.touch("key3");

        assert_eq!(lru.evict_oldest(), Some("key1".to_string()));
        assert_eq!(lru.len(), 2);
        assert_eq!(lru.evict_oldest(), Some("key2".to_string()));
        assert_eq!(lru.len(), 1);
    }

    #[test]
    fn test_lru_evict_empty() {
        let mut lru = LruTracker::new();
        assert_eq!(lru.evict_oldest(), None);
    }

    #[test]
    fn test_lru_remove() {
        let mut lru = LruTracker::new();

        lru.touch("key1");
        lru.touch("key2");
        lru.touch("key3");
        lru.remove("key2");

        assert_eq!(lru.len(), 2);
        assert!(!lru.contains("key2"));
        assert_eq!(lru.evict_oldest(), Some("key1".to_string()));
        assert_eq!(lru.evict_oldest(), Some("key3".to_string()));
        assert_eq!(lru.evict_oldest(), None);
    }

    #[test]
    fn test_lru_order_after_multiple_touches() {
        let mut lru = LruTracker::new();

        // touch(a), touch(b), touch(c) -> [c, b, a]
        lru.touch("a");
        lru.touch("b");
        lru.touch("c");

        // touch(a) -> [a, c, b], touch(c) -> [c, a, b], touch(b) -> [b, c, a]
        lru.touch("a");
        lru.touch("c");
        lru.touch("b");

        assert_eq!(lru.evict_oldest(), Some("a".to_string()));
        assert_eq!(lru.evict_oldest(), Some("c".to_string()));
        assert_eq!(lru.evict_oldest(), Some("b".to_string()));
    }

    #[test]
    fn test_lru_touch_same_key_multiple_times() {
        let mut lru = LruTracker::new();

        lru.touch("key1");
        lru.touch("key1");
        lru.touch("key1");

        assert_eq!(lru.len(), 1);
        assert_eq!(lru.evict_oldest(), Some("key1".to_string()));
        assert!(lru.is_empty());
        assert_eq!(lru.evict_oldest(), None);
    }

    #[test]
    fn test_lru_compaction_keeps_order() {
        let mut lru = LruTracker::new();

        lru.touch("cold");
        lru.touch("hot");
        for _ in 0..500 {
            lru.touch("hot");
        }

        assert!(lru.order.len() <= lru.live.len() * 2 + COMPACT_SLACK + 1);
        assert_eq!(lru.evict_oldest(), Some("cold".to_string()));
        assert_eq!(lru.evict_oldest(), Some("hot".to_string()));
    }

    #[test]
    fn test_lru_clear() {
        let mut lru = LruTracker::new();
        lru.touch("a");
        lru.touch("b");
        lru.clear();

        assert!(lru.is_empty());
        assert_eq!(lru.evict_oldest(), None);
    }
}
