//! LRU Tracker Module
//!
//! Access-order bookkeeping for capacity eviction in the in-memory store.

use std::collections::{BTreeMap, HashMap};

// == LRU Tracker ==
/// Tracks access order for LRU eviction.
///
/// Every touch stamps the key with a fresh tick; the smallest tick is the
/// least recently used key.
#[derive(Debug, Default)]
pub struct LruTracker {
    /// Monotonic access counter
    tick: u64,
    /// Tick -> key, ordered oldest first
    order: BTreeMap<u64, String>,
    /// Key -> its current tick
    ticks: HashMap<String, u64>,
}

impl LruTracker {
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a key as most recently used.
    pub fn touch(&mut self, key: &str) {
        self.tick += 1;
        if let Some(previous) = self.ticks.insert(key.to_string(), self.tick) {
            self.order.remove(&previous);
        }
        self.order.insert(self.tick, key.to_string());
    }

    /// Stops tracking a key.
    pub fn remove(&mut self, key: &str) {
        if let Some(tick) = self.ticks.remove(key) {
            self.order.remove(&tick);
        }
    }

    /// Returns and removes the least recently used key.
    pub fn evict_oldest(&mut self) -> Option<String> {
        let (_, key) = self.order.pop_first()?;
        self.ticks.remove(&key);
        Some(key)
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }
}
