//! In-Memory Store Module
//!
//! HashMap storage with LRU capacity eviction and TTL expiration, exposed
//! through [`KeyValueStore`] for local runs and tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{KeyValueStore, LruTracker, StoredEntry, MAX_KEY_LENGTH, MAX_VALUE_SIZE};
use crate::error::{CacheError, Result};

// == Memory Cache ==
/// Synchronous storage engine behind [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryCache {
    /// Key-value storage
    entries: HashMap<String, StoredEntry>,
    /// LRU access tracker
    lru: LruTracker,
    /// Maximum number of entries allowed
    max_entries: usize,
}

impl MemoryCache {
    /// Creates an empty engine holding at most `max_entries` keys.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            max_entries,
        }
    }

    // == Set ==
    /// Stores a value with the given lifetime.
    ///
    /// Overwrites reset the lifetime. At capacity the least recently used
    /// entry is evicted first.
    pub fn set(&mut self, key: &str, value: String, ttl: Duration) -> Result<()> {
        if key.len() > MAX_KEY_LENGTH {
            return Err(CacheError::InvalidConfiguration(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            )));
        }
        if value.len() > MAX_VALUE_SIZE {
            return Err(CacheError::InvalidConfiguration(format!(
                "Value exceeds maximum size of {} bytes",
                MAX_VALUE_SIZE
            )));
        }

        if !self.entries.contains_key(key) && self.entries.len() >= self.max_entries {
            if let Some(evicted) = self.lru.evict_oldest() {
                debug!(key = %evicted, "evicting least recently used entry");
                self.entries.remove(&evicted);
            }
        }

        self.entries
            .insert(key.to_string(), StoredEntry::new(value, ttl));
        self.lru.touch(key);
        Ok(())
    }

    // == Get ==
    /// Returns the value if present and unexpired. Expired entries are dropped.
    pub fn get(&mut self, key: &str) -> Option<String> {
        if self.entries.get(key)?.is_expired() {
            self.remove_entry(key);
            return None;
        }

        self.lru.touch(key);
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Removes a key. Returns whether a live entry was removed.
    pub fn delete(&mut self, key: &str) -> bool {
        match self.remove_entry(key) {
            Some(entry) => !entry.is_expired(),
            None => false,
        }
    }

    /// Resets the lifetime of a live key.
    pub fn expire(&mut self, key: &str, ttl: Duration) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) if !entry.is_expired() => {
                entry.expire_in(ttl);
                true
            }
            Some(_) => {
                self.remove_entry(key);
                false
            }
            None => false,
        }
    }

    // == Cleanup Expired ==
    /// Removes all expired entries and returns how many were dropped.
    pub fn cleanup_expired(&mut self) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove_entry(key);
        }
        expired.len()
    }

    /// Number of entries held, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn remove_entry(&mut self, key: &str) -> Option<StoredEntry> {
        self.lru.remove(key);
        self.entries.remove(key)
    }
}

// == Memory Store ==
/// Shared handle to a [`MemoryCache`].
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryCache>>,
}

impl MemoryStore {
    /// Creates a store holding at most `max_entries` keys.
    pub fn new(max_entries: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryCache::new(max_entries))),
        }
    }

    /// The engine, for the background expiry sweep.
    pub fn shared(&self) -> Arc<RwLock<MemoryCache>> {
        Arc::clone(&self.inner)
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        // Write lock: reads refresh LRU order and drop expired entries
        Ok(self.inner.write().await.get(key))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        self.inner.write().await.set(key, value, ttl)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.inner.write().await.delete(key))
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        Ok(self.inner.write().await.expire(key, ttl))
    }
}
