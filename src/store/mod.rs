//! Store Module
//!
//! The key-value store the read-through cache sits on, plus the narrow
//! data-structure capabilities the external store offers.
//!
//! # Backends
//! - [`RedisStore`] - external Redis server, used in production
//! - [`MemoryStore`] - in-process TTL store for local runs and tests

mod capabilities;
mod entry;
mod lru;
mod memory;
mod redis_store;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

pub use capabilities::{HashOps, ListOps, SetOps, StreamCursor, StreamEntry, StreamOps};
pub use entry::StoredEntry;
pub use lru::LruTracker;
pub use memory::{MemoryCache, MemoryStore};
pub use redis_store::RedisStore;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB

// == Key-Value Store ==
/// String get/set/expire/delete primitives with store-enforced expiry.
///
/// A value written with `set(key, value, ttl)` must read back as absent once
/// `ttl` has elapsed, whether or not anyone touches the key in between.
/// Every failure is reported as `CacheError::StoreUnavailable`.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Short backend name for logs and the health endpoint.
    fn name(&self) -> &'static str;

    /// Returns the value, or None when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores the value, replacing any previous one, readable for `ttl`.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    /// Removes the key. Returns whether it existed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Resets the key's lifetime to `ttl`. Returns whether the key existed.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;
}
