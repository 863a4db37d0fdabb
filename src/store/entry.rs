//! Stored Entry Module
//!
//! A serialized value held by the in-memory store together with its deadline.

use std::time::Duration;

use tokio::time::Instant;

// == Stored Entry ==
/// A single value in the in-memory store.
#[derive(Debug, Clone)]
pub struct StoredEntry {
    /// Serialized payload, opaque to the store
    pub value: String,
    /// Deadline after which the entry is unreadable, None = no expiration
    pub expires_at: Option<Instant>,
}

impl StoredEntry {
    // == Constructor ==
    /// Creates an entry that expires `ttl` from now.
    ///
    /// A `ttl` too large to represent as a deadline never expires.
    pub fn new(value: String, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: deadline(ttl),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches its deadline, so a
    /// value stored with ttl `T` is gone when read at exactly `T`.
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Replaces the deadline with one `ttl` from now.
    pub fn expire_in(&mut self, ttl: Duration) {
        self.expires_at = deadline(ttl);
    }
}

fn deadline(ttl: Duration) -> Option<Instant> {
    Instant::now().checked_add(ttl)
}
