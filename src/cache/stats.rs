//! Cache Statistics Module
//!
//! Counters for the read-through path, updated without locking.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Stats Counters ==
/// Live counters owned by the orchestrator.
#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    upstream_fetches: AtomicU64,
    upstream_failures: AtomicU64,
    store_read_errors: AtomicU64,
    store_write_errors: AtomicU64,
    coalesced: AtomicU64,
}

impl StatsCounters {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch(&self) {
        self.upstream_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch_failure(&self) {
        self.upstream_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_read_error(&self) {
        self.store_read_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write_error(&self) {
        self.store_write_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_coalesced(&self) {
        self.coalesced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            upstream_fetches: self.upstream_fetches.load(Ordering::Relaxed),
            upstream_failures: self.upstream_failures.load(Ordering::Relaxed),
            store_read_errors: self.store_read_errors.load(Ordering::Relaxed),
            store_write_errors: self.store_write_errors.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
        }
    }
}

// == Cache Stats ==
/// Point-in-time copy of the orchestrator counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Requests answered from the store
    pub hits: u64,
    /// Requests that found nothing usable in the store
    pub misses: u64,
    /// Calls made to the upstream source
    pub upstream_fetches: u64,
    /// Upstream calls that failed or timed out
    pub upstream_failures: u64,
    /// Store reads that failed
    pub store_read_errors: u64,
    /// Store writes that failed after a successful fetch
    pub store_write_errors: u64,
    /// Misses served by another request's in-flight fetch
    pub coalesced: u64,
}

impl CacheStats {
    /// Returns hits / (hits + misses), or 0.0 before any request.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
