//! Cache Module
//!
//! Read-through caching in front of a slow upstream source. Values live in a
//! [`KeyValueStore`]; the store enforces expiry, this layer decides when to
//! read it, when to go upstream and when to repopulate it.

mod inflight;
mod stats;


use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::error::{CacheError, Result};
use crate::store::KeyValueStore;
use inflight::{InflightFetches, Slot};

pub use stats::CacheStats;
use stats::StatsCounters;

// == Read Failure Policy ==
/// What to do when the store cannot be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadFailurePolicy {
    /// Surface `StoreUnavailable` to the caller
    #[default]
    FailClosed,
    /// Log the failure and treat the read as a miss
    FailOpen,
}

impl FromStr for ReadFailurePolicy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fail-closed" | "closed" => Ok(ReadFailurePolicy::FailClosed),
            "fail-open" | "open" => Ok(ReadFailurePolicy::FailOpen),
            other => Err(CacheError::InvalidConfiguration(format!(
                "unknown store read policy '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for ReadFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadFailurePolicy::FailClosed => f.write_str("fail-closed"),
            ReadFailurePolicy::FailOpen => f.write_str("fail-open"),
        }
    }
}

// == Configuration ==
/// Orchestrator behaviour. The default is the minimal contract: fail closed,
/// no fetch bound, no deduplication.
#[derive(Debug, Clone, Default)]
pub struct ReadThroughConfig {
    /// Behaviour when the store read fails
    pub read_policy: ReadFailurePolicy,
    /// Upper bound on a single upstream fetch
    pub fetch_timeout: Option<Duration>,
    /// Share one fetch between concurrent misses of the same key
    pub dedupe_inflight: bool,
}

impl ReadThroughConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the store read failure policy.
    pub fn with_read_policy(mut self, policy: ReadFailurePolicy) -> Self {
        self.read_policy = policy;
        self
    }

    /// Bound every upstream fetch.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Enable or disable in-flight deduplication.
    pub fn with_dedupe(mut self, enabled: bool) -> Self {
        self.dedupe_inflight = enabled;
        self
    }
}

// == Fetched ==
/// Where a returned value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Unexpired value read from the store
    Cache,
    /// Fresh value from the upstream source, possibly another request's fetch
    Upstream,
}

/// A value together with its origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub value: T,
    pub origin: Origin,
}

impl<T> Fetched<T> {
    fn cached(value: T) -> Self {
        Self {
            value,
            origin: Origin::Cache,
        }
    }

    fn upstream(value: T) -> Self {
        Self {
            value,
            origin: Origin::Upstream,
        }
    }

    pub fn is_hit(&self) -> bool {
        self.origin == Origin::Cache
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

// == Read-Through Cache ==
/// Read-through cache over an explicitly passed store handle.
///
/// # Example
///
/// ```ignore
/// let cache = ReadThroughCache::new(store, ReadThroughConfig::default());
/// let todos = cache
///     .get_or_fetch("cache", Duration::from_secs(30), || upstream.fetch_json())
///     .await?;
/// ```
pub struct ReadThroughCache {
    store: Arc<dyn KeyValueStore>,
    config: ReadThroughConfig,
    inflight: InflightFetches,
    stats: StatsCounters,
}

impl ReadThroughCache {
    /// Create a cache over `store`.
    pub fn new(store: Arc<dyn KeyValueStore>, config: ReadThroughConfig) -> Self {
        Self {
            store,
            config,
            inflight: InflightFetches::default(),
            stats: StatsCounters::default(),
        }
    }

    /// Get a reference to the store.
    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    /// Current counters.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    /// Return the value cached under `key`, or fetch, store and return it.
    ///
    /// The store is read once, and once more by the request that leads a
    /// deduplicated fetch, since an earlier leader may have filled the key in
    /// between. On a hit `fetch` is never called. On a miss
    /// `fetch` runs at most once; its error is returned unchanged and nothing
    /// is stored. A successful result is written once with expiry `ttl`; a
    /// failed write is logged and the fetched value is still returned.
    ///
    /// Fails with `InvalidConfiguration` before any I/O when `key` is empty
    /// or `ttl` is zero.
    pub async fn get_or_fetch<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        fetch: F,
    ) -> Result<Fetched<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        validate(key, ttl)?;

        if let Some((value, _)) = self.read_cached(key).await? {
            self.stats.record_hit();
            debug!(key = %key, "cache hit");
            return Ok(Fetched::cached(value));
        }
        self.stats.record_miss();
        debug!(key = %key, "cache miss");

        if !self.config.dedupe_inflight {
            let (value, _) = self.fetch_and_store(key, ttl, fetch).await?;
            return Ok(Fetched::upstream(value));
        }

        match self.inflight.join(key) {
            Slot::Leader(guard) => {
                match self.read_cached::<T>(key).await {
                    Ok(Some((value, payload))) => {
                        debug!(key = %key, "filled by previous fetch");
                        guard.complete(Ok(payload));
                        return Ok(Fetched::cached(value));
                    }
                    Ok(None) => {}
                    Err(err) => {
                        guard.complete(Err(err.clone()));
                        return Err(err);
                    }
                }

                let outcome = self.fetch_and_store(key, ttl, fetch).await;
                guard.complete(match &outcome {
                    Ok((_, payload)) => Ok(payload.clone()),
                    Err(err) => Err(err.clone()),
                });
                outcome.map(|(value, _)| Fetched::upstream(value))
            }
            Slot::Waiter(waiter) => {
                self.stats.record_coalesced();
                debug!(key = %key, "joining in-flight fetch");
                let payload = waiter.outcome().await?;
                let value = serde_json::from_str(&payload)
                    .map_err(|e| CacheError::Serialization(e.to_string()))?;
                Ok(Fetched::upstream(value))
            }
        }
    }

    /// Drop the cached value for `key`. Returns whether one existed.
    pub async fn invalidate(&self, key: &str) -> Result<bool> {
        if key.is_empty() {
            return Err(CacheError::InvalidConfiguration(
                "cache key cannot be empty".to_string(),
            ));
        }
        let removed = self.store.delete(key).await?;
        debug!(key = %key, removed, "cache invalidated");
        Ok(removed)
    }

    /// Decoded value and its raw payload, or None on a miss.
    async fn read_cached<T: DeserializeOwned>(&self, key: &str) -> Result<Option<(T, String)>> {
        let raw = match self.store.get(key).await {
            Ok(raw) => raw,
            Err(err) => {
                self.stats.record_read_error();
                return match self.config.read_policy {
                    ReadFailurePolicy::FailClosed => Err(err),
                    ReadFailurePolicy::FailOpen => {
                        warn!(key = %key, error = %err, "store read failed, bypassing cache");
                        Ok(None)
                    }
                };
            }
        };

        let Some(raw) = raw else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some((value, raw))),
            Err(err) => {
                // Overwritten by the fill that follows
                warn!(key = %key, error = %err, "discarding undecodable cached value");
                Ok(None)
            }
        }
    }

    async fn fetch_and_store<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        fetch: F,
    ) -> Result<(T, String)>
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.stats.record_fetch();
        let fetched = match self.config.fetch_timeout {
            Some(limit) => match tokio::time::timeout(limit, fetch()).await {
                Ok(result) => result,
                Err(_) => Err(CacheError::UpstreamTimeout(limit)),
            },
            None => fetch().await,
        };

        let value = match fetched {
            Ok(value) => value,
            Err(err) => {
                self.stats.record_fetch_failure();
                error!(key = %key, error = %err, "upstream fetch failed");
                return Err(err);
            }
        };

        let payload =
            serde_json::to_string(&value).map_err(|e| CacheError::Serialization(e.to_string()))?;

        if let Err(err) = self.store.set(key, payload.clone(), ttl).await {
            self.stats.record_write_error();
            warn!(key = %key, error = %err, "failed to populate cache, serving fetched value");
        }

        Ok((value, payload))
    }
}

fn validate(key: &str, ttl: Duration) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidConfiguration(
            "cache key cannot be empty".to_string(),
        ));
    }
    if ttl.is_zero() {
        return Err(CacheError::InvalidConfiguration(
            "ttl must be positive".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use crate::store::MemoryStore;

    const TTL: Duration = Duration::from_secs(30);

    /// Memory store whose reads and writes can be switched off.
    struct FlakyStore {
        inner: MemoryStore,
        fail_reads: AtomicBool,
        fail_writes: AtomicBool,
        writes: AtomicUsize,
    }

    impl FlakyStore {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                inner: MemoryStore::new(100),
                fail_reads: AtomicBool::new(false),
                fail_writes: AtomicBool::new(false),
                writes: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl KeyValueStore for FlakyStore {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn get(&self, key: &str) -> Result<Option<String>> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(CacheError::StoreUnavailable("connection refused".into()));
            }
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(CacheError::StoreUnavailable("connection reset".into()));
            }
            self.inner.set(key, value, ttl).await
        }

        async fn delete(&self, key: &str) -> Result<bool> {
            self.inner.delete(key).await
        }

        async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
            self.inner.expire(key, ttl).await
        }
    }

    fn cache_over(store: Arc<FlakyStore>, config: ReadThroughConfig) -> ReadThroughCache {
        ReadThroughCache::new(store, config)
    }

    fn todos() -> Value {
        json!([{ "id": 1, "title": "x" }])
    }

    fn must_not_fetch() -> Result<Value> {
        panic!("fetch must not run");
    }

    #[tokio::test]
    async fn test_hit_skips_fetch() {
        let store = FlakyStore::new();
        store
            .set("todos", todos().to_string(), TTL)
            .await
            .unwrap();
        let cache = cache_over(store, ReadThroughConfig::default());

        let fetched: Fetched<Value> = cache
            .get_or_fetch("todos", TTL, || async { must_not_fetch() })
            .await
            .unwrap();

        assert_eq!(fetched.value, todos());
        assert!(fetched.is_hit());
        assert_eq!(cache.stats().hits, 1);
    }

    #[tokio::test]
    async fn test_miss_fetches_once_then_hits() {
        let store = FlakyStore::new();
        let cache = cache_over(store.clone(), ReadThroughConfig::default());
        let calls = AtomicUsize::new(0);
        let counter = &calls;

        for expected_origin in [Origin::Upstream, Origin::Cache] {
            let fetched = cache
                .get_or_fetch("todos", TTL, move || async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(todos())
                })
                .await
                .unwrap();
            assert_eq!(fetched.value, todos());
            assert_eq!(fetched.origin, expected_origin);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.writes.load(Ordering::SeqCst), 1);
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.upstream_fetches), (1, 1, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_value_is_refetched() {
        let store = FlakyStore::new();
        let cache = cache_over(store, ReadThroughConfig::default());
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let fetch = move || async move {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            Ok(json!({ "version": n }))
        };

        let first: Fetched<Value> = cache.get_or_fetch("todos", TTL, fetch).await.unwrap();
        tokio::time::advance(TTL - Duration::from_millis(1)).await;
        let within: Fetched<Value> = cache.get_or_fetch("todos", TTL, fetch).await.unwrap();
        tokio::time::advance(Duration::from_millis(2)).await;
        let after: Fetched<Value> = cache.get_or_fetch("todos", TTL, fetch).await.unwrap();

        assert_eq!(first.value, json!({ "version": 0 }));
        assert_eq!(within.value, json!({ "version": 0 }));
        assert!(within.is_hit());
        assert_eq!(after.value, json!({ "version": 1 }));
        assert_eq!(after.origin, Origin::Upstream);
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates_and_is_not_cached() {
        let store = FlakyStore::new();
        let cache = cache_over(store.clone(), ReadThroughConfig::default());

        let result: Result<Fetched<Value>> = cache
            .get_or_fetch("todos", TTL, || async {
                Err(CacheError::UpstreamFetchFailed("network error".into()))
            })
            .await;

        assert_eq!(
            result.unwrap_err(),
            CacheError::UpstreamFetchFailed("network error".into())
        );
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
        assert_eq!(store.get("todos").await.unwrap(), None);
        assert_eq!(cache.stats().upstream_failures, 1);
    }

    #[tokio::test]
    async fn test_write_failure_still_returns_value() {
        let store = FlakyStore::new();
        store.fail_writes.store(true, Ordering::SeqCst);
        let cache = cache_over(store.clone(), ReadThroughConfig::default());

        let fetched = cache
            .get_or_fetch("todos", TTL, || async { Ok(todos()) })
            .await
            .unwrap();

        assert_eq!(fetched.value, todos());
        assert_eq!(cache.stats().store_write_errors, 1);
    }

    #[tokio::test]
    async fn test_read_failure_fail_closed_surfaces_error() {
        let store = FlakyStore::new();
        store.fail_reads.store(true, Ordering::SeqCst);
        let cache = cache_over(store, ReadThroughConfig::default());

        let result: Result<Fetched<Value>> = cache
            .get_or_fetch("todos", TTL, || async { must_not_fetch() })
            .await;

        assert!(matches!(result, Err(CacheError::StoreUnavailable(_))));
        assert_eq!(cache.stats().store_read_errors, 1);
    }

    #[tokio::test]
    async fn test_read_failure_fail_open_fetches() {
        let store = FlakyStore::new();
        store.fail_reads.store(true, Ordering::SeqCst);
        let config = ReadThroughConfig::new().with_read_policy(ReadFailurePolicy::FailOpen);
        let cache = cache_over(store, config);

        let fetched = cache
            .get_or_fetch("todos", TTL, || async { Ok(todos()) })
            .await
            .unwrap();

        assert_eq!(fetched.origin, Origin::Upstream);
        assert_eq!(cache.stats().misses, 1);
    }

    #[tokio::test]
    async fn test_invalid_arguments_fail_before_io() {
        let store = FlakyStore::new();
        store.fail_reads.store(true, Ordering::SeqCst);
        let cache = cache_over(store, ReadThroughConfig::default());

        let empty_key: Result<Fetched<Value>> =
            cache.get_or_fetch("", TTL, || async { Ok(todos()) }).await;
        let zero_ttl: Result<Fetched<Value>> = cache
            .get_or_fetch("todos", Duration::ZERO, || async { Ok(todos()) })
            .await;

        assert!(matches!(empty_key, Err(CacheError::InvalidConfiguration(_))));
        assert!(matches!(zero_ttl, Err(CacheError::InvalidConfiguration(_))));
        assert_eq!(cache.stats().store_read_errors, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_writes_nothing() {
        let store = FlakyStore::new();
        let config = ReadThroughConfig::new().with_fetch_timeout(Duration::from_secs(2));
        let cache = cache_over(store.clone(), config);

        let result: Result<Fetched<Value>> = cache
            .get_or_fetch("todos", TTL, || async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(todos())
            })
            .await;

        assert_eq!(
            result.unwrap_err(),
            CacheError::UpstreamTimeout(Duration::from_secs(2))
        );
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_undecodable_cached_value_is_refetched() {
        let store = FlakyStore::new();
        store
            .set("todos", "not json".to_string(), TTL)
            .await
            .unwrap();
        let cache = cache_over(store.clone(), ReadThroughConfig::default());

        let fetched = cache
            .get_or_fetch("todos", TTL, || async { Ok(todos()) })
            .await
            .unwrap();

        assert_eq!(fetched.origin, Origin::Upstream);
        assert_eq!(store.get("todos").await.unwrap(), Some(todos().to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_misses_without_dedupe_both_fetch() {
        let store = FlakyStore::new();
        let cache = cache_over(store.clone(), ReadThroughConfig::default());
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let fetch = move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(todos())
        };

        let (a, b) = tokio::join!(
            cache.get_or_fetch::<Value, _, _>("todos", TTL, fetch),
            cache.get_or_fetch::<Value, _, _>("todos", TTL, fetch),
        );

        assert_eq!(a.unwrap().value, todos());
        assert_eq!(b.unwrap().value, todos());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.writes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_misses_with_dedupe_share_one_fetch() {
        let store = FlakyStore::new();
        let cache = cache_over(store.clone(), ReadThroughConfig::new().with_dedupe(true));
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let fetch = move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(todos())
        };

        let (a, b, c) = tokio::join!(
            cache.get_or_fetch::<Value, _, _>("todos", TTL, fetch),
            cache.get_or_fetch::<Value, _, _>("todos", TTL, fetch),
            cache.get_or_fetch::<Value, _, _>("todos", TTL, fetch),
        );

        for fetched in [a, b, c] {
            let fetched = fetched.unwrap();
            assert_eq!(fetched.value, todos());
            assert_eq!(fetched.origin, Origin::Upstream);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.writes.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats().coalesced, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dedupe_shares_failure() {
        let store = FlakyStore::new();
        let cache = cache_over(store, ReadThroughConfig::new().with_dedupe(true));
        let fetch = || async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Err::<Value, _>(CacheError::UpstreamFetchFailed("502".into()))
        };

        let (a, b) = tokio::join!(
            cache.get_or_fetch::<Value, _, _>("todos", TTL, fetch),
            cache.get_or_fetch::<Value, _, _>("todos", TTL, fetch),
        );

        assert_eq!(a.unwrap_err(), CacheError::UpstreamFetchFailed("502".into()));
        assert_eq!(b.unwrap_err(), CacheError::UpstreamFetchFailed("502".into()));
        assert_eq!(cache.stats().upstream_fetches, 1);
    }

    #[tokio::test]
    async fn test_cancelled_leader_fails_waiters() {
        let store = FlakyStore::new();
        let cache = Arc::new(cache_over(store, ReadThroughConfig::new().with_dedupe(true)));
        let (started_tx, started_rx) = tokio::sync::oneshot::channel::<()>();

        let leader = tokio::spawn({
            let cache = Arc::clone(&cache);
            async move {
                cache
                    .get_or_fetch::<Value, _, _>("todos", TTL, || async move {
                        let _ = started_tx.send(());
                        std::future::pending::<Result<Value>>().await
                    })
                    .await
            }
        });
        started_rx.await.unwrap();

        let waiter = tokio::spawn({
            let cache = Arc::clone(&cache);
            async move {
                cache
                    .get_or_fetch::<Value, _, _>("todos", TTL, || async { must_not_fetch() })
                    .await
            }
        });
        while cache.stats().coalesced == 0 {
            tokio::task::yield_now().await;
        }

        leader.abort();

        let result = waiter.await.unwrap();
        assert_eq!(
            result.unwrap_err(),
            CacheError::UpstreamFetchFailed(inflight::CANCELLED.to_string())
        );
        assert_eq!(cache.inflight.len(), 0);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let store = FlakyStore::new();
        let cache = cache_over(store, ReadThroughConfig::default());
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let fetch = move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(todos())
        };

        cache.get_or_fetch::<Value, _, _>("todos", TTL, fetch).await.unwrap();
        assert!(cache.invalidate("todos").await.unwrap());
        assert!(!cache.invalidate("todos").await.unwrap());
        cache.get_or_fetch::<Value, _, _>("todos", TTL, fetch).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    /// Store that reports a miss for its first `hidden_reads` reads, as if
    /// another request filled the key right after them.
    struct LateFillStore {
        inner: MemoryStore,
        hidden_reads: AtomicUsize,
    }

    #[async_trait]
    impl KeyValueStore for LateFillStore {
        fn name(&self) -> &'static str {
            "late-fill"
        }

        async fn get(&self, key: &str) -> Result<Option<String>> {
            let hidden = self
                .hidden_reads
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if hidden {
                return Ok(None);
            }
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
            self.inner.set(key, value, ttl).await
        }

        async fn delete(&self, key: &str) -> Result<bool> {
            self.inner.delete(key).await
        }

        async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
            self.inner.expire(key, ttl).await
        }
    }

    #[tokio::test]
    async fn test_new_leader_rechecks_store_before_fetching() {
        let inner = MemoryStore::new(10);
        inner.set("todos", todos().to_string(), TTL).await.unwrap();
        let store = Arc::new(LateFillStore {
            inner,
            hidden_reads: AtomicUsize::new(1),
        });
        let cache = ReadThroughCache::new(store, ReadThroughConfig::new().with_dedupe(true));

        let fetched: Fetched<Value> = cache
            .get_or_fetch("todos", TTL, || async { must_not_fetch() })
            .await
            .unwrap();

        assert_eq!(fetched.value, todos());
        assert_eq!(fetched.origin, Origin::Cache);
        assert_eq!(cache.stats().upstream_fetches, 0);
        assert_eq!(cache.inflight.len(), 0);
    }

    #[tokio::test]
    async fn test_unrepresentable_ttl_does_not_panic() {
        let store = FlakyStore::new();
        let cache = cache_over(store.clone(), ReadThroughConfig::default());
        let ttl = Duration::from_secs(u64::MAX);

        let first = cache
            .get_or_fetch("cache", ttl, || async { Ok(json!([1])) })
            .await
            .unwrap();
        let second: Fetched<Value> = cache
            .get_or_fetch("cache", ttl, || async { must_not_fetch() })
            .await
            .unwrap();

        assert_eq!(first.value, json!([1]));
        assert!(second.is_hit());
        assert_eq!(store.writes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_read_policy_parse() {
        assert_eq!(
            "fail-open".parse::<ReadFailurePolicy>().unwrap(),
            ReadFailurePolicy::FailOpen
        );
        assert_eq!(
            "FAIL-CLOSED".parse::<ReadFailurePolicy>().unwrap(),
            ReadFailurePolicy::FailClosed
        );
        assert!("sometimes".parse::<ReadFailurePolicy>().is_err());
        assert_eq!(ReadFailurePolicy::FailOpen.to_string(), "fail-open");
    }
}
