//! Configuration Module
//!
//! Handles loading and validating service configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::cache::{ReadFailurePolicy, ReadThroughConfig};
use crate::error::{CacheError, Result};

/// Default upstream source for the todo list.
pub const DEFAULT_UPSTREAM_URL: &str = "https://jsonplaceholder.typicode.com/todos";

/// Longest accepted `CACHE_TTL`, one year.
pub const MAX_CACHE_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// URL of the upstream JSON source
    pub upstream_url: String,
    /// Store key the upstream payload is cached under
    pub cache_key: String,
    /// Freshness of the cached payload in seconds
    pub cache_ttl: u64,
    /// Upstream fetch bound in seconds, 0 = unbounded
    pub fetch_timeout: u64,
    /// Behaviour when the store cannot be read
    pub read_policy: ReadFailurePolicy,
    /// Collapse concurrent misses for one key into a single fetch
    pub dedupe_inflight: bool,
    /// Redis connection URL; the in-memory store is used when unset
    pub redis_url: Option<String>,
    /// Maximum number of entries the in-memory store can hold
    pub max_entries: usize,
    /// In-memory store expiry sweep interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `PORT` - HTTP server port (default: 8000)
    /// - `UPSTREAM_URL` - Upstream JSON source (default: jsonplaceholder todos)
    /// - `CACHE_KEY` - Cache key for the payload (default: "cache")
    /// - `CACHE_TTL` - Freshness in seconds (default: 30)
    /// - `FETCH_TIMEOUT` - Upstream timeout in seconds, 0 disables (default: 10)
    /// - `STORE_READ_POLICY` - `fail-closed` or `fail-open` (default: fail-closed)
    /// - `DEDUPE_INFLIGHT` - `true`/`false` (default: true)
    /// - `REDIS_URL` - Redis URL (default: unset, in-memory store)
    /// - `MAX_ENTRIES` - In-memory store capacity (default: 1000)
    /// - `CLEANUP_INTERVAL` - In-memory sweep frequency in seconds (default: 1)
    ///
    /// Malformed numbers fall back to their default with a warning. An
    /// unknown `STORE_READ_POLICY` is an error, since guessing it would
    /// silently change failure behaviour.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            server_port: parse_var("PORT").unwrap_or(defaults.server_port),
            upstream_url: env::var("UPSTREAM_URL").unwrap_or(defaults.upstream_url),
            cache_key: env::var("CACHE_KEY").unwrap_or(defaults.cache_key),
            cache_ttl: parse_var("CACHE_TTL").unwrap_or(defaults.cache_ttl),
            fetch_timeout: parse_var("FETCH_TIMEOUT").unwrap_or(defaults.fetch_timeout),
            read_policy: parse_read_policy(env::var("STORE_READ_POLICY").ok())?
                .unwrap_or(defaults.read_policy),
            dedupe_inflight: parse_var("DEDUPE_INFLIGHT").unwrap_or(defaults.dedupe_inflight),
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
            max_entries: parse_var("MAX_ENTRIES").unwrap_or(defaults.max_entries),
            cleanup_interval: parse_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
        })
    }

    /// Rejects settings the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.cache_key.is_empty() {
            return Err(CacheError::InvalidConfiguration(
                "CACHE_KEY cannot be empty".to_string(),
            ));
        }
        if self.cache_ttl == 0 {
            return Err(CacheError::InvalidConfiguration(
                "CACHE_TTL must be positive".to_string(),
            ));
        }
        if self.cache_ttl > MAX_CACHE_TTL_SECS {
            return Err(CacheError::InvalidConfiguration(format!(
                "CACHE_TTL cannot exceed {} seconds",
                MAX_CACHE_TTL_SECS
            )));
        }
        if self.max_entries == 0 {
            return Err(CacheError::InvalidConfiguration(
                "MAX_ENTRIES must be positive".to_string(),
            ));
        }
        if self.cleanup_interval == 0 {
            return Err(CacheError::InvalidConfiguration(
                "CLEANUP_INTERVAL must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Freshness of the cached payload.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    /// Orchestrator settings derived from this configuration.
    pub fn read_through(&self) -> ReadThroughConfig {
        ReadThroughConfig {
            read_policy: self.read_policy,
            fetch_timeout: (self.fetch_timeout > 0).then(|| Duration::from_secs(self.fetch_timeout)),
            dedupe_inflight: self.dedupe_inflight,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8000,
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            cache_key: "cache".to_string(),
            cache_ttl: 30,
            fetch_timeout: 10,
            read_policy: ReadFailurePolicy::FailClosed,
            dedupe_inflight: true,
            redis_url: None,
            max_entries: 1000,
            cleanup_interval: 1,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(variable = name, value = %raw, "ignoring malformed setting, using default");
            None
        }
    }
}

fn parse_read_policy(raw: Option<String>) -> Result<Option<ReadFailurePolicy>> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some),
    }
}
