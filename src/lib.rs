//! Todo Cache - read-through caching in front of a slow JSON source
//!
//! Serves an upstream todo list over HTTP, keeping a copy in Redis or an
//! in-memory store for a bounded time.

pub mod api;
pub mod cache;
pub mod config;
pub mod demos;
pub mod error;
pub mod models;
pub mod store;
pub mod tasks;
pub mod upstream;

pub use api::{create_router, AppState};
pub use cache::{ReadFailurePolicy, ReadThroughCache, ReadThroughConfig};
pub use config::Config;
pub use error::{CacheError, Result};
pub use store::{KeyValueStore, MemoryStore, RedisStore};
pub use tasks::spawn_cleanup_task;
pub use upstream::UpstreamClient;
