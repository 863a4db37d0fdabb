//! API Handlers
//!
//! HTTP request handlers for each endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use tracing::info;

use crate::cache::{Origin, ReadThroughCache};
use crate::config::Config;
use crate::error::Result;
use crate::models::{HealthResponse, InvalidateResponse, StatsResponse};
use crate::store::KeyValueStore;
use crate::upstream::UpstreamClient;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Read-through cache over the configured store
    pub cache: Arc<ReadThroughCache>,
    /// Source of the todo list
    pub upstream: UpstreamClient,
    /// Key the todo list is cached under
    pub todo_key: String,
    /// Freshness of the cached todo list
    pub ttl: Duration,
}

impl AppState {
    pub fn new(
        cache: ReadThroughCache,
        upstream: UpstreamClient,
        todo_key: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            cache: Arc::new(cache),
            upstream,
            todo_key: todo_key.into(),
            ttl,
        }
    }

    /// Creates a new AppState from configuration over the given store.
    pub fn from_config(config: &Config, store: Arc<dyn KeyValueStore>) -> Self {
        let cache = ReadThroughCache::new(store, config.read_through());
        Self::new(
            cache,
            UpstreamClient::new(config.upstream_url.clone()),
            config.cache_key.clone(),
            config.ttl(),
        )
    }
}

/// Handler for GET /
pub async fn root_handler() -> &'static str {
    "hello world"
}

/// Handler for GET /get-todo
///
/// Serves the upstream todo list through the cache.
pub async fn get_todo_handler(State(state): State<AppState>) -> Result<Json<Value>> {
    let upstream = &state.upstream;
    let fetched = state
        .cache
        .get_or_fetch(&state.todo_key, state.ttl, || upstream.fetch_json())
        .await?;

    match fetched.origin {
        Origin::Cache => info!(key = %state.todo_key, "Returning from cache"),
        Origin::Upstream => info!(key = %state.todo_key, "Returning from API"),
    }

    Ok(Json(fetched.into_inner()))
}

/// Handler for DELETE /cache/:key
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<InvalidateResponse>> {
    let removed = state.cache.invalidate(&key).await?;
    Ok(Json(InvalidateResponse::new(key, removed)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.cache.stats().into())
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.cache.store().name()))
}
