//! Error types for the todo cache service
//!
//! Provides unified error handling using thiserror.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

/// Body returned to clients for every failure. Internal details stay in the log.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong";

// == Cache Error Enum ==
/// Unified error type for the cache orchestrator and its collaborators.
///
/// `Clone` so a single in-flight fetch result can be handed to every waiter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Store read or write failed (connection, timeout, protocol)
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// The fallback fetch returned an error
    #[error("Upstream fetch failed: {0}")]
    UpstreamFetchFailed(String),

    /// The fallback fetch did not finish within the configured bound
    #[error("Upstream fetch timed out after {0:?}")]
    UpstreamTimeout(Duration),

    /// Empty key, non-positive ttl or an out-of-range setting
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A fetched value could not be encoded for storage
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CacheError {
    /// True for failures that originate in the upstream source.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            CacheError::UpstreamFetchFailed(_) | CacheError::UpstreamTimeout(_)
        )
    }
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::StoreUnavailable(err.to_string())
    }
}

impl From<reqwest::Error> for CacheError {
    fn from(err: reqwest::Error) -> Self {
        CacheError::UpstreamFetchFailed(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        error!(error = %self, "request failed");

        let body = Json(ErrorResponse::new(GENERIC_ERROR_MESSAGE));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache service.
pub type Result<T> = std::result::Result<T, CacheError>;
