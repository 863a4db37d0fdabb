//! Upstream Module
//!
//! HTTP client for the slow JSON source the cache sits in front of.

use serde_json::Value;
use tracing::{debug, info};

use crate::error::{CacheError, Result};

// == Upstream Client ==
/// GETs a fixed URL and returns its JSON body.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    url: String,
}

impl UpstreamClient {
    /// Creates a client for `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
        }
    }

    /// Fetches and decodes the upstream payload.
    ///
    /// Connection failures, non-2xx statuses and undecodable bodies are all
    /// reported as `UpstreamFetchFailed`.
    pub async fn fetch_json(&self) -> Result<Value> {
        debug!(url = %self.url, "fetching upstream");

        let response = self.http.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CacheError::UpstreamFetchFailed(format!(
                "upstream responded with {}",
                status
            )));
        }

        let body: Value = response.json().await?;
        info!(url = %self.url, "fetched upstream payload");
        Ok(body)
    }
}
