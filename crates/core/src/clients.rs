//! Clients for the sibling Like and Collect services.
//!
//! The siblings are consumed at their interface boundary only: a trait per
//! service, with an HTTP implementation resolved from configuration. The
//! profile aggregator holds trait objects so tests can substitute fakes.

use async_trait::async_trait;
use serde::Deserialize;
use sparrow_common::{AppError, AppResult};

/// Like service interface.
#[async_trait]
pub trait LikeClient: Send + Sync {
    /// Number of items `user_id` has liked.
    async fn like_count(&self, user_id: i64) -> AppResult<i64>;

    /// Total likes received across everything `user_id` published.
    async fn total_liked(&self, user_id: i64) -> AppResult<i64>;
}

/// Collect service interface.
#[async_trait]
pub trait CollectClient: Send + Sync {
    /// Number of items `user_id` has collected.
    async fn collect_count(&self, user_id: i64) -> AppResult<i64>;
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: i64,
}

async fn fetch_count(http: &reqwest::Client, url: &str) -> AppResult<i64> {
    let response = http
        .get(url)
        .send()
        .await
        .map_err(|e| AppError::ExternalService(e.to_string()))?
        .error_for_status()
        .map_err(|e| AppError::ExternalService(e.to_string()))?;

    let body: CountResponse = response
        .json()
        .await
        .map_err(|e| AppError::ExternalService(e.to_string()))?;

    Ok(body.count)
}

/// HTTP client for the Like service.
#[derive(Clone)]
pub struct HttpLikeClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpLikeClient {
    /// Create a client against the given base URL.
    #[must_use]
    pub fn new(base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl LikeClient for HttpLikeClient {
    async fn like_count(&self, user_id: i64) -> AppResult<i64> {
        let url = format!("{}/like/count?userId={user_id}", self.base_url);
        fetch_count(&self.http, &url).await
    }

    async fn total_liked(&self, user_id: i64) -> AppResult<i64> {
        let url = format!("{}/like/received?userId={user_id}", self.base_url);
        fetch_count(&self.http, &url).await
    }
}

/// HTTP client for the Collect service.
#[derive(Clone)]
pub struct HttpCollectClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpCollectClient {
    /// Create a client against the given base URL.
    #[must_use]
    pub fn new(base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl CollectClient for HttpCollectClient {
    async fn collect_count(&self, user_id: i64) -> AppResult<i64> {
        let url = format!("{}/collect/count?userId={user_id}", self.base_url);
        fetch_count(&self.http, &url).await
    }
}
