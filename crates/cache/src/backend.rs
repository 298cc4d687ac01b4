//! Cache backend abstraction over Redis.
//!
//! All cache components speak to a [`CacheBackend`] handle that is
//! constructed once at startup and passed down explicitly; nothing in this
//! crate reaches for a global client.

use async_trait::async_trait;
use fred::clients::Client as RedisClient;
use fred::interfaces::{KeysInterface, SetsInterface};
use fred::types::Expiration;
use sparrow_common::AppError;
use std::sync::Arc;

/// Cache backend result type.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache backend error type.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Redis operation failed.
    #[error("Redis error: {0}")]
    Redis(String),

    /// A stored value could not be interpreted.
    #[error("Corrupt cache value: {0}")]
    Corrupt(String),
}

impl From<CacheError> for AppError {
    fn from(err: CacheError) -> Self {
        Self::Cache(err.to_string())
    }
}

/// Minimal Redis surface used by the cache layer.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get a string value. A missing key is `Ok(None)`.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Set a string value, optionally with a TTL in seconds.
    async fn set(&self, key: &str, value: &str, ttl_secs: Option<i64>) -> CacheResult<()>;

    /// Delete a key.
    async fn del(&self, key: &str) -> CacheResult<()>;

    /// Check whether a key exists.
    async fn exists(&self, key: &str) -> CacheResult<bool>;

    /// Atomically add `delta` to an integer value, returning the new value.
    async fn incr_by(&self, key: &str, delta: i64) -> CacheResult<i64>;

    /// All members of a set.
    async fn smembers(&self, key: &str) -> CacheResult<Vec<String>>;

    /// Add members to a set.
    async fn sadd(&self, key: &str, members: Vec<String>) -> CacheResult<()>;

    /// Remove a member from a set.
    async fn srem(&self, key: &str, member: &str) -> CacheResult<()>;
}

/// Redis-backed [`CacheBackend`] over a shared fred client.
#[derive(Clone)]
pub struct RedisBackend {
    redis: Arc<RedisClient>,
}

impl RedisBackend {
    /// Create a new Redis backend.
    #[must_use]
    pub const fn new(redis: Arc<RedisClient>) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.redis
            .get(key)
            .await
            .map_err(|e| CacheError::Redis(e.to_string()))
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: Option<i64>) -> CacheResult<()> {
        self.redis
            .set::<(), _, _>(key, value, ttl_secs.map(Expiration::EX), None, false)
            .await
            .map_err(|e| CacheError::Redis(e.to_string()))
    }

    async fn del(&self, key: &str) -> CacheResult<()> {
        self.redis
            .del::<(), _>(key)
            .await
            .map_err(|e| CacheError::Redis(e.to_string()))
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        let count: i64 = self
            .redis
            .exists(key)
            .await
            .map_err(|e| CacheError::Redis(e.to_string()))?;

        Ok(count > 0)
    }

    async fn incr_by(&self, key: &str, delta: i64) -> CacheResult<i64> {
        self.redis
            .incr_by(key, delta)
            .await
            .map_err(|e| CacheError::Redis(e.to_string()))
    }

    async fn smembers(&self, key: &str) -> CacheResult<Vec<String>> {
        self.redis
            .smembers(key)
            .await
            .map_err(|e| CacheError::Redis(e.to_string()))
    }

    async fn sadd(&self, key: &str, members: Vec<String>) -> CacheResult<()> {
        self.redis
            .sadd::<(), _, _>(key, members)
            .await
            .map_err(|e| CacheError::Redis(e.to_string()))
    }

    async fn srem(&self, key: &str, member: &str) -> CacheResult<()> {
        self.redis
            .srem::<(), _, _>(key, member.to_string())
            .await
            .map_err(|e| CacheError::Redis(e.to_string()))
    }
}
