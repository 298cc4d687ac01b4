//! Generic read-through string cache.

use std::future::Future;
use std::sync::Arc;

use crate::backend::CacheBackend;
use sparrow_common::AppResult;
use tracing::{debug, warn};

/// Generic string cache with a compute-if-absent primitive.
///
/// Knows nothing about domain types; callers bring their own keys (see
/// [`crate::keys`]) and encodings.
#[derive(Clone)]
pub struct KeyValueCache {
    backend: Arc<dyn CacheBackend>,
    default_ttl_secs: i64,
}

impl KeyValueCache {
    /// Create a new cache with the given default TTL for expiring writes.
    #[must_use]
    pub fn new(backend: Arc<dyn CacheBackend>, default_ttl_secs: i64) -> Self {
        Self {
            backend,
            default_ttl_secs,
        }
    }

    /// Get a value. A miss is `Ok(None)`; backend failures are errors.
    pub async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let value = self.backend.get(key).await?;

        if value.is_some() {
            debug!(key = %key, "Cache hit");
        } else {
            debug!(key = %key, "Cache miss");
        }

        Ok(value)
    }

    /// Store a value. `with_expiry` selects the configured default TTL;
    /// otherwise the key does not expire.
    pub async fn set(&self, key: &str, value: &str, with_expiry: bool) -> AppResult<()> {
        let ttl = with_expiry.then_some(self.default_ttl_secs);
        self.backend.set(key, value, ttl).await?;
        Ok(())
    }

    /// Compute-if-absent: return the cached value, or invoke `compute`,
    /// store its result with the default TTL, and return it.
    ///
    /// There is no single-flight guard: concurrent misses on the same key
    /// may each invoke `compute`. Duplicate hits on the authoritative
    /// source under a cache stampede are accepted.
    pub async fn get_with<F, Fut>(&self, key: &str, compute: F) -> AppResult<String>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = AppResult<String>> + Send,
    {
        if let Some(hit) = self.get(key).await? {
            return Ok(hit);
        }

        let value = compute().await?;
        self.set(key, &value, true).await?;
        Ok(value)
    }

    /// Best-effort invalidation: failures are logged, never surfaced.
    pub async fn delete(&self, key: &str) {
        if let Err(e) = self.backend.del(key).await {
            warn!(key = %key, error = %e, "Failed to invalidate cache key");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::MemoryBackend;
    use sparrow_common::AppError;

    fn cache() -> (Arc<MemoryBackend>, KeyValueCache) {
        let backend = Arc::new(MemoryBackend::new());
        let cache = KeyValueCache::new(Arc::clone(&backend) as Arc<dyn CacheBackend>, 3600);
        (backend, cache)
    }

    #[tokio::test]
    async fn test_get_miss_is_none() {
        let (_, cache) = cache();
        assert!(cache.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let (_, cache) = cache();
        cache.set("k", "v", true).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_get_with_computes_once() {
        let (_, cache) = cache();

        let value = cache
            .get_with("k", || async { Ok("computed".to_string()) })
            .await
            .unwrap();
        assert_eq!(value, "computed");

        // The stored value is retrievable by a plain get, and a second
        // get_with must not invoke compute again.
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("computed"));
        let value = cache
            .get_with("k", || async {
                Err::<String, _>(AppError::Internal("recomputed".to_string()))
            })
            .await
            .unwrap();
        assert_eq!(value, "computed");
    }

    #[tokio::test]
    async fn test_get_with_propagates_compute_error() {
        let (_, cache) = cache();

        let result = cache
            .get_with("k", || async {
                Err::<String, _>(AppError::Database("down".to_string()))
            })
            .await;

        assert!(result.is_err());
        // Nothing was stored.
        assert!(cache.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_absorbs_backend_failure() {
        let (backend, cache) = cache();
        backend.fail_keys_containing("k");

        // Must not error even though the backend is failing.
        cache.delete("k").await;
    }

    #[tokio::test]
    async fn test_get_surfaces_backend_failure() {
        let (backend, cache) = cache();
        backend.fail_keys_containing("k");

        assert!(matches!(cache.get("k").await, Err(AppError::Cache(_))));
    }
}
