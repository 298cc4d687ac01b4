//! Cache-backed scalar counters (follow counts and fan counts).

use std::sync::Arc;

use crate::backend::CacheBackend;
use crate::keys;
use sparrow_common::{AppError, AppResult};
use sparrow_db::repositories::FollowRepository;
use tracing::debug;

/// Which aggregate a counter tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterKind {
    /// Outgoing edges: how many users someone follows.
    Following,
    /// Incoming edges: how many users follow someone.
    Followers,
}

/// Cache-aside scalar counter with read-through seeding.
///
/// A cached value that fails to parse is a hard error rather than a
/// fallthrough; unlike the list caches there is no self-repair here, and
/// that difference is intentional.
#[derive(Clone)]
pub struct CounterCache {
    backend: Arc<dyn CacheBackend>,
    follows: FollowRepository,
    kind: CounterKind,
    ttl_secs: i64,
}

impl CounterCache {
    /// Counter of users someone follows (`CountFollower:{userId}`).
    #[must_use]
    pub fn follow_count(
        backend: Arc<dyn CacheBackend>,
        follows: FollowRepository,
        ttl_secs: i64,
    ) -> Self {
        Self {
            backend,
            follows,
            kind: CounterKind::Following,
            ttl_secs,
        }
    }

    /// Counter of users following someone (`CountFans:{userId}`).
    #[must_use]
    pub fn fans_count(
        backend: Arc<dyn CacheBackend>,
        follows: FollowRepository,
        ttl_secs: i64,
    ) -> Self {
        Self {
            backend,
            follows,
            kind: CounterKind::Followers,
            ttl_secs,
        }
    }

    fn key(&self, user_id: i64) -> String {
        match self.kind {
            CounterKind::Following => keys::follow_count(user_id),
            CounterKind::Followers => keys::fans_count(user_id),
        }
    }

    /// Read the counter, seeding it from the store aggregate on a miss.
    pub async fn read(&self, user_id: i64) -> AppResult<i64> {
        let key = self.key(user_id);

        if let Some(raw) = self.backend.get(&key).await? {
            return raw
                .parse::<i64>()
                .map_err(|_| AppError::Cache(format!("corrupt counter {key}: {raw}")));
        }

        let count = self.load_from_store(user_id).await?;
        self.backend
            .set(&key, &count.to_string(), Some(self.ttl_secs))
            .await?;

        debug!(key = %key, count, "Seeded counter from store");
        Ok(count)
    }

    /// Apply a ±1 adjustment to the counter.
    ///
    /// The adjustment is an atomic INCRBY, and only applied when the key is
    /// already seeded; an absent key stays absent so that the next read
    /// re-seeds from the authoritative aggregate. Adjustments are not
    /// idempotent: every call moves a seeded counter by `delta`.
    pub async fn adjust(&self, user_id: i64, delta: i64) -> AppResult<()> {
        let key = self.key(user_id);

        if self.backend.exists(&key).await? {
            let value = self.backend.incr_by(&key, delta).await?;
            debug!(key = %key, delta, value, "Adjusted counter");
        }

        Ok(())
    }

    async fn load_from_store(&self, user_id: i64) -> AppResult<i64> {
        match self.kind {
            CounterKind::Following => self.follows.count_following(user_id).await,
            CounterKind::Followers => self.follows.count_followers(user_id).await,
        }
    }
}
