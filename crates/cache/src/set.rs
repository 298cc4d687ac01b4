//! Cache-backed membership sets (follow lists and fan lists).

use std::sync::Arc;

use crate::backend::{CacheBackend, CacheError};
use crate::background::BackgroundTasks;
use crate::keys;
use sparrow_common::AppResult;
use sparrow_db::repositories::FollowRepository;
use tracing::{debug, warn};

/// Which per-user relationship a set holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    /// Ids the user follows.
    Follow,
    /// Ids following the user.
    Fans,
}

/// Cache-aside representation of a one-to-many relationship as a set,
/// with self-repair and asynchronous population on miss.
///
/// The authoritative list always lives in the follow-edge table; the
/// cached copy is advisory and rebuilt whenever it cannot be trusted.
#[derive(Clone)]
pub struct SetMembershipCache {
    backend: Arc<dyn CacheBackend>,
    follows: FollowRepository,
    background: BackgroundTasks,
    kind: ListKind,
}

impl SetMembershipCache {
    /// Cache of follow lists (`GetFollowList:{userId}`).
    #[must_use]
    pub fn follow_list(
        backend: Arc<dyn CacheBackend>,
        follows: FollowRepository,
        background: BackgroundTasks,
    ) -> Self {
        Self {
            backend,
            follows,
            background,
            kind: ListKind::Follow,
        }
    }

    /// Cache of fan lists (`GetFansList:{userId}`).
    #[must_use]
    pub fn fans_list(
        backend: Arc<dyn CacheBackend>,
        follows: FollowRepository,
        background: BackgroundTasks,
    ) -> Self {
        Self {
            backend,
            follows,
            background,
            kind: ListKind::Fans,
        }
    }

    fn key(&self, user_id: i64) -> String {
        match self.kind {
            ListKind::Follow => keys::follow_list(user_id),
            ListKind::Fans => keys::fans_list(user_id),
        }
    }

    /// Get the id list for a user.
    ///
    /// A trusted cached set is returned as-is, including a cached empty
    /// set. A backend failure or any member that does not parse as an id
    /// marks the whole set corrupt: it is deleted and the authoritative
    /// list is read from the store, returned immediately, and re-added to
    /// the cache through the background worker (best-effort, logged).
    pub async fn get_list(&self, user_id: i64) -> AppResult<Vec<i64>> {
        let key = self.key(user_id);

        match self.read_cached(&key).await {
            Ok(Some(ids)) => return Ok(ids),
            Ok(None) => debug!(key = %key, "Set cache miss"),
            Err(e) => {
                warn!(key = %key, error = %e, "Untrusted set cache, discarding");
                if let Err(e) = self.backend.del(&key).await {
                    warn!(key = %key, error = %e, "Failed to discard set cache");
                }
            }
        }

        let ids = self.load_from_store(user_id).await?;

        // An empty authoritative list is terminal; there is nothing to add
        // back to the cache.
        if !ids.is_empty() {
            let backend = Arc::clone(&self.backend);
            let members: Vec<String> = ids.iter().map(ToString::to_string).collect();
            self.background.submit(async move {
                backend.sadd(&key, members).await?;
                Ok(())
            });
        }

        Ok(ids)
    }

    /// Add a single member to a user's cached set.
    ///
    /// Only an already-populated set is mutated: creating the set here
    /// would materialize a one-element list that `get_list` would then
    /// trust as complete. Backend errors propagate to the caller.
    pub async fn add(&self, user_id: i64, member_id: i64) -> AppResult<()> {
        let key = self.key(user_id);
        if self.backend.exists(&key).await? {
            self.backend.sadd(&key, vec![member_id.to_string()]).await?;
        }
        Ok(())
    }

    /// Remove a single member from a user's cached set.
    ///
    /// Backend errors propagate to the caller.
    pub async fn remove(&self, user_id: i64, member_id: i64) -> AppResult<()> {
        let key = self.key(user_id);
        if self.backend.exists(&key).await? {
            self.backend.srem(&key, &member_id.to_string()).await?;
        }
        Ok(())
    }

    async fn read_cached(&self, key: &str) -> Result<Option<Vec<i64>>, CacheError> {
        if !self.backend.exists(key).await? {
            return Ok(None);
        }

        let raw = self.backend.smembers(key).await?;
        let mut ids = Vec::with_capacity(raw.len());
        for member in raw {
            let id = member
                .parse::<i64>()
                .map_err(|_| CacheError::Corrupt(format!("non-numeric set member: {member}")))?;
            ids.push(id);
        }
        Ok(Some(ids))
    }

    async fn load_from_store(&self, user_id: i64) -> AppResult<Vec<i64>> {
        match self.kind {
            ListKind::Follow => self.follows.follow_ids(user_id).await,
            ListKind::Fans => self.follows.fan_ids(user_id).await,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::MemoryBackend;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use sparrow_db::entities::follow_edge;
    use std::time::Duration;

    fn edge(follower_id: i64, followee_id: i64) -> follow_edge::Model {
        follow_edge::Model {
            follower_id,
            followee_id,
            mutual: false,
            created_at: Utc::now().into(),
        }
    }

    fn follow_cache(
        backend: &Arc<MemoryBackend>,
        edges: Vec<follow_edge::Model>,
    ) -> SetMembershipCache {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([edges])
                .into_connection(),
        );
        SetMembershipCache::follow_list(
            Arc::clone(backend) as Arc<dyn CacheBackend>,
            FollowRepository::new(db),
            BackgroundTasks::start(8),
        )
    }

    #[tokio::test]
    async fn test_trusted_cached_set_is_returned() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .sadd("GetFollowList:1", vec!["2".to_string(), "3".to_string()])
            .await
            .unwrap();

        // No store results queued: a store hit would error the test.
        let cache = follow_cache(&backend, Vec::new());
        let mut ids = cache.get_list(1).await.unwrap();
        ids.sort_unstable();

        assert_eq!(ids, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_miss_falls_through_and_repopulates() {
        let backend = Arc::new(MemoryBackend::new());
        let cache = follow_cache(&backend, vec![edge(1, 2), edge(1, 3)]);

        let ids = cache.get_list(1).await.unwrap();
        assert_eq!(ids, vec![2, 3]);

        // Population happens off the request path.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let mut members = backend.smembers("GetFollowList:1").await.unwrap();
        members.sort_unstable();
        assert_eq!(members, vec!["2".to_string(), "3".to_string()]);
    }

    #[tokio::test]
    async fn test_corrupt_member_discards_whole_set() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .sadd(
                "GetFollowList:1",
                vec!["2".to_string(), "not-a-number".to_string()],
            )
            .await
            .unwrap();

        let cache = follow_cache(&backend, vec![edge(1, 2), edge(1, 3)]);

        // The store-derived list comes back, never a partially-parsed one.
        let ids = cache.get_list(1).await.unwrap();
        assert_eq!(ids, vec![2, 3]);

        tokio::time::sleep(Duration::from_millis(50)).await;
        let mut members = backend.smembers("GetFollowList:1").await.unwrap();
        members.sort_unstable();
        assert_eq!(members, vec!["2".to_string(), "3".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_store_list_is_terminal() {
        let backend = Arc::new(MemoryBackend::new());
        let cache = follow_cache(&backend, Vec::new());

        assert!(cache.get_list(1).await.unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!backend.exists("GetFollowList:1").await.unwrap());
    }

    #[tokio::test]
    async fn test_add_only_mutates_populated_set() {
        let backend = Arc::new(MemoryBackend::new());
        let cache = follow_cache(&backend, Vec::new());

        // Absent set: no-op.
        cache.add(1, 9).await.unwrap();
        assert!(!backend.exists("GetFollowList:1").await.unwrap());

        backend
            .sadd("GetFollowList:1", vec!["2".to_string()])
            .await
            .unwrap();
        cache.add(1, 9).await.unwrap();
        let mut members = backend.smembers("GetFollowList:1").await.unwrap();
        members.sort_unstable();
        assert_eq!(members, vec!["2".to_string(), "9".to_string()]);
    }

    #[tokio::test]
    async fn test_add_propagates_backend_error() {
        let backend = Arc::new(MemoryBackend::new());
        backend.fail_keys_containing("GetFollowList");

        let cache = follow_cache(&backend, Vec::new());
        assert!(cache.add(1, 9).await.is_err());
    }
}
