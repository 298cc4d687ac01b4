//! Relation service.

use std::sync::Arc;

use sparrow_cache::{
    keys, BackgroundTasks, CacheBackend, CounterCache, KeyValueCache, SetMembershipCache,
};
use sparrow_common::{AppError, AppResult};
use sparrow_db::{
    entities::user,
    repositories::{FollowRepository, UserRepository},
};
use tracing::warn;

/// Relation service: orchestrates follow/unfollow across the counter
/// caches, the membership-set caches and the authoritative edge table.
#[derive(Clone)]
pub struct RelationService {
    follows: FollowRepository,
    users: UserRepository,
    kv: KeyValueCache,
    follow_set: SetMembershipCache,
    fan_set: SetMembershipCache,
    follow_count: CounterCache,
    fans_count: CounterCache,
}

impl RelationService {
    /// Create a new relation service.
    #[must_use]
    pub fn new(
        follows: FollowRepository,
        users: UserRepository,
        backend: Arc<dyn CacheBackend>,
        background: BackgroundTasks,
        cache_ttl_secs: i64,
    ) -> Self {
        Self {
            kv: KeyValueCache::new(Arc::clone(&backend), cache_ttl_secs),
            follow_set: SetMembershipCache::follow_list(
                Arc::clone(&backend),
                follows.clone(),
                background.clone(),
            ),
            fan_set: SetMembershipCache::fans_list(
                Arc::clone(&backend),
                follows.clone(),
                background,
            ),
            follow_count: CounterCache::follow_count(
                Arc::clone(&backend),
                follows.clone(),
                cache_ttl_secs,
            ),
            fans_count: CounterCache::fans_count(backend, follows.clone(), cache_ttl_secs),
            follows,
            users,
        }
    }

    /// Follow a user.
    ///
    /// Cache adjustments go first, then the mutual check, then the edge
    /// write; any failure up to and including the edge write aborts the
    /// whole operation. Only the final memo invalidation is best-effort.
    pub async fn follow(&self, user_id: i64, be_follower_id: i64) -> AppResult<()> {
        if user_id == be_follower_id {
            return Err(AppError::Validation("Cannot follow yourself".to_string()));
        }

        self.follow_count
            .adjust(user_id, 1)
            .await
            .map_err(relation_error)?;
        self.follow_set
            .add(user_id, be_follower_id)
            .await
            .map_err(relation_error)?;
        self.fans_count
            .adjust(be_follower_id, 1)
            .await
            .map_err(relation_error)?;
        self.fan_set
            .add(be_follower_id, user_id)
            .await
            .map_err(relation_error)?;

        // Does the target already follow the actor? Decides the mutual flag
        // written with the edge, without a second read after the write.
        let reverse_exists = self
            .is_follow_memoized(be_follower_id, user_id)
            .await
            .map_err(relation_error)?;

        self.follows
            .follow(user_id, be_follower_id, reverse_exists)
            .await
            .map_err(relation_error)?;

        // The write changed the answer for (user, be_follower); the next
        // query must recompute it from the store.
        self.kv
            .delete(&keys::is_follow(user_id, be_follower_id))
            .await;

        Ok(())
    }

    /// Unfollow a user.
    ///
    /// Mirrors [`Self::follow`] with the opposite adjustments. A fan-set
    /// cache failure is logged and does not abort: on the destructive path
    /// availability wins and the set heals on its next rebuild.
    pub async fn unfollow(&self, user_id: i64, un_be_follower_id: i64) -> AppResult<()> {
        if user_id == un_be_follower_id {
            return Err(AppError::Validation("Cannot unfollow yourself".to_string()));
        }

        self.follow_count
            .adjust(user_id, -1)
            .await
            .map_err(relation_error)?;
        self.follow_set
            .remove(user_id, un_be_follower_id)
            .await
            .map_err(relation_error)?;
        self.fans_count
            .adjust(un_be_follower_id, -1)
            .await
            .map_err(relation_error)?;

        if let Err(e) = self.fan_set.remove(un_be_follower_id, user_id).await {
            warn!(
                user_id,
                un_be_follower_id,
                error = %e,
                "Failed to update fan set on unfollow, continuing"
            );
        }

        let reverse_exists = self
            .is_follow_memoized(un_be_follower_id, user_id)
            .await
            .map_err(relation_error)?;

        self.follows
            .unfollow(user_id, un_be_follower_id, reverse_exists)
            .await
            .map_err(relation_error)?;

        self.kv
            .delete(&keys::is_follow(user_id, un_be_follower_id))
            .await;

        Ok(())
    }

    /// Check if a user follows another, via the memoized point lookup.
    pub async fn is_follow(&self, user_id: i64, follow_id: i64) -> AppResult<bool> {
        self.is_follow_memoized(user_id, follow_id)
            .await
            .map_err(relation_error)
    }

    /// Number of users `user_id` follows.
    pub async fn count_follow(&self, user_id: i64) -> AppResult<i64> {
        self.follow_count.read(user_id).await
    }

    /// Number of users following `user_id`.
    pub async fn count_fans(&self, user_id: i64) -> AppResult<i64> {
        self.fans_count.read(user_id).await
    }

    /// Profiles of every user `user_id` follows.
    pub async fn follow_list(&self, user_id: i64) -> AppResult<Vec<user::Model>> {
        let ids = self.follow_set.get_list(user_id).await?;
        self.users.find_profiles_by_ids(&ids).await
    }

    /// Profiles of every user following `user_id`.
    pub async fn fans_list(&self, user_id: i64) -> AppResult<Vec<user::Model>> {
        let ids = self.fan_set.get_list(user_id).await?;
        self.users.find_profiles_by_ids(&ids).await
    }

    /// Memoized "does `follower_id` follow `followee_id`" point lookup.
    ///
    /// The memo stores the store's answer as `"1"`/`"0"` and is deleted by
    /// whichever write changes it.
    async fn is_follow_memoized(&self, follower_id: i64, followee_id: i64) -> AppResult<bool> {
        let key = keys::is_follow(follower_id, followee_id);
        let follows = self.follows.clone();

        let value = self
            .kv
            .get_with(&key, || async move {
                let exists = follows.is_follow(follower_id, followee_id).await?;
                Ok(if exists { "1" } else { "0" }.to_string())
            })
            .await?;

        Ok(value == "1")
    }
}

fn relation_error(err: AppError) -> AppError {
    warn!(error = %err, "Relation operation failed");
    AppError::Relation("relation update failed".to_string())
}
