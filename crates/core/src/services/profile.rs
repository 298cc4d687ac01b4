//! Profile aggregation service.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use sparrow_cache::{keys, CacheBackend, KeyValueCache};
use sparrow_common::{AppError, AppResult};
use sparrow_db::{entities::user, repositories::UserRepository};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::clients::{CollectClient, LikeClient};
use crate::services::relation::RelationService;

/// Aggregated user profile.
///
/// Fanned-out fields are tri-state: `None` means the lookup did not run or
/// did not complete, which is distinct from a computed zero.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub user_id: i64,
    pub username: String,
    pub avatar_url: Option<String>,
    pub signature: Option<String>,
    pub birthday: Option<chrono::NaiveDate>,
    pub gender: Option<i16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_follow: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fans_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub like_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_liked: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collect_count: Option<i64>,
}

impl From<user::Model> for UserInfo {
    fn from(profile: user::Model) -> Self {
        Self {
            user_id: profile.user_id,
            username: profile.username,
            avatar_url: profile.avatar_url,
            signature: profile.signature,
            birthday: profile.birthday,
            gender: profile.gender,
            is_follow: None,
            follow_count: None,
            fans_count: None,
            like_count: None,
            total_liked: None,
            collect_count: None,
        }
    }
}

/// Profile service: builds one `UserInfo` response from the cached profile
/// row plus six concurrent sub-lookups against the relation layer and the
/// sibling Like/Collect services.
#[derive(Clone)]
pub struct ProfileService {
    users: UserRepository,
    relations: RelationService,
    like: Arc<dyn LikeClient>,
    collect: Arc<dyn CollectClient>,
    kv: KeyValueCache,
}

impl ProfileService {
    /// Create a new profile service.
    #[must_use]
    pub fn new(
        users: UserRepository,
        relations: RelationService,
        like: Arc<dyn LikeClient>,
        collect: Arc<dyn CollectClient>,
        backend: Arc<dyn CacheBackend>,
        cache_ttl_secs: i64,
    ) -> Self {
        Self {
            users,
            relations,
            like,
            collect,
            kv: KeyValueCache::new(backend, cache_ttl_secs),
        }
    }

    /// Get the aggregated profile of `user_id` as seen by `actor_id`.
    ///
    /// Any sub-lookup failure surfaces as an aggregation error: the
    /// response under an error status must be discarded by callers, even
    /// though every other field was still computed.
    pub async fn get_user_info(&self, user_id: i64, actor_id: i64) -> AppResult<UserInfo> {
        let profile = self.profile_cached(user_id).await?;
        let mut info = UserInfo::from(profile);

        if self.fan_out(&mut info, user_id, actor_id).await {
            return Err(AppError::Aggregation(
                "user info aggregation failed".to_string(),
            ));
        }

        Ok(info)
    }

    /// Run the six sub-lookups concurrently and fill `info` with whatever
    /// completes. Returns whether any lookup failed.
    ///
    /// The join waits for all tasks; a failure flips the shared flag but
    /// never cancels the others.
    async fn fan_out(&self, info: &mut UserInfo, user_id: i64, actor_id: i64) -> bool {
        let failed = Arc::new(AtomicBool::new(false));

        let is_follow = {
            let relations = self.relations.clone();
            spawn_lookup(&failed, "is_follow", async move {
                relations.is_follow(actor_id, user_id).await
            })
        };
        let follow_count = {
            let relations = self.relations.clone();
            spawn_lookup(&failed, "follow_count", async move {
                relations.count_follow(user_id).await
            })
        };
        let fans_count = {
            let relations = self.relations.clone();
            spawn_lookup(&failed, "fans_count", async move {
                relations.count_fans(user_id).await
            })
        };
        let like_count = {
            let like = Arc::clone(&self.like);
            spawn_lookup(&failed, "like_count", async move {
                like.like_count(user_id).await
            })
        };
        let total_liked = {
            let like = Arc::clone(&self.like);
            spawn_lookup(&failed, "total_liked", async move {
                like.total_liked(user_id).await
            })
        };
        let collect_count = {
            let collect = Arc::clone(&self.collect);
            spawn_lookup(&failed, "collect_count", async move {
                collect.collect_count(user_id).await
            })
        };

        info.is_follow = join_lookup(&failed, is_follow).await;
        info.follow_count = join_lookup(&failed, follow_count).await;
        info.fans_count = join_lookup(&failed, fans_count).await;
        info.like_count = join_lookup(&failed, like_count).await;
        info.total_liked = join_lookup(&failed, total_liked).await;
        info.collect_count = join_lookup(&failed, collect_count).await;

        failed.load(Ordering::SeqCst)
    }

    /// Cache-aside fetch of the base profile row (`GetUserInfo:{userId}`).
    async fn profile_cached(&self, user_id: i64) -> AppResult<user::Model> {
        let key = keys::user_info(user_id);
        let users = self.users.clone();

        let raw = self
            .kv
            .get_with(&key, || async move {
                let profile = users
                    .find_profile_by_id(user_id)
                    .await?
                    .ok_or(AppError::UserNotFound(user_id))?;

                serde_json::to_string(&profile)
                    .map_err(|e| AppError::Internal(format!("Failed to encode profile: {e}")))
            })
            .await?;

        serde_json::from_str(&raw)
            .map_err(|e| AppError::Cache(format!("corrupt profile cache {key}: {e}")))
    }
}

fn spawn_lookup<T, F>(failed: &Arc<AtomicBool>, name: &'static str, fut: F) -> JoinHandle<Option<T>>
where
    T: Send + 'static,
    F: Future<Output = AppResult<T>> + Send + 'static,
{
    let failed = Arc::clone(failed);
    tokio::spawn(async move {
        match fut.await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(lookup = name, error = %e, "Profile sub-lookup failed");
                failed.store(true, Ordering::SeqCst);
                None
            }
        }
    })
}

async fn join_lookup<T>(failed: &Arc<AtomicBool>, handle: JoinHandle<Option<T>>) -> Option<T> {
    match handle.await {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Profile sub-lookup task died");
            failed.store(true, Ordering::SeqCst);
            None
        }
    }
}
