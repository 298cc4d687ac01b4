//! Follow edge repository.

use std::sync::Arc;

use crate::entities::{follow_edge, FollowEdge};
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionError, TransactionTrait,
};
use sparrow_common::{AppError, AppResult};

/// Follow repository: the authoritative store for follow edges.
#[derive(Clone)]
pub struct FollowRepository {
    db: Arc<DatabaseConnection>,
}

impl FollowRepository {
    /// Create a new follow repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a follow edge by its (follower, followee) pair.
    pub async fn find_by_pair(
        &self,
        follower_id: i64,
        followee_id: i64,
    ) -> AppResult<Option<follow_edge::Model>> {
        FollowEdge::find()
            .filter(follow_edge::Column::FollowerId.eq(follower_id))
            .filter(follow_edge::Column::FolloweeId.eq(followee_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if a user is following another user.
    pub async fn is_follow(&self, follower_id: i64, followee_id: i64) -> AppResult<bool> {
        Ok(self.find_by_pair(follower_id, followee_id).await?.is_some())
    }

    /// Ids of every user that `user_id` follows.
    pub async fn follow_ids(&self, user_id: i64) -> AppResult<Vec<i64>> {
        let edges = FollowEdge::find()
            .filter(follow_edge::Column::FollowerId.eq(user_id))
            .order_by_asc(follow_edge::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(edges.into_iter().map(|e| e.followee_id).collect())
    }

    /// Ids of every user following `user_id`.
    pub async fn fan_ids(&self, user_id: i64) -> AppResult<Vec<i64>> {
        let edges = FollowEdge::find()
            .filter(follow_edge::Column::FolloweeId.eq(user_id))
            .order_by_asc(follow_edge::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(edges.into_iter().map(|e| e.follower_id).collect())
    }

    /// Count of outgoing edges (how many users `user_id` follows).
    pub async fn count_following(&self, user_id: i64) -> AppResult<i64> {
        FollowEdge::find()
            .filter(follow_edge::Column::FollowerId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map(|n| n as i64)
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count of incoming edges (how many users follow `user_id`).
    pub async fn count_followers(&self, user_id: i64) -> AppResult<i64> {
        FollowEdge::find()
            .filter(follow_edge::Column::FolloweeId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map(|n| n as i64)
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Write a follow edge.
    ///
    /// `reverse_exists` signals that the reverse edge is already present, so
    /// the new edge is written with `mutual = true` and the reverse edge is
    /// flagged in the same transaction. A duplicate pair is a no-op.
    pub async fn follow(
        &self,
        follower_id: i64,
        followee_id: i64,
        reverse_exists: bool,
    ) -> AppResult<()> {
        self.db
            .transaction::<_, (), AppError>(move |txn| {
                Box::pin(async move {
                    let edge = follow_edge::ActiveModel {
                        follower_id: Set(follower_id),
                        followee_id: Set(followee_id),
                        mutual: Set(reverse_exists),
                        created_at: Set(Utc::now().into()),
                    };

                    FollowEdge::insert(edge)
                        .on_conflict(
                            OnConflict::columns([
                                follow_edge::Column::FollowerId,
                                follow_edge::Column::FolloweeId,
                            ])
                            .do_nothing()
                            .to_owned(),
                        )
                        .exec_without_returning(txn)
                        .await
                        .map_err(|e| AppError::Database(e.to_string()))?;

                    if reverse_exists {
                        FollowEdge::update_many()
                            .col_expr(follow_edge::Column::Mutual, Expr::value(true))
                            .filter(follow_edge::Column::FollowerId.eq(followee_id))
                            .filter(follow_edge::Column::FolloweeId.eq(follower_id))
                            .exec(txn)
                            .await
                            .map_err(|e| AppError::Database(e.to_string()))?;
                    }

                    Ok(())
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db) => AppError::Database(db.to_string()),
                TransactionError::Transaction(app) => app,
            })
    }

    /// Remove a follow edge.
    ///
    /// `reverse_exists` signals that the reverse edge is present; its mutual
    /// flag is cleared in the same transaction. Removing an absent edge is a
    /// no-op.
    pub async fn unfollow(
        &self,
        follower_id: i64,
        followee_id: i64,
        reverse_exists: bool,
    ) -> AppResult<()> {
        self.db
            .transaction::<_, (), AppError>(move |txn| {
                Box::pin(async move {
                    FollowEdge::delete_many()
                        .filter(follow_edge::Column::FollowerId.eq(follower_id))
                        .filter(follow_edge::Column::FolloweeId.eq(followee_id))
                        .exec(txn)
                        .await
                        .map_err(|e| AppError::Database(e.to_string()))?;

                    if reverse_exists {
                        FollowEdge::update_many()
                            .col_expr(follow_edge::Column::Mutual, Expr::value(false))
                            .filter(follow_edge::Column::FollowerId.eq(followee_id))
                            .filter(follow_edge::Column::FolloweeId.eq(follower_id))
                            .exec(txn)
                            .await
                            .map_err(|e| AppError::Database(e.to_string()))?;
                    }

                    Ok(())
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db) => AppError::Database(db.to_string()),
                TransactionError::Transaction(app) => app,
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};

    fn create_test_edge(follower_id: i64, followee_id: i64, mutual: bool) -> follow_edge::Model {
        follow_edge::Model {
            follower_id,
            followee_id,
            mutual,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_is_follow_true() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_edge(1, 2, false)]])
                .into_connection(),
        );

        let repo = FollowRepository::new(db);
        assert!(repo.is_follow(1, 2).await.unwrap());
    }

    #[tokio::test]
    async fn test_is_follow_false() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<follow_edge::Model>::new()])
                .into_connection(),
        );

        let repo = FollowRepository::new(db);
        assert!(!repo.is_follow(1, 3).await.unwrap());
    }

    #[tokio::test]
    async fn test_follow_ids_maps_followee_column() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_edge(1, 2, false),
                    create_test_edge(1, 3, true),
                ]])
                .into_connection(),
        );

        let repo = FollowRepository::new(db);
        assert_eq!(repo.follow_ids(1).await.unwrap(), vec![2, 3]);
    }

    #[tokio::test]
    async fn test_fan_ids_maps_follower_column() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_edge(5, 1, false),
                    create_test_edge(6, 1, false),
                ]])
                .into_connection(),
        );

        let repo = FollowRepository::new(db);
        assert_eq!(repo.fan_ids(1).await.unwrap(), vec![5, 6]);
    }

    #[tokio::test]
    async fn test_count_followers() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![
                    btreemap! { "num_items" => Value::BigInt(Some(3)) },
                ]])
                .into_connection(),
        );

        let repo = FollowRepository::new(db);
        assert_eq!(repo.count_followers(7).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_follow_without_reverse_is_single_statement() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = FollowRepository::new(db);
        repo.follow(1, 2, false).await.unwrap();
    }

    #[tokio::test]
    async fn test_follow_with_reverse_updates_mutual_flag() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                ])
                .into_connection(),
        );

        let repo = FollowRepository::new(db);
        repo.follow(1, 2, true).await.unwrap();
    }

    #[tokio::test]
    async fn test_unfollow_clears_reverse_mutual_flag() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                ])
                .into_connection(),
        );

        let repo = FollowRepository::new(db);
        repo.unfollow(1, 2, true).await.unwrap();
    }
}
