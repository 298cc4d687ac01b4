//! User repository.

use std::sync::Arc;

use crate::entities::{user, user_login, User, UserLogin};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, TransactionError,
    TransactionTrait,
};
use sparrow_common::{AppError, AppResult};

/// User repository for database operations over the credentials and
/// profile tables.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a login row by user id. Soft-deleted rows are invisible.
    pub async fn find_login_by_id(&self, user_id: i64) -> AppResult<Option<user_login::Model>> {
        UserLogin::find()
            .filter(user_login::Column::UserId.eq(user_id))
            .filter(user_login::Column::DeletedAt.is_null())
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a login row by username. Soft-deleted rows are invisible.
    pub async fn find_login_by_username(
        &self,
        username: &str,
    ) -> AppResult<Option<user_login::Model>> {
        UserLogin::find()
            .filter(user_login::Column::Username.eq(username))
            .filter(user_login::Column::DeletedAt.is_null())
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a login row by phone number. Soft-deleted rows are invisible.
    pub async fn find_login_by_phone(&self, phone: &str) -> AppResult<Option<user_login::Model>> {
        UserLogin::find()
            .filter(user_login::Column::Phone.eq(phone))
            .filter(user_login::Column::DeletedAt.is_null())
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a login row by email. Soft-deleted rows are invisible.
    pub async fn find_login_by_email(&self, email: &str) -> AppResult<Option<user_login::Model>> {
        UserLogin::find()
            .filter(user_login::Column::Email.eq(email))
            .filter(user_login::Column::DeletedAt.is_null())
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check whether a user exists (and is not soft-deleted).
    pub async fn login_exists(&self, user_id: i64) -> AppResult<bool> {
        Ok(self.find_login_by_id(user_id).await?.is_some())
    }

    /// Find a profile row by user id.
    pub async fn find_profile_by_id(&self, user_id: i64) -> AppResult<Option<user::Model>> {
        User::find_by_id(user_id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find profile rows for a list of user ids.
    ///
    /// Missing ids are silently skipped; the result order is unspecified.
    pub async fn find_profiles_by_ids(&self, user_ids: &[i64]) -> AppResult<Vec<user::Model>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        User::find()
            .filter(user::Column::UserId.is_in(user_ids.iter().copied()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new user: one credentials row and one profile row,
    /// inserted in a single transaction. Any failure rolls back both.
    pub async fn create_user(
        &self,
        login: user_login::ActiveModel,
        profile: user::ActiveModel,
    ) -> AppResult<()> {
        self.db
            .transaction::<_, (), AppError>(|txn| {
                Box::pin(async move {
                    login
                        .insert(txn)
                        .await
                        .map_err(|e| AppError::Database(e.to_string()))?;
                    profile
                        .insert(txn)
                        .await
                        .map_err(|e| AppError::Database(e.to_string()))?;
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
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set};

    fn create_test_login(user_id: i64, username: &str) -> user_login::Model {
        user_login::Model {
            user_id,
            username: username.to_string(),
            phone: Some("13800000000".to_string()),
            email: None,
            password: "$argon2id$stub".to_string(),
            deleted_at: None,
        }
    }

    fn create_test_profile(user_id: i64, username: &str) -> user::Model {
        user::Model {
            user_id,
            username: username.to_string(),
            avatar_url: None,
            signature: None,
            birthday: None,
            gender: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_login_by_username_found() {
        let login = create_test_login(1, "alice");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[login.clone()]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let result = repo.find_login_by_username("alice").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().user_id, 1);
    }

    #[tokio::test]
    async fn test_find_login_by_username_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user_login::Model>::new()])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let result = repo.find_login_by_username("nobody").await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_login_exists() {
        let login = create_test_login(7, "bob");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[login]])
                .append_query_results([Vec::<user_login::Model>::new()])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        assert!(repo.login_exists(7).await.unwrap());
        assert!(!repo.login_exists(8).await.unwrap());
    }

    #[tokio::test]
    async fn test_find_profiles_by_ids_empty_input_skips_query() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = UserRepository::new(db);
        let result = repo.find_profiles_by_ids(&[]).await.unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_create_user_runs_both_inserts() {
        let login = create_test_login(9, "carol");
        let profile = create_test_profile(9, "carol");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[login.clone()]])
                .append_query_results([[profile.clone()]])
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

        let repo = UserRepository::new(db);
        let login_am = user_login::ActiveModel {
            user_id: Set(9),
            username: Set("carol".to_string()),
            phone: Set(Some("13800000000".to_string())),
            email: Set(None),
            password: Set("$argon2id$stub".to_string()),
            deleted_at: Set(None),
        };
        let profile_am = user::ActiveModel {
            user_id: Set(9),
            username: Set("carol".to_string()),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        repo.create_user(login_am, profile_am).await.unwrap();
    }
}
