//! User service.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use sparrow_cache::{keys, CacheBackend, KeyValueCache};
use sparrow_common::{
    hash_password, verify_password, AppError, AppResult, IdGenerator, TokenIssuer, TokenPair,
};
use sparrow_db::{
    entities::{user, user_login},
    repositories::UserRepository,
};
use validator::Validate;

/// User service: signup and login flows over the credentials store, the
/// captcha cache and the login-check projection cache.
#[derive(Clone)]
pub struct UserService {
    users: UserRepository,
    kv: KeyValueCache,
    id_gen: Arc<IdGenerator>,
    tokens: TokenIssuer,
}

/// Input for creating a new account.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupInput {
    #[validate(length(min = 1, max = 64))]
    pub username: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[validate(length(min = 5, max = 32))]
    pub phone: String,

    #[validate(length(min = 4, max = 8))]
    pub captcha: String,
}

/// Cached login-check projection: just enough to verify a password
/// without re-querying the store on every attempt.
#[derive(Debug, Serialize, Deserialize)]
struct LoginCheck {
    user_id: i64,
    password: String,
}

/// How a login identifier addresses the credentials row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IdentifierKind {
    Phone,
    Email,
    Username,
}

fn classify_identifier(identifier: &str) -> IdentifierKind {
    if identifier.contains('@') {
        IdentifierKind::Email
    } else if !identifier.is_empty() && identifier.chars().all(|c| c.is_ascii_digit()) {
        IdentifierKind::Phone
    } else {
        IdentifierKind::Username
    }
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub fn new(
        users: UserRepository,
        backend: Arc<dyn CacheBackend>,
        id_gen: Arc<IdGenerator>,
        tokens: TokenIssuer,
        cache_ttl_secs: i64,
    ) -> Self {
        Self {
            users,
            kv: KeyValueCache::new(backend, cache_ttl_secs),
            id_gen,
            tokens,
        }
    }

    /// Create a new account.
    ///
    /// Verifies and consumes the captcha, checks username/phone
    /// uniqueness, then inserts the credentials and profile rows in one
    /// transaction. Returns the new user id.
    pub async fn signup(&self, input: SignupInput) -> AppResult<i64> {
        input.validate()?;

        self.consume_captcha(&input.phone, &input.captcha).await?;

        if self
            .users
            .find_login_by_username(&input.username)
            .await?
            .is_some()
        {
            return Err(AppError::Validation("Username already taken".to_string()));
        }
        if self.users.find_login_by_phone(&input.phone).await?.is_some() {
            return Err(AppError::Validation("Phone already registered".to_string()));
        }

        let password_hash = hash_password(&input.password)?;
        let user_id = self.id_gen.next_id();

        let login = user_login::ActiveModel {
            user_id: Set(user_id),
            username: Set(input.username.clone()),
            phone: Set(Some(input.phone)),
            email: Set(None),
            password: Set(password_hash),
            deleted_at: Set(None),
        };
        let profile = user::ActiveModel {
            user_id: Set(user_id),
            username: Set(input.username),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        self.users.create_user(login, profile).await?;

        Ok(user_id)
    }

    /// Log in with an identifier (phone, email or username) and password.
    pub async fn login_password(&self, identifier: &str, password: &str) -> AppResult<TokenPair> {
        let check = self.login_check_cached(identifier).await?;

        if !verify_password(password, &check.password)? {
            return Err(AppError::Unauthorized);
        }

        self.tokens.issue(check.user_id)
    }

    /// Log in with a phone number and the captcha sent to it.
    pub async fn login_captcha(&self, phone: &str, captcha: &str) -> AppResult<TokenPair> {
        self.consume_captcha(phone, captcha).await?;

        let login = self
            .users
            .find_login_by_phone(phone)
            .await?
            .ok_or_else(|| AppError::NotFound("unknown login identifier".to_string()))?;

        self.tokens.issue(login.user_id)
    }

    /// Check whether a user exists (and is not soft-deleted).
    pub async fn get_user_exist(&self, user_id: i64) -> AppResult<bool> {
        self.users.login_exists(user_id).await
    }

    /// Drop the cached login-check projection for an identifier.
    ///
    /// The projection is otherwise only expiry-bounded: any flow that
    /// mutates credentials must call this, or stale password hashes will
    /// keep authenticating until the TTL runs out.
    pub async fn invalidate_login_check(&self, identifier: &str) {
        self.kv.delete(&keys::login_check(identifier)).await;
    }

    /// Compare a submitted captcha against `captcha:{phone}` and consume
    /// the stored code on success (single-use).
    async fn consume_captcha(&self, phone: &str, captcha: &str) -> AppResult<()> {
        let key = keys::captcha(phone);

        match self.kv.get(&key).await? {
            Some(code) if code == captcha => {
                self.kv.delete(&key).await;
                Ok(())
            }
            _ => Err(AppError::Validation("Invalid captcha".to_string())),
        }
    }

    /// Cache-aside fetch of the login-check projection for an identifier.
    async fn login_check_cached(&self, identifier: &str) -> AppResult<LoginCheck> {
        let key = keys::login_check(identifier);
        let users = self.users.clone();
        let ident = identifier.to_string();

        let raw = self
            .kv
            .get_with(&key, || async move {
                let login = match classify_identifier(&ident) {
                    IdentifierKind::Email => users.find_login_by_email(&ident).await?,
                    IdentifierKind::Phone => users.find_login_by_phone(&ident).await?,
                    IdentifierKind::Username => users.find_login_by_username(&ident).await?,
                }
                .ok_or_else(|| AppError::NotFound("unknown login identifier".to_string()))?;

                serde_json::to_string(&LoginCheck {
                    user_id: login.user_id,
                    password: login.password,
                })
                .map_err(|e| AppError::Internal(format!("Failed to encode login check: {e}")))
            })
            .await?;

        serde_json::from_str(&raw)
            .map_err(|e| AppError::Cache(format!("corrupt login check {key}: {e}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use sparrow_cache::test_utils::MemoryBackend;
    use sparrow_common::config::AuthConfig;

    fn test_login(user_id: i64, username: &str, password_hash: &str) -> user_login::Model {
        user_login::Model {
            user_id,
            username: username.to_string(),
            phone: Some("13800000000".to_string()),
            email: None,
            password: password_hash.to_string(),
            deleted_at: None,
        }
    }

    fn test_profile(user_id: i64, username: &str) -> user::Model {
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

    fn service(backend: &Arc<MemoryBackend>, db: MockDatabase) -> UserService {
        let tokens = TokenIssuer::new(&AuthConfig {
            jwt_secret: "test-secret".to_string(),
            access_ttl_secs: 900,
            refresh_ttl_secs: 86_400,
        });
        UserService::new(
            UserRepository::new(Arc::new(db.into_connection())),
            Arc::clone(backend) as Arc<dyn CacheBackend>,
            Arc::new(IdGenerator::new(1)),
            tokens,
            3600,
        )
    }

    fn signup_input() -> SignupInput {
        SignupInput {
            username: "alice".to_string(),
            password: "password123".to_string(),
            phone: "13800000000".to_string(),
            captcha: "1234".to_string(),
        }
    }

    #[tokio::test]
    async fn test_signup_creates_user_and_consumes_captcha() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .set("captcha:13800000000", "1234", None)
            .await
            .unwrap();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // username free, phone free
            .append_query_results([Vec::<user_login::Model>::new()])
            .append_query_results([Vec::<user_login::Model>::new()])
            // transactional inserts
            .append_query_results([[test_login(1, "alice", "$argon2id$stub")]])
            .append_query_results([[test_profile(1, "alice")]])
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ]);

        let svc = service(&backend, db);
        let user_id = svc.signup(signup_input()).await.unwrap();

        assert!(user_id > 0);
        // Single-use captcha is gone.
        assert!(!backend.exists("captcha:13800000000").await.unwrap());
    }

    #[tokio::test]
    async fn test_signup_duplicate_username_is_validation_error() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .set("captcha:13800000000", "1234", None)
            .await
            .unwrap();

        // Only the username lookup is queued: any insert attempt would hit
        // an exhausted mock and fail the test with a database error.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_login(9, "alice", "$argon2id$stub")]]);

        let svc = service(&backend, db);
        let result = svc.signup(signup_input()).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_signup_bad_captcha_never_touches_store() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .set("captcha:13800000000", "9999", None)
            .await
            .unwrap();

        let svc = service(&backend, MockDatabase::new(DatabaseBackend::Postgres));
        let result = svc.signup(signup_input()).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        // A failed comparison must not consume the code.
        assert!(backend.exists("captcha:13800000000").await.unwrap());
    }

    #[tokio::test]
    async fn test_login_password_issues_tokens_and_caches_projection() {
        let backend = Arc::new(MemoryBackend::new());
        let hash = hash_password("password123").unwrap();

        // One username lookup only; the second login runs from the cache.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_login(7, "alice", &hash)]]);

        let svc = service(&backend, db);

        let pair = svc.login_password("alice", "password123").await.unwrap();
        assert!(!pair.access_token.is_empty());
        assert!(backend.exists("user:alice").await.unwrap());

        let pair = svc.login_password("alice", "password123").await.unwrap();
        assert!(!pair.refresh_token.is_empty());
    }

    #[tokio::test]
    async fn test_login_password_wrong_password_is_unauthorized() {
        let backend = Arc::new(MemoryBackend::new());
        let hash = hash_password("password123").unwrap();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_login(7, "alice", &hash)]]);

        let svc = service(&backend, db);
        assert!(matches!(
            svc.login_password("alice", "wrong").await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_login_password_unknown_identifier_is_not_found() {
        let backend = Arc::new(MemoryBackend::new());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user_login::Model>::new()]);

        let svc = service(&backend, db);
        assert!(matches!(
            svc.login_password("nobody", "password123").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_login_captcha_flow() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .set("captcha:13800000000", "4321", None)
            .await
            .unwrap();

        let hash = hash_password("irrelevant").unwrap();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_login(7, "alice", &hash)]]);

        let svc = service(&backend, db);
        let pair = svc.login_captcha("13800000000", "4321").await.unwrap();

        assert!(!pair.access_token.is_empty());
        assert!(!backend.exists("captcha:13800000000").await.unwrap());
    }

    #[tokio::test]
    async fn test_invalidate_login_check() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .set("user:alice", "{\"user_id\":7,\"password\":\"x\"}", None)
            .await
            .unwrap();

        let svc = service(&backend, MockDatabase::new(DatabaseBackend::Postgres));
        svc.invalidate_login_check("alice").await;

        assert!(!backend.exists("user:alice").await.unwrap());
    }

    #[test]
    fn test_classify_identifier() {
        assert_eq!(classify_identifier("a@b.c"), IdentifierKind::Email);
        assert_eq!(classify_identifier("13800000000"), IdentifierKind::Phone);
        assert_eq!(classify_identifier("alice"), IdentifierKind::Username);
        assert_eq!(classify_identifier("alice99"), IdentifierKind::Username);
    }
}
