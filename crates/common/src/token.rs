//! Access/refresh token issuance.

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{config::AuthConfig, AppError, AppResult};

/// Token kind discriminator embedded in the claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived access token.
    Access,
    /// Long-lived refresh token.
    Refresh,
}

/// JWT claims for sparrow tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the numeric user id.
    pub sub: i64,
    /// Expiry (Unix seconds).
    pub exp: i64,
    /// Issued-at (Unix seconds).
    pub iat: i64,
    /// Access or refresh.
    pub kind: TokenKind,
}

/// A freshly issued access/refresh token pair.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// Short-lived access token.
    pub access_token: String,
    /// Long-lived refresh token.
    pub refresh_token: String,
}

/// Issues and verifies signed tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenIssuer {
    /// Create a new token issuer from the auth configuration.
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            access_ttl_secs: config.access_ttl_secs,
            refresh_ttl_secs: config.refresh_ttl_secs,
        }
    }

    /// Issue an access/refresh pair for a user.
    pub fn issue(&self, user_id: i64) -> AppResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.issue_one(user_id, TokenKind::Access, self.access_ttl_secs)?,
            refresh_token: self.issue_one(user_id, TokenKind::Refresh, self.refresh_ttl_secs)?,
        })
    }

    fn issue_one(&self, user_id: i64, kind: TokenKind, ttl_secs: i64) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id,
            exp: now + ttl_secs,
            iat: now,
            kind,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {e}")))
    }

    /// Verify a token and return its claims.
    ///
    /// Expired or malformed tokens are an [`AppError::Unauthorized`].
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| AppError::Unauthorized)
    }
}
