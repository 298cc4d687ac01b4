//! Authentication endpoints.

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use sparrow_common::{AppResult, TokenPair};
use sparrow_core::SignupInput;

use crate::{response::ApiResponse, state::AppState};

/// Create a new account.
async fn signup(
    State(state): State<AppState>,
    Json(input): Json<SignupInput>,
) -> AppResult<ApiResponse<()>> {
    state.user_service.signup(input).await?;
    Ok(ApiResponse::ok(()))
}

/// Password login request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginPasswordRequest {
    pub identifier: String,
    pub password: String,
}

/// Log in with a phone/email/username identifier and password.
async fn login_password(
    State(state): State<AppState>,
    Json(req): Json<LoginPasswordRequest>,
) -> AppResult<ApiResponse<TokenPair>> {
    let pair = state
        .user_service
        .login_password(&req.identifier, &req.password)
        .await?;
    Ok(ApiResponse::ok(pair))
}

/// Captcha login request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginCaptchaRequest {
    pub phone: String,
    pub captcha: String,
}

/// Log in with a phone number and the captcha sent to it.
async fn login_captcha(
    State(state): State<AppState>,
    Json(req): Json<LoginCaptchaRequest>,
) -> AppResult<ApiResponse<TokenPair>> {
    let pair = state
        .user_service
        .login_captcha(&req.phone, &req.captcha)
        .await?;
    Ok(ApiResponse::ok(pair))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login/password", post(login_password))
        .route("/login/captcha", post(login_captcha))
}
