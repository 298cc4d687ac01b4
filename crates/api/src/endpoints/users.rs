//! User endpoints.

use axum::{
    extract::{Query, State},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use sparrow_common::AppResult;
use sparrow_core::UserInfo;

use crate::{response::ApiResponse, state::AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserInfoQuery {
    user_id: i64,
    actor_id: i64,
}

/// Aggregated profile of a user as seen by an actor.
async fn user_info(
    State(state): State<AppState>,
    Query(query): Query<UserInfoQuery>,
) -> AppResult<ApiResponse<UserInfo>> {
    let info = state
        .profile_service
        .get_user_info(query.user_id, query.actor_id)
        .await?;
    Ok(ApiResponse::ok(info))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExistQuery {
    user_id: i64,
}

/// Existence response.
#[derive(Debug, Serialize)]
pub struct ExistResponse {
    pub exists: bool,
}

/// Whether a user exists (and is not soft-deleted).
async fn user_exist(
    State(state): State<AppState>,
    Query(query): Query<ExistQuery>,
) -> AppResult<ApiResponse<ExistResponse>> {
    let exists = state.user_service.get_user_exist(query.user_id).await?;
    Ok(ApiResponse::ok(ExistResponse { exists }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/info", get(user_info))
        .route("/exist", get(user_exist))
}
