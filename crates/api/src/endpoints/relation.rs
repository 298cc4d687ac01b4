//! Relation endpoints.

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sparrow_common::AppResult;
use sparrow_db::entities::user;

use crate::{response::ApiResponse, state::AppState};

/// Follow request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowRequest {
    pub user_id: i64,
    pub be_follower_id: i64,
}

/// Follow a user.
async fn follow(
    State(state): State<AppState>,
    Json(req): Json<FollowRequest>,
) -> AppResult<ApiResponse<()>> {
    state
        .relation_service
        .follow(req.user_id, req.be_follower_id)
        .await?;
    Ok(ApiResponse::ok(()))
}

/// Unfollow request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnfollowRequest {
    pub user_id: i64,
    pub un_be_follower_id: i64,
}

/// Unfollow a user.
async fn unfollow(
    State(state): State<AppState>,
    Json(req): Json<UnfollowRequest>,
) -> AppResult<ApiResponse<()>> {
    state
        .relation_service
        .unfollow(req.user_id, req.un_be_follower_id)
        .await?;
    Ok(ApiResponse::ok(()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserIdQuery {
    user_id: i64,
}

/// Compact user representation returned by the list endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub user_id: i64,
    pub username: String,
    pub avatar_url: Option<String>,
    pub signature: Option<String>,
}

impl From<user::Model> for UserSummary {
    fn from(profile: user::Model) -> Self {
        Self {
            user_id: profile.user_id,
            username: profile.username,
            avatar_url: profile.avatar_url,
            signature: profile.signature,
        }
    }
}

/// Users that a user follows.
async fn follow_list(
    State(state): State<AppState>,
    Query(query): Query<UserIdQuery>,
) -> AppResult<ApiResponse<Vec<UserSummary>>> {
    let users = state.relation_service.follow_list(query.user_id).await?;
    Ok(ApiResponse::ok(
        users.into_iter().map(UserSummary::from).collect(),
    ))
}

/// Users following a user.
async fn fans_list(
    State(state): State<AppState>,
    Query(query): Query<UserIdQuery>,
) -> AppResult<ApiResponse<Vec<UserSummary>>> {
    let users = state.relation_service.fans_list(query.user_id).await?;
    Ok(ApiResponse::ok(
        users.into_iter().map(UserSummary::from).collect(),
    ))
}

/// Count response.
#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: i64,
}

/// Number of users someone follows.
async fn count_follow(
    State(state): State<AppState>,
    Query(query): Query<UserIdQuery>,
) -> AppResult<ApiResponse<CountResponse>> {
    let count = state.relation_service.count_follow(query.user_id).await?;
    Ok(ApiResponse::ok(CountResponse { count }))
}

/// Number of users following someone.
async fn count_fans(
    State(state): State<AppState>,
    Query(query): Query<UserIdQuery>,
) -> AppResult<ApiResponse<CountResponse>> {
    let count = state.relation_service.count_fans(query.user_id).await?;
    Ok(ApiResponse::ok(CountResponse { count }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IsFollowQuery {
    user_id: i64,
    follow_id: i64,
}

/// Is-follow response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IsFollowResponse {
    pub is_follow: bool,
}

/// Whether one user follows another.
async fn is_follow(
    State(state): State<AppState>,
    Query(query): Query<IsFollowQuery>,
) -> AppResult<ApiResponse<IsFollowResponse>> {
    let is_follow = state
        .relation_service
        .is_follow(query.user_id, query.follow_id)
        .await?;
    Ok(ApiResponse::ok(IsFollowResponse { is_follow }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/follow", post(follow))
        .route("/unfollow", post(unfollow))
        .route("/follow/list", get(follow_list))
        .route("/fans/list", get(fans_list))
        .route("/follow/count", get(count_follow))
        .route("/fans/count", get(count_fans))
        .route("/is-follow", get(is_follow))
}
