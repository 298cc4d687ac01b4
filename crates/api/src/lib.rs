//! HTTP API layer for sparrow.

pub mod endpoints;
pub mod response;
pub mod state;

use axum::Router;

pub use response::{ApiError, ApiResponse};
pub use state::AppState;

/// Assemble the full application router.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/relation", endpoints::relation::router())
        .nest("/auth", endpoints::auth::router())
        .nest("/user", endpoints::users::router())
        .with_state(state)
}
