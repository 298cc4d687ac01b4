//! Shared application state.

use sparrow_core::{ProfileService, RelationService, UserService};

/// Application state handed to every endpoint.
///
/// Services are constructed once at startup and injected here; handlers
/// never reach for global clients.
#[derive(Clone)]
pub struct AppState {
    /// User signup/login service.
    pub user_service: UserService,
    /// Follow/unfollow service.
    pub relation_service: RelationService,
    /// Profile aggregation service.
    pub profile_service: ProfileService,
}
