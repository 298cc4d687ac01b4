//! API endpoints.

pub mod auth;
pub mod relation;
pub mod users;
