//! Database repositories.

pub mod follow;
pub mod user;

pub use follow::FollowRepository;
pub use user::UserRepository;
