//! Database entities.

pub mod follow_edge;
pub mod user;
pub mod user_login;

pub use follow_edge::Entity as FollowEdge;
pub use user::Entity as User;
pub use user_login::Entity as UserLogin;
