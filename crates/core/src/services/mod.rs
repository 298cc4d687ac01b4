//! Business-logic services.

pub mod profile;
pub mod relation;
pub mod user;

pub use profile::{ProfileService, UserInfo};
pub use relation::RelationService;
pub use user::{SignupInput, UserService};
