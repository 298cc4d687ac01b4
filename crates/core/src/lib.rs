//! Core business logic for sparrow.

pub mod clients;
pub mod services;

pub use clients::{CollectClient, HttpCollectClient, HttpLikeClient, LikeClient};
pub use services::*;
