//! Common utilities and shared types for sparrow.
//!
//! This crate provides foundational components used across all sparrow crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID generation**: Numeric snowflake-style ids via [`IdGenerator`]
//! - **Passwords**: Argon2 hashing helpers
//! - **Tokens**: Access/refresh JWT issuance via [`TokenIssuer`]

pub mod config;
pub mod error;
pub mod id;
pub mod password;
pub mod token;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenIssuer, TokenKind, TokenPair};
