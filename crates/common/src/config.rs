//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Redis configuration.
    pub redis: RedisConfig,
    /// Authentication configuration.
    pub auth: AuthConfig,
    /// Cache layer configuration.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Sibling service configuration.
    #[serde(default)]
    pub siblings: SiblingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Node id embedded into generated ids (0-1023).
    #[serde(default)]
    pub node_id: u16,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Redis configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL.
    pub url: String,
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Secret used to sign access/refresh tokens.
    pub jwt_secret: String,
    /// Access token lifetime in seconds.
    #[serde(default = "default_access_ttl")]
    pub access_ttl_secs: i64,
    /// Refresh token lifetime in seconds.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_secs: i64,
}

/// Cache layer configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Default TTL applied to expiring cache writes, in seconds.
    #[serde(default = "default_cache_ttl")]
    pub default_ttl_secs: i64,
    /// Capacity of the background cache-population queue.
    #[serde(default = "default_background_queue")]
    pub background_queue: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: default_cache_ttl(),
            background_queue: default_background_queue(),
        }
    }
}

/// Base URLs of the sibling Like/Collect services.
#[derive(Debug, Clone, Deserialize)]
pub struct SiblingConfig {
    /// Like service base URL.
    #[serde(default = "default_like_url")]
    pub like_url: String,
    /// Collect service base URL.
    #[serde(default = "default_collect_url")]
    pub collect_url: String,
}

impl Default for SiblingConfig {
    fn default() -> Self {
        Self {
            like_url: default_like_url(),
            collect_url: default_collect_url(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

const fn default_access_ttl() -> i64 {
    15 * 60
}

const fn default_refresh_ttl() -> i64 {
    7 * 24 * 60 * 60
}

const fn default_cache_ttl() -> i64 {
    60 * 60
}

const fn default_background_queue() -> usize {
    256
}

fn default_like_url() -> String {
    "http://127.0.0.1:8101".to_string()
}

fn default_collect_url() -> String {
    "http://127.0.0.1:8102".to_string()
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `SPARROW_ENV`)
    /// 3. Environment variables with `SPARROW_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("SPARROW_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("SPARROW")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("SPARROW")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
