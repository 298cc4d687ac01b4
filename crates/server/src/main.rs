//! Sparrow server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use fred::prelude::*;
use sparrow_api::{router, AppState};
use sparrow_cache::{BackgroundTasks, CacheBackend, RedisBackend};
use sparrow_common::{Config, IdGenerator, TokenIssuer};
use sparrow_core::{
    HttpCollectClient, HttpLikeClient, ProfileService, RelationService, UserService,
};
use sparrow_db::repositories::{FollowRepository, UserRepository};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sparrow=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting sparrow server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = sparrow_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    sparrow_db::migrate(&db).await?;
    info!("Migrations completed");

    // Connect to Redis
    info!("Connecting to Redis...");
    let redis_config = fred::types::config::Config::from_url(&config.redis.url)?;
    let redis_client = Client::new(redis_config, None, None, None);
    redis_client.connect();
    redis_client.wait_for_connect().await?;
    let backend: Arc<dyn CacheBackend> = Arc::new(RedisBackend::new(Arc::new(redis_client)));
    info!("Connected to Redis");

    // Shared infrastructure
    let background = BackgroundTasks::start(config.cache.background_queue);
    let id_gen = Arc::new(IdGenerator::new(config.server.node_id));
    let tokens = TokenIssuer::new(&config.auth);

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let follow_repo = FollowRepository::new(Arc::clone(&db));

    // Initialize services
    let cache_ttl = config.cache.default_ttl_secs;
    let relation_service = RelationService::new(
        follow_repo,
        user_repo.clone(),
        Arc::clone(&backend),
        background,
        cache_ttl,
    );
    let user_service = UserService::new(
        user_repo.clone(),
        Arc::clone(&backend),
        id_gen,
        tokens,
        cache_ttl,
    );
    let like_client = Arc::new(HttpLikeClient::new(config.siblings.like_url.clone()));
    let collect_client = Arc::new(HttpCollectClient::new(config.siblings.collect_url.clone()));
    let profile_service = ProfileService::new(
        user_repo,
        relation_service.clone(),
        like_client,
        collect_client,
        Arc::clone(&backend),
        cache_ttl,
    );

    let state = AppState {
        user_service,
        relation_service,
        profile_service,
    };

    // Build the router
    let app = router(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    // Serve
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!(%addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
