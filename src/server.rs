//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, cache setup, service wiring, and Axum server
//! lifecycle.

use crate::application::services::{AuthService, QuestionCache, QuestionService};
use crate::config::{CacheBackend, Config};
use crate::domain::authorization::OwnershipGate;
use crate::domain::repositories::QuestionRepository;
use crate::infrastructure::cache::{CacheService, MemoryCache, NullCache, RedisCache};
use crate::infrastructure::persistence::{
    PgAnswerRepository, PgQuestionRepository, PgTagRepository, PgTokenRepository,
};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// How often the in-memory cache drops expired entries nobody read again.
const PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Cache backend selected by `CACHE_BACKEND`
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = connect_database(&config).await?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to apply migrations")?;

    let cache = build_cache(&config).await;
    let state = build_state(Arc::new(pool), cache, &config);

    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Opens the PostgreSQL pool with the configured limits.
///
/// # Errors
///
/// Returns an error if no connection can be established.
pub async fn connect_database(config: &Config) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout)
        .idle_timeout(config.database.idle_timeout)
        .max_lifetime(config.database.max_lifetime)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")
}

/// Builds the cache backend named by the configuration.
///
/// An unreachable Redis at startup degrades to the in-memory backend rather
/// than aborting; once running, cache failures surface as request errors.
pub async fn build_cache(config: &Config) -> Arc<dyn CacheService> {
    match (config.cache.backend, config.cache.redis_url.as_deref()) {
        (CacheBackend::Redis, Some(redis_url)) => match RedisCache::connect(redis_url).await {
            Ok(redis) => {
                tracing::info!("Cache enabled (Redis)");
                Arc::new(redis)
            }
            Err(e) => {
                tracing::warn!("Failed to connect to Redis: {}. Using in-memory cache.", e);
                memory_cache()
            }
        },
        (CacheBackend::Redis, None) | (CacheBackend::Memory, _) => {
            tracing::info!("Cache enabled (in-memory)");
            memory_cache()
        }
        (CacheBackend::None, _) => {
            tracing::info!("Cache disabled (NullCache)");
            Arc::new(NullCache::new())
        }
    }
}

fn memory_cache() -> Arc<dyn CacheService> {
    let cache = Arc::new(MemoryCache::new());

    let sweeper = cache.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            let purged = sweeper.purge_expired();
            if purged > 0 {
                tracing::debug!(purged, "Purged expired cache entries");
            }
        }
    });

    cache
}

/// Wires repositories, services and the gate into the shared state.
pub fn build_state(pool: Arc<PgPool>, cache: Arc<dyn CacheService>, config: &Config) -> AppState {
    let questions: Arc<dyn QuestionRepository> = Arc::new(PgQuestionRepository::new(pool.clone()));
    let tags = Arc::new(PgTagRepository::new(pool.clone()));
    let answers = Arc::new(PgAnswerRepository::new(pool.clone()));
    let tokens = Arc::new(PgTokenRepository::new(pool));

    let question_cache = Arc::new(QuestionCache::new(
        cache.clone(),
        questions.clone(),
        config.cache.ttl,
        config.questions_per_page,
    ));
    let question_service = Arc::new(QuestionService::new(questions, tags, answers));
    let auth_service = Arc::new(AuthService::new(
        tokens,
        config.token_signing_secret.clone(),
    ));

    AppState::new(
        question_service,
        question_cache,
        auth_service,
        Arc::new(OwnershipGate),
        cache,
    )
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}
