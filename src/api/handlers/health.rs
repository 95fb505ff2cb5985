//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{
    CacheCheck, CheckStatus, HealthChecks, HealthResponse, ServiceStatus,
};
use crate::state::AppState;

/// `GET /health`: checks the question store and the cache backend.
///
/// Responds `200` when both answer and `503` otherwise. A failing cache is
/// reported as degraded because question reads fail while it is down.
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "database": { "status": "ok", "message": "Connected, 42 questions" },
///     "cache": { "backend": "redis", "status": "ok", "message": "redis reachable" }
///   }
/// }
/// ```
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (database, cache) = tokio::join!(check_database(&state), check_cache(&state));

    let healthy = database.is_ok() && cache.check.is_ok();
    let (code, status) = if healthy {
        (StatusCode::OK, ServiceStatus::Healthy)
    } else {
        tracing::warn!(?database, ?cache, "Health check degraded");
        (StatusCode::SERVICE_UNAVAILABLE, ServiceStatus::Degraded)
    };

    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            checks: HealthChecks { database, cache },
        }),
    )
}

async fn check_database(state: &AppState) -> CheckStatus {
    match state.question_service.ping().await {
        Ok(count) => CheckStatus::ok(format!("Connected, {count} questions")),
        Err(e) => CheckStatus::error(format!("Database error: {e}")),
    }
}

async fn check_cache(state: &AppState) -> CacheCheck {
    let backend = state.cache.backend_name();
    let check = if state.cache.health_check().await {
        CheckStatus::ok(format!("{backend} reachable"))
    } else {
        CheckStatus::error(format!("{backend} unreachable"))
    };

    CacheCheck { backend, check }
}
