//! System endpoints: health check.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    storage: String,
    timestamp: String,
    version: String,
}

/// `GET /health` — Service health status.
///
/// Answers 200 while the store is reachable and 503 otherwise; the process
/// keeps serving either way.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health, store reachability, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Store unreachable", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let (status, code, storage) = match state.storage.ping().await {
        Ok(()) => ("healthy", StatusCode::OK, "up".to_string()),
        Err(e) => {
            tracing::warn!(error = %e, "health check: store unreachable");
            ("degraded", StatusCode::SERVICE_UNAVAILABLE, "down".to_string())
        }
    };
    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            storage,
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_handler))
}
