//! Application log handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{CreateLogRequest, LogQueryParams, MessageResponse};
use crate::app_state::AppState;
use crate::domain::{LogEntry, LogRange};
use crate::error::{ArchiveError, ErrorResponse};

/// `GET /logs` — Recent log entries.
///
/// # Errors
///
/// Returns [`ArchiveError::Validation`] for unparseable bounds and
/// [`ArchiveError::Storage`] when the log cannot be read.
#[utoipa::path(
    get,
    path = "/api/v1/logs",
    tag = "Logs",
    summary = "List log entries",
    description = "Returns at most 100 entries, newest first, optionally bounded by an inclusive created_at range.",
    params(LogQueryParams),
    responses(
        (status = 200, description = "Log entries", body = Vec<LogEntry>),
        (status = 400, description = "Invalid range", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    )
)]
pub async fn list_logs(
    State(state): State<AppState>,
    Query(params): Query<LogQueryParams>,
) -> Result<impl IntoResponse, ArchiveError> {
    let range = LogRange::parse(params.from.as_deref(), params.to.as_deref())?;
    let entries = state.logger.query(&range).await?;
    Ok(Json(entries))
}

/// `POST /logs` — Record a client-side log entry.
///
/// Storage failures are absorbed by the logger, so a valid request always
/// receives 201.
///
/// # Errors
///
/// Returns [`ArchiveError::Validation`] when `type` or `message` is missing.
#[utoipa::path(
    post,
    path = "/api/v1/logs",
    tag = "Logs",
    summary = "Record a log entry",
    request_body = CreateLogRequest,
    responses(
        (status = 201, description = "Log recorded", body = MessageResponse),
        (status = 400, description = "Missing type or message", body = ErrorResponse),
    )
)]
pub async fn create_log(
    State(state): State<AppState>,
    payload: Result<Json<CreateLogRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ArchiveError> {
    let Json(req) = payload.map_err(|rejection| {
        tracing::debug!(%rejection, "rejected log payload");
        ArchiveError::Validation("Missing type or message".to_string())
    })?;
    let entry = req.into_entry()?;
    state.logger.append(entry).await;
    Ok((StatusCode::CREATED, Json(MessageResponse::new("Log recorded"))))
}

/// Log routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/logs", get(list_logs).post(create_log))
}
