//! Character archive handlers: list, lookup, archive, delete.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;

use crate::api::dto::MessageResponse;
use crate::app_state::AppState;
use crate::domain::{CharacterKey, CharacterSnapshot};
use crate::error::{ArchiveError, ErrorResponse};

/// `GET /characters` — All archived snapshots, newest first.
///
/// # Errors
///
/// Returns [`ArchiveError::Storage`] if the archive cannot be read.
#[utoipa::path(
    get,
    path = "/api/v1/characters",
    tag = "Characters",
    summary = "List archived characters",
    description = "Returns every archived snapshot, newest first. Payloads that cannot be decoded are returned as null.",
    responses(
        (status = 200, description = "Archived snapshots", body = Vec<CharacterSnapshot>),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    )
)]
pub async fn list_characters(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ArchiveError> {
    let snapshots = state.archive.list_all().await?;
    Ok(Json(snapshots))
}

/// `GET /characters/{region}/{realm}/{name}` — Look up one snapshot.
///
/// # Errors
///
/// Returns [`ArchiveError::NotFound`] if the character is not archived.
#[utoipa::path(
    get,
    path = "/api/v1/characters/{region}/{realm}/{name}",
    tag = "Characters",
    summary = "Get an archived character",
    description = "Exact, case-sensitive lookup on region, realm slug and name as stored.",
    params(
        ("region" = String, Path, description = "Region code as stored (eu, us, kr, tw)"),
        ("realm" = String, Path, description = "Realm slug"),
        ("name" = String, Path, description = "Character name"),
    ),
    responses(
        (status = 200, description = "Archived snapshot", body = CharacterSnapshot),
        (status = 404, description = "Character not archived", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    )
)]
pub async fn get_character(
    State(state): State<AppState>,
    Path((region, realm, name)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, ArchiveError> {
    let key = CharacterKey::new(region, realm, name);
    let snapshot = state.archive.get(&key).await?;
    Ok(Json(snapshot))
}

/// `POST /characters` — Archive a profile payload.
///
/// # Errors
///
/// Returns [`ArchiveError::Validation`] when `name` or `realm` is missing
/// and [`ArchiveError::Storage`] when the write fails.
#[utoipa::path(
    post,
    path = "/api/v1/characters",
    tag = "Characters",
    summary = "Archive a character",
    description = "Stores the full upstream profile. An existing snapshot with the same region, realm and name is overwritten; its created_at is kept.",
    request_body(content = serde_json::Value, description = "Upstream character profile; name and realm required, region defaults to eu"),
    responses(
        (status = 201, description = "Character archived", body = MessageResponse),
        (status = 400, description = "Missing name or realm", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    )
)]
pub async fn archive_character(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ArchiveError> {
    let Json(profile) = payload.map_err(|rejection| {
        tracing::debug!(%rejection, "rejected character payload");
        ArchiveError::Validation("Invalid character data".to_string())
    })?;
    state.archive.upsert(profile).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Character archived successfully")),
    ))
}

/// `DELETE /characters/{region}/{realm}/{name}` — Remove a snapshot.
///
/// # Errors
///
/// Returns [`ArchiveError::NotFound`] if the character is not archived.
#[utoipa::path(
    delete,
    path = "/api/v1/characters/{region}/{realm}/{name}",
    tag = "Characters",
    summary = "Delete an archived character",
    params(
        ("region" = String, Path, description = "Region code as stored (eu, us, kr, tw)"),
        ("realm" = String, Path, description = "Realm slug"),
        ("name" = String, Path, description = "Character name"),
    ),
    responses(
        (status = 200, description = "Character deleted", body = MessageResponse),
        (status = 404, description = "Character not archived", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    )
)]
pub async fn delete_character(
    State(state): State<AppState>,
    Path((region, realm, name)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, ArchiveError> {
    let key = CharacterKey::new(region, realm, name);
    state.archive.delete(&key).await?;
    Ok(Json(MessageResponse::new(
        "Character deleted from archive successfully",
    )))
}

/// Character archive routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/characters", get(list_characters).post(archive_character))
        .route(
            "/characters/{region}/{realm}/{name}",
            get(get_character).delete(delete_character),
        )
}
