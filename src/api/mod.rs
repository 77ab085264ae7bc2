//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Resource endpoints are mounted under `/api/v1`; `/health` sits at the
//! root.

pub mod dto;
pub mod handlers;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document covering every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "mplus-archive", description = "Mythic+ character snapshot archive"),
    paths(
        handlers::characters::list_characters,
        handlers::characters::get_character,
        handlers::characters::archive_character,
        handlers::characters::delete_character,
        handlers::logs::list_logs,
        handlers::logs::create_log,
        handlers::system::health_handler,
    ),
    components(schemas(
        crate::domain::CharacterSnapshot,
        crate::domain::LogEntry,
        crate::domain::LogType,
        crate::domain::Region,
        dto::MessageResponse,
        dto::CreateLogRequest,
        crate::error::ErrorResponse,
        handlers::system::HealthResponse,
    )),
    tags(
        (name = "Characters", description = "Archived character snapshots"),
        (name = "Logs", description = "Application log"),
        (name = "System", description = "Service health"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}

/// Builds the service with request tracing and permissive CORS, bound to
/// `state`.
pub fn build_app(state: AppState) -> Router {
    build_router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
