//! Archive error types with HTTP status code mapping.
//!
//! [`ArchiveError`] is the central error type for the service. Each variant
//! maps to an HTTP status code and a flat JSON body carrying a `message`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// JSON error response body.
///
/// ```json
/// { "message": "Character not found in local archive", "code": 2001 }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message. Never carries storage internals.
    pub message: String,
    /// Numeric error code (see [`ArchiveError::error_code`]).
    pub code: u32,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                  |
/// |-----------|-----------------|------------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request              |
/// | 2000–2999 | State/Not Found | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server          | 500 Internal Server Error    |
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// No row matched the requested identity.
    #[error("{0}")]
    NotFound(String),

    /// Required input was missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// A write would violate the character identity uniqueness constraint.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The store was unreachable or a query failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Table creation failed at startup.
    #[error("schema error: {0}")]
    Schema(String),
}

impl ArchiveError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation(_) => 1001,
            Self::NotFound(_) => 2001,
            Self::Conflict(_) => 2002,
            Self::Storage(_) => 3001,
            Self::Schema(_) => 3002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Storage(_) | Self::Schema(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand to an HTTP client.
    ///
    /// Server-side variants collapse to a generic message; their detail only
    /// reaches the logs.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::NotFound(msg) | Self::Validation(msg) => msg.clone(),
            Self::Conflict(_) => "Conflicting character identity".to_string(),
            Self::Storage(_) | Self::Schema(_) => "Internal storage error".to_string(),
        }
    }

    /// Returns `true` for failures originating in the store.
    #[must_use]
    pub const fn is_server_side(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Schema(_))
    }
}

impl From<sqlx::Error> for ArchiveError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(db_err.message().to_string());
        }
        Self::Storage(err.to_string())
    }
}

impl IntoResponse for ArchiveError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if self.is_server_side() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            message: self.public_message(),
            code: self.error_code(),
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(
            ArchiveError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ArchiveError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ArchiveError::Storage("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ArchiveError::Schema("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn server_errors_hide_internal_detail() {
        let err = ArchiveError::Storage("connection refused to 10.0.0.3:5432".into());
        assert_eq!(err.public_message(), "Internal storage error");
        assert!(err.to_string().contains("10.0.0.3"));
    }

    #[test]
    fn client_errors_keep_their_message() {
        let err = ArchiveError::NotFound("Character not found in local archive".into());
        assert_eq!(err.public_message(), "Character not found in local archive");
        assert_eq!(err.error_code(), 2001);
    }
}
