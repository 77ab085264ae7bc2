//! Log endpoint DTOs.

use serde::Deserialize;
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{LogType, NewLogEntry};
use crate::error::ArchiveError;

/// Request body for `POST /logs`.
///
/// `type` and `message` are optional at the serde level so that a missing
/// field yields the service's own 400 body rather than a rejection.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateLogRequest {
    /// `ERROR`, `WARNING` or `INFO`; other values are recorded as `INFO`.
    #[serde(rename = "type")]
    pub log_type: Option<String>,
    /// Message text.
    pub message: Option<String>,
    /// Optional stack trace, kept for `ERROR` entries.
    #[serde(default)]
    pub stack: Option<String>,
    /// Optional structured context. Must be an object when present.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub details: Option<Value>,
}

impl CreateLogRequest {
    /// Validates the request and builds the entry to append.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Validation`] when `type` or `message` is
    /// missing or empty, or `details` is not an object.
    pub fn into_entry(self) -> Result<NewLogEntry, ArchiveError> {
        let (Some(log_type), Some(message)) = (
            self.log_type.filter(|t| !t.trim().is_empty()),
            self.message.filter(|m| !m.is_empty()),
        ) else {
            return Err(ArchiveError::Validation(
                "Missing type or message".to_string(),
            ));
        };

        let details = match self.details {
            None | Some(Value::Null) => None,
            Some(obj @ Value::Object(_)) => Some(obj),
            Some(_) => {
                return Err(ArchiveError::Validation(
                    "details must be a JSON object".to_string(),
                ));
            }
        };

        let log_type = LogType::from_client(&log_type);
        let stack = match log_type {
            LogType::Error => self.stack,
            LogType::Warning | LogType::Info => None,
        };
        Ok(NewLogEntry::new(log_type, message)
            .with_stack(stack)
            .with_details(details))
    }
}

/// Query parameters for `GET /logs`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LogQueryParams {
    /// Inclusive lower bound: RFC 3339 timestamp or `YYYY-MM-DD`.
    pub from: Option<String>,
    /// Inclusive upper bound: RFC 3339 timestamp or `YYYY-MM-DD` (whole day).
    pub to: Option<String>,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use serde_json::json;

    use super::*;

    fn request(body: Value) -> CreateLogRequest {
        let Ok(req) = serde_json::from_value(body) else {
            panic!("fixture must deserialize");
        };
        req
    }

    #[test]
    fn error_entries_keep_stack() {
        let Ok(entry) = request(json!({
            "type": "ERROR", "message": "boom", "stack": "at x", "details": {"k": 1}
        }))
        .into_entry() else {
            panic!("valid request rejected");
        };
        assert_eq!(entry.log_type, LogType::Error);
        assert_eq!(entry.stack.as_deref(), Some("at x"));
        assert_eq!(entry.details, Some(json!({"k": 1})));
    }

    #[test]
    fn non_error_entries_drop_stack() {
        let Ok(entry) = request(json!({"type": "WARNING", "message": "m", "stack": "s"}))
            .into_entry()
        else {
            panic!("valid request rejected");
        };
        assert_eq!(entry.stack, None);
    }

    #[test]
    fn missing_fields_are_rejected() {
        for body in [
            json!({"message": "m"}),
            json!({"type": "INFO"}),
            json!({"type": "", "message": "m"}),
            json!({"type": "INFO", "message": "m", "details": [1]}),
        ] {
            assert!(matches!(
                request(body).into_entry(),
                Err(ArchiveError::Validation(_))
            ));
        }
    }
}
