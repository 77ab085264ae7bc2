//! Stored JSON payloads and their normalization to objects.
//!
//! Profile payloads are JSON objects, but legacy rows hold them encoded as a
//! JSON string, sometimes twice. [`RawJson`] tags which shape a stored value
//! has; [`RawJson::into_object`] decodes at most [`MAX_DECODE_DEPTH`] times
//! and only succeeds when the result is an object.

use serde_json::{Map, Value};

/// Maximum number of string-decoding passes applied to a stored value.
pub const MAX_DECODE_DEPTH: usize = 2;

/// A JSON document as read back from storage.
#[derive(Debug, Clone, PartialEq)]
pub enum RawJson {
    /// Already a JSON object.
    Object(Map<String, Value>),
    /// A JSON string whose contents are themselves JSON.
    Encoded(String),
    /// Any other JSON value. Never valid as a payload.
    Other(Value),
}

/// Reasons a stored value could not be normalized to an object.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RawJsonError {
    /// A string layer did not contain valid JSON.
    #[error("invalid JSON at decode pass {pass}: {reason}")]
    Malformed {
        /// 1-based decode pass that failed.
        pass: usize,
        /// Parser message.
        reason: String,
    },
    /// Decoding settled on something other than an object.
    #[error("expected a JSON object, found {found}")]
    NotAnObject {
        /// JSON type name of the final value.
        found: &'static str,
    },
    /// Still a string after the maximum number of passes.
    #[error("value still encoded after {MAX_DECODE_DEPTH} decode passes")]
    TooDeep,
}

impl From<Value> for RawJson {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::Object(map),
            Value::String(s) => Self::Encoded(s),
            other => Self::Other(other),
        }
    }
}

impl RawJson {
    /// Decodes the value down to a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`RawJsonError`] when a string layer is not JSON, when the
    /// value is still a string after [`MAX_DECODE_DEPTH`] passes, or when it
    /// settles on a non-object.
    pub fn into_object(self) -> Result<Map<String, Value>, RawJsonError> {
        let mut current = self;
        for pass in 1..=MAX_DECODE_DEPTH {
            match current {
                Self::Object(map) => return Ok(map),
                Self::Other(value) => {
                    return Err(RawJsonError::NotAnObject {
                        found: type_name(&value),
                    });
                }
                Self::Encoded(text) => {
                    let decoded: Value =
                        serde_json::from_str(&text).map_err(|e| RawJsonError::Malformed {
                            pass,
                            reason: e.to_string(),
                        })?;
                    current = Self::from(decoded);
                }
            }
        }
        match current {
            Self::Object(map) => Ok(map),
            Self::Encoded(_) => Err(RawJsonError::TooDeep),
            Self::Other(value) => Err(RawJsonError::NotAnObject {
                found: type_name(&value),
            }),
        }
    }
}

/// Normalizes an optional stored value. `None` and JSON `null` stay `None`.
///
/// # Errors
///
/// See [`RawJson::into_object`].
pub fn normalize(value: Option<Value>) -> Result<Option<Map<String, Value>>, RawJsonError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(value) => RawJson::from(value).into_object().map(Some),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
