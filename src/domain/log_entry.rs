//! Application log entries and the time range used to query them.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::error::ArchiveError;

/// Maximum number of entries returned by a log query.
pub const LOG_QUERY_LIMIT: i64 = 100;

/// Severity of a log entry. Stored uppercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogType {
    /// Failure of an operation.
    Error,
    /// Recoverable anomaly.
    Warning,
    /// Informational event.
    Info,
}

impl LogType {
    /// Returns the stored form of the type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
        }
    }

    /// Maps a client-supplied type to a [`LogType`]. Anything that is not
    /// `ERROR` or `WARNING` (case-insensitive) is recorded as `INFO`.
    #[must_use]
    pub fn from_client(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "ERROR" => Self::Error,
            "WARNING" | "WARN" => Self::Warning,
            _ => Self::Info,
        }
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Write model for a log entry.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLogEntry {
    /// Severity.
    pub log_type: LogType,
    /// Message text.
    pub message: String,
    /// Optional stack trace or error chain.
    pub stack: Option<String>,
    /// Optional structured context.
    pub details: Option<Value>,
}

impl NewLogEntry {
    /// Creates an entry without stack or details.
    #[must_use]
    pub fn new(log_type: LogType, message: impl Into<String>) -> Self {
        Self {
            log_type,
            message: message.into(),
            stack: None,
            details: None,
        }
    }

    /// Attaches a stack trace.
    #[must_use]
    pub fn with_stack(mut self, stack: Option<String>) -> Self {
        self.stack = stack;
        self
    }

    /// Attaches structured details.
    #[must_use]
    pub fn with_details(mut self, details: Option<Value>) -> Self {
        self.details = details;
        self
    }
}

/// A stored log entry as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LogEntry {
    /// Surrogate row ID.
    pub id: i64,
    /// Severity, as stored.
    pub log_type: String,
    /// Message text.
    pub message: String,
    /// Optional stack trace.
    pub stack: Option<String>,
    /// Decoded details object.
    #[schema(value_type = Option<Object>)]
    pub details: Option<Map<String, Value>>,
    /// Server timestamp.
    pub created_at: DateTime<Utc>,
}

/// Inclusive `created_at` bounds for a log query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogRange {
    /// Earliest timestamp to include.
    pub from: Option<DateTime<Utc>>,
    /// Latest timestamp to include.
    pub to: Option<DateTime<Utc>>,
}

impl LogRange {
    /// Parses query-string bounds.
    ///
    /// Each bound is either an RFC 3339 timestamp or a `YYYY-MM-DD` date. A
    /// date-only `from` starts at midnight; a date-only `to` covers the whole
    /// day. Empty strings are treated as absent.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Validation`] for unparseable bounds or when
    /// `from` is after `to`.
    pub fn parse(from: Option<&str>, to: Option<&str>) -> Result<Self, ArchiveError> {
        let from = from
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_bound(s, Bound::Start))
            .transpose()?;
        let to = to
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_bound(s, Bound::End))
            .transpose()?;

        if let (Some(f), Some(t)) = (from, to)
            && f > t
        {
            return Err(ArchiveError::Validation(
                "'from' must not be after 'to'".to_string(),
            ));
        }
        Ok(Self { from, to })
    }

    /// Returns `true` when `ts` falls inside the range.
    #[must_use]
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.from.is_none_or(|f| ts >= f) && self.to.is_none_or(|t| ts <= t)
    }
}

#[derive(Clone, Copy)]
enum Bound {
    Start,
    End,
}

fn parse_bound(s: &str, bound: Bound) -> Result<DateTime<Utc>, ArchiveError> {
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| ArchiveError::Validation(format!("invalid date bound: {s}")))?;
    let time = match bound {
        Bound::Start => NaiveTime::MIN,
        Bound::End => NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999).unwrap_or(NaiveTime::MIN),
    };
    Ok(date.and_time(time).and_utc())
}
