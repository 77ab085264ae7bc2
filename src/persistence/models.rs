//! Database rows for characters and log entries.
//!
//! Rows carry JSON columns exactly as stored; decoding to objects happens in
//! the service layer.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::FromRow;

/// A row from the `characters` table.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct CharacterRow {
    /// Auto-increment row ID.
    pub id: i64,
    /// Character name.
    pub name: String,
    /// Realm slug or legacy display name.
    pub realm: String,
    /// Region code.
    pub region: String,
    /// Current-season score.
    pub score: Option<f64>,
    /// Upstream crawl timestamp.
    pub last_crawled_at: Option<DateTime<Utc>>,
    /// Profile payload; may be a legacy encoded string.
    pub raw_data: Option<Value>,
    /// First-insert timestamp.
    pub created_at: DateTime<Utc>,
}

/// A row from the `app_log` table.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct LogRow {
    /// Auto-increment row ID.
    pub id: i64,
    /// `ERROR`, `WARNING` or `INFO`.
    pub log_type: String,
    /// Message text.
    pub message: String,
    /// Optional stack trace.
    pub stack: Option<String>,
    /// Structured details; may be a legacy encoded string.
    pub details: Option<Value>,
    /// Server timestamp.
    pub created_at: DateTime<Utc>,
}
