//! Application logger: best-effort writes to the `app_log` table.

use std::sync::Arc;

use serde_json::Value;

use crate::domain::log_entry::LOG_QUERY_LIMIT;
use crate::domain::raw_json;
use crate::domain::{LogEntry, LogRange, LogType, NewLogEntry};
use crate::error::ArchiveError;
use crate::persistence::LogStore;
use crate::persistence::models::LogRow;

/// Writes structured entries to the [`LogStore`] and reads them back.
///
/// [`AppLogger::append`] never fails: when the store rejects a write, the
/// entry is emitted through `tracing` instead, so a broken log table can
/// never take down the operation that was being logged.
#[derive(Debug, Clone)]
pub struct AppLogger {
    store: Arc<dyn LogStore>,
}

impl AppLogger {
    /// Creates a logger writing to `store`.
    #[must_use]
    pub fn new(store: Arc<dyn LogStore>) -> Self {
        Self { store }
    }

    /// Appends an entry, falling back to `tracing` on storage failure.
    pub async fn append(&self, entry: NewLogEntry) {
        if let Err(e) = self.store.insert_log(&entry).await {
            tracing::error!(
                error = %e,
                log_type = %entry.log_type,
                message = %entry.message,
                stack = entry.stack.as_deref(),
                details = ?entry.details,
                "failed to write app log entry"
            );
        }
    }

    /// Records an error with its display chain as the stack.
    pub async fn error(
        &self,
        message: impl Into<String>,
        err: &(dyn std::error::Error + Send + Sync),
        details: Option<Value>,
    ) {
        let entry = NewLogEntry::new(LogType::Error, message)
            .with_stack(Some(error_chain(err)))
            .with_details(details);
        self.append(entry).await;
    }

    /// Records a warning.
    pub async fn warning(&self, message: impl Into<String>, details: Option<Value>) {
        self.append(NewLogEntry::new(LogType::Warning, message).with_details(details))
            .await;
    }

    /// Records an informational event.
    pub async fn info(&self, message: impl Into<String>, details: Option<Value>) {
        self.append(NewLogEntry::new(LogType::Info, message).with_details(details))
            .await;
    }

    /// Entries inside `range`, newest first, at most [`LOG_QUERY_LIMIT`].
    ///
    /// `details` is decoded like character payloads; a value that cannot be
    /// decoded to an object is returned as `null`.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Storage`] if the query fails.
    pub async fn query(&self, range: &LogRange) -> Result<Vec<LogEntry>, ArchiveError> {
        let rows = self.store.query_logs(range, LOG_QUERY_LIMIT).await?;
        Ok(rows.into_iter().map(into_entry).collect())
    }
}

fn into_entry(row: LogRow) -> LogEntry {
    let details = raw_json::normalize(row.details).unwrap_or_else(|e| {
        tracing::warn!(log_id = row.id, error = %e, "undecodable log details");
        None
    });
    LogEntry {
        id: row.id,
        log_type: row.log_type,
        message: row.message,
        stack: row.stack,
        details,
        created_at: row.created_at,
    }
}

/// Renders an error and its sources, one per line.
fn error_chain(err: &(dyn std::error::Error + Send + Sync)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str("\ncaused by: ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
