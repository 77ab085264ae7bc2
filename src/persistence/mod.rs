//! Persistence layer: character archive and application log storage.
//!
//! Components receive an injected [`Storage`] rather than reaching for a
//! global handle. [`postgres::PostgresStore`] is the production backend;
//! [`memory::MemoryStore`] keeps identical semantics in process memory.

pub mod memory;
pub mod models;
pub mod postgres;
pub mod schema;

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use self::models::{CharacterRow, LogRow};
use crate::config::{AppConfig, StorageBackend};
use crate::domain::{CharacterKey, CharacterRecord, LogRange, NewLogEntry};
use crate::error::ArchiveError;

/// Character table operations.
#[async_trait]
pub trait CharacterStore: Send + Sync + Debug {
    /// All rows, newest `created_at` first.
    async fn list_characters(&self) -> Result<Vec<CharacterRow>, ArchiveError>;

    /// Exact-match lookup on the identity triple.
    async fn find_character(&self, key: &CharacterKey)
    -> Result<Option<CharacterRow>, ArchiveError>;

    /// Atomic insert-or-update keyed by the identity triple. On conflict
    /// only `score`, `last_crawled_at` and `raw_data` are overwritten.
    async fn upsert_character(&self, record: &CharacterRecord)
    -> Result<CharacterRow, ArchiveError>;

    /// Deletes the row for `key`, returning the number of rows removed.
    async fn delete_character(&self, key: &CharacterKey) -> Result<u64, ArchiveError>;

    /// Changes the realm of row `id`.
    ///
    /// Fails with [`ArchiveError::Conflict`] when another row already holds
    /// the resulting identity, and with [`ArchiveError::NotFound`] when `id`
    /// no longer exists.
    async fn rename_realm(&self, id: i64, realm: &str) -> Result<(), ArchiveError>;
}

/// Application log table operations.
#[async_trait]
pub trait LogStore: Send + Sync + Debug {
    /// Appends one entry.
    async fn insert_log(&self, entry: &NewLogEntry) -> Result<(), ArchiveError>;

    /// Entries inside `range`, newest first, at most `limit`.
    async fn query_logs(&self, range: &LogRange, limit: i64) -> Result<Vec<LogRow>, ArchiveError>;
}

/// A complete storage backend with explicit lifecycle.
#[async_trait]
pub trait Storage: CharacterStore + LogStore {
    /// Creates the `characters` and `app_log` tables if absent.
    ///
    /// Idempotent and safe to run alongside live traffic.
    async fn ensure_schema(&self) -> Result<(), ArchiveError>;

    /// Cheap reachability probe.
    async fn ping(&self) -> Result<(), ArchiveError>;

    /// Releases connections. The store must not be used afterwards.
    async fn close(&self);
}

/// Connects the backend selected by `config`.
///
/// # Errors
///
/// Returns [`ArchiveError::Storage`] when the connection pool cannot be
/// built (for example an invalid connection string).
pub async fn connect(config: &AppConfig) -> Result<Arc<dyn Storage>, ArchiveError> {
    match config.storage_backend {
        StorageBackend::Postgres => {
            let store = postgres::PostgresStore::connect(config).await?;
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => Ok(Arc::new(memory::MemoryStore::new())),
    }
}
