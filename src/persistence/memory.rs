//! Process-local store with the same semantics as the PostgreSQL backend.
//!
//! All state lives behind one [`tokio::sync::RwLock`]; every mutation takes
//! the write lock for its whole duration, which makes upsert and rename
//! atomic with respect to each other. The log keeps only the newest
//! [`DEFAULT_LOG_CAPACITY`] entries.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;

use super::models::{CharacterRow, LogRow};
use super::{CharacterStore, LogStore, Storage};
use crate::domain::{CharacterKey, CharacterRecord, LogRange, NewLogEntry};
use crate::error::ArchiveError;

/// Log entries retained by [`MemoryStore::new`].
pub const DEFAULT_LOG_CAPACITY: usize = 10_000;

#[derive(Debug, Default)]
struct Tables {
    next_character_id: i64,
    next_log_id: i64,
    characters: BTreeMap<i64, CharacterRow>,
    logs: Vec<LogRow>,
    closed: bool,
}

impl Tables {
    fn ensure_open(&self) -> Result<(), ArchiveError> {
        if self.closed {
            return Err(ArchiveError::Storage("store is closed".to_string()));
        }
        Ok(())
    }

    fn find_id(&self, name: &str, realm: &str, region: &str) -> Option<i64> {
        self.characters
            .values()
            .find(|row| row.name == name && row.realm == realm && row.region == region)
            .map(|row| row.id)
    }

    fn allocate_character_id(&mut self) -> i64 {
        self.next_character_id += 1;
        self.next_character_id
    }

    fn allocate_log_id(&mut self) -> i64 {
        self.next_log_id += 1;
        self.next_log_id
    }
}

/// In-memory [`Storage`] implementation.
#[derive(Debug)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    log_capacity: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an empty store keeping at most [`DEFAULT_LOG_CAPACITY`] log
    /// entries.
    #[must_use]
    pub fn new() -> Self {
        Self::with_log_capacity(DEFAULT_LOG_CAPACITY)
    }

    /// Creates an empty store keeping at most `log_capacity` log entries.
    /// Once full, each append evicts the entry with the oldest `created_at`.
    #[must_use]
    pub fn with_log_capacity(log_capacity: usize) -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            log_capacity: log_capacity.max(1),
        }
    }

    /// Inserts a character row verbatim, bypassing upsert normalization.
    ///
    /// Used to load legacy fixtures such as string-encoded `raw_data`.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Conflict`] if the identity triple is taken.
    pub async fn insert_raw_character(
        &self,
        name: &str,
        realm: &str,
        region: &str,
        raw_data: Option<Value>,
        created_at: DateTime<Utc>,
    ) -> Result<i64, ArchiveError> {
        let mut tables = self.tables.write().await;
        tables.ensure_open()?;
        if tables.find_id(name, realm, region).is_some() {
            return Err(ArchiveError::Conflict(format!("{region}/{realm}/{name}")));
        }
        let id = tables.allocate_character_id();
        tables.characters.insert(
            id,
            CharacterRow {
                id,
                name: name.to_string(),
                realm: realm.to_string(),
                region: region.to_string(),
                score: None,
                last_crawled_at: None,
                raw_data,
                created_at,
            },
        );
        Ok(id)
    }

    /// Appends a log row with an explicit timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Storage`] once the store is closed.
    pub async fn insert_log_at(
        &self,
        entry: &NewLogEntry,
        created_at: DateTime<Utc>,
    ) -> Result<i64, ArchiveError> {
        let mut tables = self.tables.write().await;
        tables.ensure_open()?;
        let id = tables.allocate_log_id();
        tables.logs.push(LogRow {
            id,
            log_type: entry.log_type.as_str().to_string(),
            message: entry.message.clone(),
            stack: entry.stack.clone(),
            details: entry.details.clone(),
            created_at,
        });
        while tables.logs.len() > self.log_capacity {
            let oldest = tables
                .logs
                .iter()
                .enumerate()
                .min_by_key(|(_, row)| (row.created_at, row.id))
                .map(|(index, _)| index);
            match oldest {
                Some(index) => {
                    tables.logs.remove(index);
                }
                None => break,
            }
        }
        Ok(id)
    }

    /// Number of character rows.
    pub async fn character_count(&self) -> usize {
        self.tables.read().await.characters.len()
    }
}

#[async_trait]
impl CharacterStore for MemoryStore {
    async fn list_characters(&self) -> Result<Vec<CharacterRow>, ArchiveError> {
        let tables = self.tables.read().await;
        tables.ensure_open()?;
        let mut rows: Vec<CharacterRow> = tables.characters.values().cloned().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn find_character(
        &self,
        key: &CharacterKey,
    ) -> Result<Option<CharacterRow>, ArchiveError> {
        let tables = self.tables.read().await;
        tables.ensure_open()?;
        Ok(tables
            .find_id(&key.name, &key.realm, key.region.as_str())
            .and_then(|id| tables.characters.get(&id))
            .cloned())
    }

    async fn upsert_character(
        &self,
        record: &CharacterRecord,
    ) -> Result<CharacterRow, ArchiveError> {
        let mut tables = self.tables.write().await;
        tables.ensure_open()?;
        let raw_data = Some(Value::Object(record.raw_data.clone()));
        let existing = tables.find_id(&record.key.name, &record.key.realm, record.key.region.as_str());

        let id = match existing {
            Some(id) => id,
            None => {
                let id = tables.allocate_character_id();
                tables.characters.insert(
                    id,
                    CharacterRow {
                        id,
                        name: record.key.name.clone(),
                        realm: record.key.realm.clone(),
                        region: record.key.region.as_str().to_string(),
                        score: None,
                        last_crawled_at: None,
                        raw_data: None,
                        created_at: Utc::now(),
                    },
                );
                id
            }
        };

        let row = tables
            .characters
            .get_mut(&id)
            .ok_or_else(|| ArchiveError::Storage(format!("row {id} vanished during upsert")))?;
        row.score = Some(record.score);
        row.last_crawled_at = record.last_crawled_at;
        row.raw_data = raw_data;
        Ok(row.clone())
    }

    async fn delete_character(&self, key: &CharacterKey) -> Result<u64, ArchiveError> {
        let mut tables = self.tables.write().await;
        tables.ensure_open()?;
        let removed = tables
            .find_id(&key.name, &key.realm, key.region.as_str())
            .and_then(|id| tables.characters.remove(&id));
        Ok(u64::from(removed.is_some()))
    }

    async fn rename_realm(&self, id: i64, realm: &str) -> Result<(), ArchiveError> {
        let mut tables = self.tables.write().await;
        tables.ensure_open()?;
        let (name, region) = match tables.characters.get(&id) {
            Some(row) => (row.name.clone(), row.region.clone()),
            None => return Err(ArchiveError::NotFound(format!("character row {id}"))),
        };
        if let Some(other) = tables.find_id(&name, realm, &region)
            && other != id
        {
            return Err(ArchiveError::Conflict(format!(
                "{region}/{realm}/{name} already exists as row {other}"
            )));
        }
        if let Some(row) = tables.characters.get_mut(&id) {
            row.realm = realm.to_string();
        }
        Ok(())
    }
}

#[async_trait]
impl LogStore for MemoryStore {
    async fn insert_log(&self, entry: &NewLogEntry) -> Result<(), ArchiveError> {
        self.insert_log_at(entry, Utc::now()).await.map(|_| ())
    }

    async fn query_logs(&self, range: &LogRange, limit: i64) -> Result<Vec<LogRow>, ArchiveError> {
        let tables = self.tables.read().await;
        tables.ensure_open()?;
        let mut rows: Vec<LogRow> = tables
            .logs
            .iter()
            .filter(|row| range.contains(row.created_at))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(rows)
    }
}

#[async_trait]
impl Storage for MemoryStore {
    async fn ensure_schema(&self) -> Result<(), ArchiveError> {
        self.tables
            .read()
            .await
            .ensure_open()
            .map_err(|e| ArchiveError::Schema(e.to_string()))
    }

    async fn ping(&self) -> Result<(), ArchiveError> {
        self.tables.read().await.ensure_open()
    }

    async fn close(&self) {
        self.tables.write().await.closed = true;
    }
}
