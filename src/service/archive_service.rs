//! Character archive: list, lookup, upsert, and delete of snapshots.

use std::sync::Arc;

use serde_json::{Value, json};

use super::AppLogger;
use crate::domain::raw_json;
use crate::domain::{CharacterKey, CharacterRecord, CharacterSnapshot};
use crate::error::ArchiveError;
use crate::persistence::CharacterStore;
use crate::persistence::models::CharacterRow;

/// Orchestrates character snapshot storage.
///
/// Every storage failure is written to the [`AppLogger`] before being
/// returned, and stored payloads are normalized exactly once on the way
/// out.
#[derive(Debug, Clone)]
pub struct CharacterArchive {
    store: Arc<dyn CharacterStore>,
    logger: AppLogger,
}

impl CharacterArchive {
    /// Creates an archive over `store`, reporting anomalies to `logger`.
    #[must_use]
    pub fn new(store: Arc<dyn CharacterStore>, logger: AppLogger) -> Self {
        Self { store, logger }
    }

    /// All snapshots, newest first.
    ///
    /// A row whose payload cannot be normalized is returned with
    /// `raw_data = null` and reported to the log instead of failing the
    /// listing.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Storage`] if the query fails.
    pub async fn list_all(&self) -> Result<Vec<CharacterSnapshot>, ArchiveError> {
        let rows = match self.store.list_characters().await {
            Ok(rows) => rows,
            Err(e) => return Err(self.report("Fetch Error (GET /characters)", e, None).await),
        };

        let mut snapshots = Vec::with_capacity(rows.len());
        for row in rows {
            snapshots.push(self.to_snapshot(row).await);
        }
        Ok(snapshots)
    }

    /// Looks up one snapshot by exact identity.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::NotFound`] if no row matches, or
    /// [`ArchiveError::Storage`] if the query fails.
    pub async fn get(&self, key: &CharacterKey) -> Result<CharacterSnapshot, ArchiveError> {
        let row = match self.store.find_character(key).await {
            Ok(row) => row,
            Err(e) => {
                return Err(self
                    .report("Lookup Error (GET /characters)", e, Some(key_details(key)))
                    .await);
            }
        };
        let row = row.ok_or_else(|| {
            ArchiveError::NotFound("Character not found in local archive".to_string())
        })?;
        Ok(self.to_snapshot(row).await)
    }

    /// Archives a profile payload, inserting or updating by identity.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Validation`] when `name` or `realm` is
    /// missing, or [`ArchiveError::Storage`] if the write fails.
    pub async fn upsert(&self, profile: Value) -> Result<CharacterSnapshot, ArchiveError> {
        let record = CharacterRecord::from_profile(profile)?;
        match self.store.upsert_character(&record).await {
            Ok(row) => {
                tracing::info!(character = %record.key, score = record.score, "character archived");
                Ok(self.to_snapshot(row).await)
            }
            Err(e) => Err(self
                .report(
                    "Archive Error (POST /characters)",
                    e,
                    Some(json!({"name": record.key.name, "realm": record.key.realm})),
                )
                .await),
        }
    }

    /// Deletes a snapshot by exact identity. Returns `true` on removal.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::NotFound`] if no row matched, or
    /// [`ArchiveError::Storage`] if the delete fails.
    pub async fn delete(&self, key: &CharacterKey) -> Result<bool, ArchiveError> {
        match self.store.delete_character(key).await {
            Ok(0) => Err(ArchiveError::NotFound(
                "Character not found in archive".to_string(),
            )),
            Ok(_) => {
                tracing::info!(character = %key, "character deleted");
                Ok(true)
            }
            Err(e) => Err(self
                .report("Delete Error (DELETE /characters)", e, Some(key_details(key)))
                .await),
        }
    }

    async fn to_snapshot(&self, row: CharacterRow) -> CharacterSnapshot {
        let raw_data = match raw_json::normalize(row.raw_data) {
            Ok(map) => map,
            Err(e) => {
                self.logger
                    .error(
                        format!("Failed to parse raw_data for character {}", row.id),
                        &e,
                        Some(json!({"id": row.id, "name": row.name, "realm": row.realm})),
                    )
                    .await;
                None
            }
        };
        CharacterSnapshot {
            id: row.id,
            name: row.name,
            realm: row.realm,
            region: row.region,
            score: row.score,
            last_crawled_at: row.last_crawled_at,
            raw_data,
            created_at: row.created_at,
        }
    }

    /// Logs a storage failure and converts it to the error returned to the
    /// caller. Conflicts are passed through; everything else becomes
    /// [`ArchiveError::Storage`].
    async fn report(
        &self,
        context: &str,
        err: ArchiveError,
        details: Option<Value>,
    ) -> ArchiveError {
        self.logger.error(context, &err, details).await;
        match err {
            ArchiveError::Storage(_) | ArchiveError::Conflict(_) => err,
            other => ArchiveError::Storage(other.to_string()),
        }
    }
}

fn key_details(key: &CharacterKey) -> Value {
    json!({"region": key.region, "realm": key.realm, "name": key.name})
}
