//! PostgreSQL implementation of the persistence layer.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;

use super::models::{CharacterRow, LogRow};
use super::{CharacterStore, LogStore, Storage, schema};
use crate::config::AppConfig;
use crate::domain::{CharacterKey, CharacterRecord, LogRange, NewLogEntry};
use crate::error::ArchiveError;

// Tables created by the first deployment use `serial`, `real`, `json` and a
// nullable `created_at`; the casts let rows from either layout decode.
const CHARACTER_COLUMNS: &str = "id::int8 AS id, name, realm, region, \
     score::float8 AS score, last_crawled_at, raw_data, \
     COALESCE(created_at, to_timestamp(0)) AS created_at";

const LOG_COLUMNS: &str = "id::int8 AS id, log_type, message, stack, details, \
     COALESCE(created_at, to_timestamp(0)) AS created_at";

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Wraps an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Builds a lazily-connecting pool from `config`.
    ///
    /// No connection is opened here, so an unreachable database does not
    /// prevent startup; the first query reports the failure instead.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Storage`] if the connection string is invalid.
    pub async fn connect(config: &AppConfig) -> Result<Self, ArchiveError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect_lazy(&config.database_url)
            .map_err(|e| ArchiveError::Storage(format!("invalid database url: {e}")))?;
        tracing::info!(
            max_connections = config.database_max_connections,
            "postgres pool configured"
        );
        Ok(Self::new(pool))
    }

    /// Returns the underlying pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CharacterStore for PostgresStore {
    async fn list_characters(&self) -> Result<Vec<CharacterRow>, ArchiveError> {
        let query =
            format!("SELECT {CHARACTER_COLUMNS} FROM characters ORDER BY created_at DESC, id DESC");
        let rows = sqlx::query_as::<_, CharacterRow>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn find_character(
        &self,
        key: &CharacterKey,
    ) -> Result<Option<CharacterRow>, ArchiveError> {
        let query = format!(
            "SELECT {CHARACTER_COLUMNS} FROM characters \
             WHERE region = $1 AND realm = $2 AND name = $3"
        );
        let row = sqlx::query_as::<_, CharacterRow>(&query)
            .bind(key.region.as_str())
            .bind(&key.realm)
            .bind(&key.name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn upsert_character(
        &self,
        record: &CharacterRecord,
    ) -> Result<CharacterRow, ArchiveError> {
        let query = format!(
            "INSERT INTO characters (name, realm, region, score, last_crawled_at, raw_data) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (name, realm, region) DO UPDATE \
             SET score = EXCLUDED.score, \
                 last_crawled_at = EXCLUDED.last_crawled_at, \
                 raw_data = EXCLUDED.raw_data \
             RETURNING {CHARACTER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CharacterRow>(&query)
            .bind(&record.key.name)
            .bind(&record.key.realm)
            .bind(record.key.region.as_str())
            .bind(record.score)
            .bind(record.last_crawled_at)
            .bind(Json(&record.raw_data))
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn delete_character(&self, key: &CharacterKey) -> Result<u64, ArchiveError> {
        let result =
            sqlx::query("DELETE FROM characters WHERE region = $1 AND realm = $2 AND name = $3")
                .bind(key.region.as_str())
                .bind(&key.realm)
                .bind(&key.name)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }

    async fn rename_realm(&self, id: i64, realm: &str) -> Result<(), ArchiveError> {
        let result = sqlx::query("UPDATE characters SET realm = $1 WHERE id = $2")
            .bind(realm)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ArchiveError::NotFound(format!("character row {id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl LogStore for PostgresStore {
    async fn insert_log(&self, entry: &NewLogEntry) -> Result<(), ArchiveError> {
        sqlx::query("INSERT INTO app_log (log_type, message, stack, details) VALUES ($1, $2, $3, $4)")
            .bind(entry.log_type.as_str())
            .bind(&entry.message)
            .bind(entry.stack.as_deref())
            .bind(entry.details.as_ref().map(Json))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn query_logs(&self, range: &LogRange, limit: i64) -> Result<Vec<LogRow>, ArchiveError> {
        let query = format!(
            "SELECT {LOG_COLUMNS} FROM app_log \
             WHERE ($1::timestamptz IS NULL OR created_at >= $1) \
               AND ($2::timestamptz IS NULL OR created_at <= $2) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $3"
        );
        let rows = sqlx::query_as::<_, LogRow>(&query)
            .bind(range.from)
            .bind(range.to)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

#[async_trait]
impl Storage for PostgresStore {
    async fn ensure_schema(&self) -> Result<(), ArchiveError> {
        schema::ensure_schema(&self.pool).await
    }

    async fn ping(&self) -> Result<(), ArchiveError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::info!("postgres pool closed");
    }
}
