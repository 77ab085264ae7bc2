//! Table definitions for the `characters` and `app_log` tables.
//!
//! Every statement uses `IF NOT EXISTS`, so [`ensure_schema`] can run on
//! every process start.

use sqlx::PgPool;

use crate::error::ArchiveError;

/// DDL for the character archive.
pub const CREATE_CHARACTERS: &str = "\
CREATE TABLE IF NOT EXISTS characters (
    id              BIGSERIAL PRIMARY KEY,
    name            TEXT NOT NULL,
    realm           TEXT NOT NULL,
    region          TEXT NOT NULL,
    score           DOUBLE PRECISION,
    last_crawled_at TIMESTAMPTZ,
    raw_data        JSONB,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT characters_identity_key UNIQUE (name, realm, region)
)";

/// DDL for the application log.
pub const CREATE_APP_LOG: &str = "\
CREATE TABLE IF NOT EXISTS app_log (
    id         BIGSERIAL PRIMARY KEY,
    log_type   TEXT NOT NULL,
    message    TEXT NOT NULL,
    stack      TEXT,
    details    JSONB,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
)";

/// Index backing newest-first listing and range queries.
pub const CREATE_APP_LOG_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS app_log_created_at_idx ON app_log (created_at DESC)";

/// Creates both tables if they are absent.
///
/// Two processes starting at once can race inside `CREATE TABLE IF NOT
/// EXISTS` and one of them sees a unique violation on the catalog; that case
/// means the table now exists and is not an error.
///
/// # Errors
///
/// Returns [`ArchiveError::Schema`] if the store is unreachable or a
/// statement fails for another reason.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), ArchiveError> {
    for (table, ddl) in [
        ("characters", CREATE_CHARACTERS),
        ("app_log", CREATE_APP_LOG),
        ("app_log", CREATE_APP_LOG_INDEX),
    ] {
        match sqlx::query(ddl).execute(pool).await {
            Ok(_) => {}
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                tracing::debug!(table, "schema object created concurrently");
            }
            Err(e) => return Err(ArchiveError::Schema(format!("{table}: {e}"))),
        }
    }
    tracing::info!("database schema ready");
    Ok(())
}
