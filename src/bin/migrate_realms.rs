//! One-shot realm slug migration.
//!
//! Rewrites stored realm display names (e.g. `"Twisting Nether"`) to the
//! canonical slugs from the realm reference file. Stop the API server
//! before running it.
//!
//! ```text
//! migrate-realms [--dry-run] [REALMS_FILE]
//! ```
//!
//! The realm file path falls back to `REALMS_FILE`, and `--dry-run` to
//! `MIGRATION_DRY_RUN`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use mplus_archive::config::AppConfig;
use mplus_archive::domain::RealmCatalog;
use mplus_archive::persistence::{self, CharacterStore};
use mplus_archive::service::RealmSlugMigration;
use mplus_archive::service::migration::RecordOutcome;
use mplus_archive::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;
    telemetry::init(config.log_format);

    let mut dry_run = std::env::var("MIGRATION_DRY_RUN")
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true"))
        .unwrap_or(false);
    let mut realms_file = config.realms_file.clone();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--dry-run" => dry_run = true,
            other if other.starts_with("--") => anyhow::bail!("unknown flag: {other}"),
            path => realms_file = PathBuf::from(path),
        }
    }

    let catalog = RealmCatalog::load(&realms_file)
        .await
        .with_context(|| format!("loading realm catalog from {}", realms_file.display()))?;
    tracing::info!(realms = catalog.len(), file = %realms_file.display(), "realm catalog loaded");

    let storage = persistence::connect(&config).await?;
    storage
        .ensure_schema()
        .await
        .context("characters table unavailable")?;

    let migration =
        RealmSlugMigration::new(Arc::clone(&storage) as Arc<dyn CharacterStore>, catalog)
            .dry_run(dry_run);
    let result = migration.run().await;
    storage.close().await;
    let report = result.context("realm slug migration failed")?;

    if dry_run {
        for record in &report.records {
            if let RecordOutcome::Updated { from, to } = &record.outcome {
                tracing::info!(id = record.id, name = %record.name, %from, %to, "would update");
            }
        }
    }

    tracing::info!(
        dry_run,
        updated = report.updated(),
        unchanged = report.unchanged(),
        unmatched = report.unmatched(),
        conflicts = report.conflicts(),
        failed = report.failed(),
        "migration finished"
    );

    if report.conflicts() + report.failed() > 0 {
        anyhow::bail!(
            "{} record(s) could not be migrated",
            report.conflicts() + report.failed()
        );
    }
    Ok(())
}
