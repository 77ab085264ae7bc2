//! Realm slug migration: rewrites stored realm display names to slugs.
//!
//! Early archive entries stored the realm as shown upstream (for example
//! `"Twisting Nether"`) instead of the slug (`"twisting-nether"`). The job
//! walks every row, resolves the stored value against the
//! [`RealmCatalog`], and renames the realm in place when the slug differs.
//!
//! Must run with exclusive access to the `characters` table.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use crate::domain::{CharacterKey, RealmCatalog, Region};
use crate::error::ArchiveError;
use crate::persistence::CharacterStore;
use crate::persistence::models::CharacterRow;

/// What happened to one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecordOutcome {
    /// Realm renamed to the canonical slug (or would be, in a dry run).
    Updated {
        /// Previous stored realm.
        from: String,
        /// Canonical slug.
        to: String,
    },
    /// Stored realm is already the slug.
    Unchanged,
    /// No catalog entry matched the stored realm.
    Unmatched,
    /// Another row already holds the target identity.
    Conflict {
        /// Slug that would have collided.
        to: String,
    },
    /// The rename failed for another reason.
    Failed {
        /// Error description.
        reason: String,
    },
}

/// Per-row migration report line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordReport {
    /// Row ID.
    pub id: i64,
    /// Character name.
    pub name: String,
    /// Stored region.
    pub region: String,
    /// Result for this row.
    #[serde(flatten)]
    pub outcome: RecordOutcome,
}

/// Aggregate result of one migration run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// Whether writes were skipped.
    pub dry_run: bool,
    /// Every row that was examined, in listing order.
    pub records: Vec<RecordReport>,
}

impl MigrationReport {
    fn count(&self, pred: impl Fn(&RecordOutcome) -> bool) -> usize {
        self.records.iter().filter(|r| pred(&r.outcome)).count()
    }

    /// Rows renamed.
    #[must_use]
    pub fn updated(&self) -> usize {
        self.count(|o| matches!(o, RecordOutcome::Updated { .. }))
    }

    /// Rows already canonical.
    #[must_use]
    pub fn unchanged(&self) -> usize {
        self.count(|o| matches!(o, RecordOutcome::Unchanged))
    }

    /// Rows with no catalog match.
    #[must_use]
    pub fn unmatched(&self) -> usize {
        self.count(|o| matches!(o, RecordOutcome::Unmatched))
    }

    /// Rows skipped because of an identity collision.
    #[must_use]
    pub fn conflicts(&self) -> usize {
        self.count(|o| matches!(o, RecordOutcome::Conflict { .. }))
    }

    /// Rows whose rename failed for another reason.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, RecordOutcome::Failed { .. }))
    }
}

/// Batch job reconciling stored realms against a [`RealmCatalog`].
#[derive(Debug, Clone)]
pub struct RealmSlugMigration {
    store: Arc<dyn CharacterStore>,
    catalog: RealmCatalog,
    dry_run: bool,
}

impl RealmSlugMigration {
    /// Creates a migration over `store` using `catalog`.
    #[must_use]
    pub fn new(store: Arc<dyn CharacterStore>, catalog: RealmCatalog) -> Self {
        Self {
            store,
            catalog,
            dry_run: false,
        }
    }

    /// Plans renames without writing them.
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Runs one reconciliation pass. Per-row failures are recorded and the
    /// pass continues.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Storage`] only if the initial listing fails.
    pub async fn run(&self) -> Result<MigrationReport, ArchiveError> {
        let rows = self.store.list_characters().await?;
        tracing::info!(rows = rows.len(), dry_run = self.dry_run, "starting realm slug migration");

        let mut report = MigrationReport {
            dry_run: self.dry_run,
            records: Vec::with_capacity(rows.len()),
        };
        // Identities a dry run has already handed out to earlier rows.
        let mut planned = HashSet::new();
        for row in rows {
            let outcome = self.migrate_row(&row, &mut planned).await;
            report.records.push(RecordReport {
                id: row.id,
                name: row.name,
                region: row.region,
                outcome,
            });
        }

        tracing::info!(
            updated = report.updated(),
            unchanged = report.unchanged(),
            unmatched = report.unmatched(),
            conflicts = report.conflicts(),
            failed = report.failed(),
            "realm slug migration finished"
        );
        Ok(report)
    }

    async fn migrate_row(
        &self,
        row: &CharacterRow,
        planned: &mut HashSet<CharacterKey>,
    ) -> RecordOutcome {
        // Rows with a region outside the catalog's key space can never match.
        let Ok(region) = row.region.parse::<Region>() else {
            return RecordOutcome::Unmatched;
        };
        let Some(realm) = self.catalog.resolve(region, &row.realm) else {
            return RecordOutcome::Unmatched;
        };
        if realm.slug == row.realm {
            return RecordOutcome::Unchanged;
        }

        let updated = RecordOutcome::Updated {
            from: row.realm.clone(),
            to: realm.slug.clone(),
        };
        if self.dry_run {
            return self.plan_rename(row, &realm.slug, planned, updated).await;
        }

        match self.store.rename_realm(row.id, &realm.slug).await {
            Ok(()) => {
                tracing::info!(id = row.id, name = %row.name, from = %row.realm, to = %realm.slug, "realm updated");
                updated
            }
            Err(ArchiveError::Conflict(reason)) => {
                tracing::warn!(id = row.id, name = %row.name, to = %realm.slug, %reason, "realm rename conflicts with existing row");
                RecordOutcome::Conflict {
                    to: realm.slug.clone(),
                }
            }
            Err(e) => {
                tracing::error!(id = row.id, name = %row.name, error = %e, "realm rename failed");
                RecordOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Predicts the outcome of renaming `row` to `slug` without writing,
    /// so a dry run reports the same collisions a real run would hit.
    async fn plan_rename(
        &self,
        row: &CharacterRow,
        slug: &str,
        planned: &mut HashSet<CharacterKey>,
        updated: RecordOutcome,
    ) -> RecordOutcome {
        let target = CharacterKey::new(row.region.as_str(), slug, row.name.as_str());
        let conflict = RecordOutcome::Conflict {
            to: slug.to_string(),
        };
        if planned.contains(&target) {
            return conflict;
        }
        match self.store.find_character(&target).await {
            Ok(Some(other)) if other.id != row.id => conflict,
            Ok(_) => {
                planned.insert(target);
                updated
            }
            Err(e) => RecordOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::CharacterKey;
    use crate::persistence::memory::MemoryStore;

    const CATALOG: &str = r#"{"eu": [{"name": "Twisting Nether", "slug": "twisting-nether"}]}"#;

    fn catalog() -> RealmCatalog {
        let Ok(catalog) = RealmCatalog::from_json(CATALOG) else {
            panic!("fixture catalog must parse");
        };
        catalog
    }

    fn migration(store: &Arc<MemoryStore>) -> RealmSlugMigration {
        RealmSlugMigration::new(Arc::clone(store) as Arc<dyn CharacterStore>, catalog())
    }

    async fn seed(store: &MemoryStore, name: &str, realm: &str, region: &str) -> i64 {
        let Ok(id) = store
            .insert_raw_character(name, realm, region, None, Utc::now())
            .await
        else {
            panic!("seed failed");
        };
        id
    }

    #[tokio::test]
    async fn renames_display_name_and_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, "Thrall", "Twisting Nether", "eu").await;
        let migration = migration(&store);

        let Ok(first) = migration.run().await else {
            panic!("first run failed");
        };
        assert_eq!(first.updated(), 1);
        let key = CharacterKey::new(Region::Eu, "twisting-nether", "Thrall");
        assert!(matches!(store.find_character(&key).await, Ok(Some(_))));

        let Ok(second) = migration.run().await else {
            panic!("second run failed");
        };
        assert_eq!(second.updated(), 0);
        assert_eq!(second.unchanged(), 1);
    }

    #[tokio::test]
    async fn collision_is_skipped_and_reported() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, "Thrall", "twisting-nether", "eu").await;
        seed(&store, "Thrall", "Twisting Nether", "eu").await;
        seed(&store, "Jaina", "Twisting Nether", "eu").await;

        let Ok(report) = migration(&store).run().await else {
            panic!("run failed");
        };
        assert_eq!(report.conflicts(), 1);
        assert_eq!(report.updated(), 1);
        assert_eq!(report.unchanged(), 1);
        assert_eq!(store.character_count().await, 3);
    }

    #[tokio::test]
    async fn unknown_realms_and_regions_are_unmatched() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, "A", "Silvermoon", "eu").await;
        seed(&store, "B", "Twisting Nether", "us").await;
        seed(&store, "C", "Twisting Nether", "xx").await;

        let Ok(report) = migration(&store).run().await else {
            panic!("run failed");
        };
        assert_eq!(report.unmatched(), 3);
        assert_eq!(report.updated(), 0);
    }

    #[tokio::test]
    async fn dry_run_reports_the_conflicts_a_real_run_hits() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, "Thrall", "twisting-nether", "eu").await;
        seed(&store, "Thrall", "Twisting Nether", "eu").await;
        seed(&store, "Jaina", "Twisting Nether", "eu").await;

        let Ok(plan) = migration(&store).dry_run(true).run().await else {
            panic!("dry run failed");
        };
        let Ok(applied) = migration(&store).run().await else {
            panic!("run failed");
        };
        assert_eq!(plan.conflicts(), 1);
        assert_eq!(plan.updated(), 1);
        let outcomes = |r: &MigrationReport| -> Vec<RecordOutcome> {
            r.records.iter().map(|rec| rec.outcome.clone()).collect()
        };
        assert_eq!(outcomes(&plan), outcomes(&applied));
    }

    #[tokio::test]
    async fn dry_run_flags_two_legacy_rows_sharing_a_slug() {
        let store = Arc::new(MemoryStore::new());
        let Ok(catalog) = RealmCatalog::from_json(
            r#"{"eu": [{"name": {"en_US": "Twisting Nether", "en_GB": "Twisting-Nether"}, "slug": "twisting-nether"}]}"#,
        ) else {
            panic!("fixture catalog must parse");
        };
        seed(&store, "Thrall", "Twisting Nether", "eu").await;
        seed(&store, "Thrall", "Twisting-Nether", "eu").await;

        let store_dyn = Arc::clone(&store) as Arc<dyn CharacterStore>;
        let plan_run = RealmSlugMigration::new(Arc::clone(&store_dyn), catalog.clone()).dry_run(true);
        let Ok(plan) = plan_run.run().await else {
            panic!("dry run failed");
        };
        assert_eq!(plan.updated(), 1);
        assert_eq!(plan.conflicts(), 1);

        let Ok(applied) = RealmSlugMigration::new(store_dyn, catalog).run().await else {
            panic!("run failed");
        };
        assert_eq!(applied.updated(), 1);
        assert_eq!(applied.conflicts(), 1);
    }

    #[tokio::test]
    async fn dry_run_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, "Thrall", "Twisting Nether", "eu").await;

        let migration = migration(&store).dry_run(true);
        let Ok(report) = migration.run().await else {
            panic!("run failed");
        };
        assert_eq!(report.updated(), 1);
        let key = CharacterKey::new(Region::Eu, "Twisting Nether", "Thrall");
        assert!(matches!(store.find_character(&key).await, Ok(Some(_))));
    }
}
