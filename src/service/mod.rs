//! Service layer: business logic orchestration.
//!
//! [`CharacterArchive`] and [`AppLogger`] back the HTTP handlers;
//! [`RealmSlugMigration`] is the offline realm repair job.

pub mod archive_service;
pub mod log_service;
pub mod migration;

pub use archive_service::CharacterArchive;
pub use log_service::AppLogger;
pub use migration::{MigrationReport, RealmSlugMigration};
