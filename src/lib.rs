//! # mplus-archive
//!
//! REST service that archives World of Warcraft Mythic+ character
//! snapshots and keeps an application log.
//!
//! Clients fetch profiles from the upstream ranking API themselves and post
//! them here; the service stores one snapshot per (name, realm, region),
//! repairs legacy double-encoded payloads on read, and ships a one-shot job
//! that rewrites realm display names to slugs.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── CharacterArchive / AppLogger (service/)
//!     │       └── RealmSlugMigration (offline, bin/migrate_realms)
//!     │
//!     └── Storage trait (persistence/)
//!             ├── PostgresStore
//!             └── MemoryStore
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod telemetry;
