//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::persistence::Storage;
use crate::service::{AppLogger, CharacterArchive};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Character snapshot operations.
    pub archive: CharacterArchive,
    /// Application log reads and writes.
    pub logger: AppLogger,
    /// Backing store, for health probes.
    pub storage: Arc<dyn Storage>,
}

impl AppState {
    /// Wires the services over a single store.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let logger = AppLogger::new(Arc::clone(&storage) as Arc<dyn crate::persistence::LogStore>);
        let archive = CharacterArchive::new(
            Arc::clone(&storage) as Arc<dyn crate::persistence::CharacterStore>,
            logger.clone(),
        );
        Self {
            archive,
            logger,
            storage,
        }
    }
}
