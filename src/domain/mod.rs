//! Domain layer: character identity, stored JSON normalization, log
//! entries, and the realm reference catalog.
//!
//! Nothing here touches storage or HTTP; the types are shared by the
//! persistence, service, and API layers.

pub mod character;
pub mod log_entry;
pub mod raw_json;
pub mod realm;
pub mod region;

pub use character::{CharacterKey, CharacterRecord, CharacterSnapshot};
pub use log_entry::{LogEntry, LogRange, LogType, NewLogEntry};
pub use raw_json::RawJson;
pub use realm::{RealmCatalog, RealmRef};
pub use region::Region;
