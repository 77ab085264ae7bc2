//! Canonical realm reference data, keyed by region.
//!
//! The reference file maps each region to a list of realms:
//!
//! ```json
//! { "eu": [ { "name": "Twisting Nether", "slug": "twisting-nether" },
//!           { "name": { "en_US": "Aggra (Português)", "en_GB": "Aggra (Português)" },
//!             "slug": "aggra-portugues" } ] }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;

use super::Region;

/// Locales whose display names are matched during realm resolution.
pub const SUPPORTED_LOCALES: [&str; 2] = ["en_US", "en_GB"];

/// Display name of a realm: plain, or one string per locale.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RealmName {
    /// Single display name.
    Plain(String),
    /// Display name per locale code.
    Localized(BTreeMap<String, String>),
}

impl RealmName {
    /// Returns `true` if `candidate` equals the plain name or the name in
    /// any [`SUPPORTED_LOCALES`] entry.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            Self::Plain(name) => name == candidate,
            Self::Localized(names) => SUPPORTED_LOCALES
                .iter()
                .filter_map(|locale| names.get(*locale))
                .any(|name| name == candidate),
        }
    }
}

/// One realm of the reference list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RealmRef {
    /// Display name.
    pub name: RealmName,
    /// Canonical slug used as the stored realm identifier.
    pub slug: String,
}

/// Errors raised while loading the realm reference file.
#[derive(Debug, thiserror::Error)]
pub enum RealmCatalogError {
    /// The file could not be read.
    #[error("failed to read realm file {path}: {source}")]
    Io {
        /// Path that was read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The file is not a valid region → realm list document.
    #[error("invalid realm file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Region → ordered realm list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RealmCatalog {
    realms: HashMap<Region, Vec<RealmRef>>,
}

impl RealmCatalog {
    /// Parses a catalog from JSON text. Regions outside [`Region`] are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns [`RealmCatalogError::Parse`] on malformed JSON.
    pub fn from_json(text: &str) -> Result<Self, RealmCatalogError> {
        let raw: HashMap<String, Vec<RealmRef>> = serde_json::from_str(text)?;
        let mut realms = HashMap::with_capacity(raw.len());
        for (region, list) in raw {
            match region.parse::<Region>() {
                Ok(region) => {
                    realms.insert(region, list);
                }
                Err(_) => tracing::warn!(region, "skipping unknown region in realm catalog"),
            }
        }
        Ok(Self { realms })
    }

    /// Reads and parses a catalog file.
    ///
    /// # Errors
    ///
    /// Returns [`RealmCatalogError`] when the file is unreadable or invalid.
    pub async fn load(path: &Path) -> Result<Self, RealmCatalogError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| RealmCatalogError::Io {
                path: path.display().to_string(),
                source,
            })?;
        Self::from_json(&text)
    }

    /// Realms for `region`, empty if the region is not in the catalog.
    #[must_use]
    pub fn realms(&self, region: Region) -> &[RealmRef] {
        self.realms.get(&region).map_or(&[], Vec::as_slice)
    }

    /// Finds the first realm in `region` whose slug or display name equals
    /// `stored`.
    #[must_use]
    pub fn resolve(&self, region: Region, stored: &str) -> Option<&RealmRef> {
        self.realms(region)
            .iter()
            .find(|r| r.slug == stored || r.name.matches(stored))
    }

    /// Total number of realms across all regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.realms.values().map(Vec::len).sum()
    }

    /// Returns `true` when the catalog holds no realms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
