//! Character identity, archive records, and snapshots.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use utoipa::ToSchema;

use super::Region;
use crate::error::ArchiveError;

/// Identity triple of an archived character.
///
/// Matching is exact and case-sensitive on all three parts, as stored.
/// Older rows may carry a region spelled differently from [`Region::as_str`]
/// (for example `"EU"`), so the region is kept as a plain string here.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CharacterKey {
    /// Character name as reported upstream.
    pub name: String,
    /// Realm slug (or a legacy display name awaiting migration).
    pub realm: String,
    /// Region code as stored.
    pub region: String,
}

impl CharacterKey {
    /// Builds a key from its parts.
    #[must_use]
    pub fn new(
        region: impl Into<String>,
        realm: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            realm: realm.into(),
            region: region.into(),
        }
    }
}

impl fmt::Display for CharacterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.region, self.realm, self.name)
    }
}

/// Write model for an upsert, derived from an upstream profile payload.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterRecord {
    /// Identity of the row to insert or update.
    pub key: CharacterKey,
    /// Current-season score, `0.0` when the profile has none.
    pub score: f64,
    /// When the upstream service last crawled the character.
    pub last_crawled_at: Option<DateTime<Utc>>,
    /// Full profile payload.
    pub raw_data: Map<String, Value>,
}

impl CharacterRecord {
    /// Validates a profile payload and derives the record to archive.
    ///
    /// `name` and `realm` must be non-empty strings. A missing region
    /// defaults to [`Region::Eu`].
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Validation`] when the payload is not an
    /// object, lacks `name` or `realm`, or names an unknown region.
    pub fn from_profile(profile: Value) -> Result<Self, ArchiveError> {
        let Value::Object(raw_data) = profile else {
            return Err(ArchiveError::Validation(
                "Invalid character data".to_string(),
            ));
        };

        let name = required_str(&raw_data, "name")?;
        let realm = required_str(&raw_data, "realm")?;
        let region = match raw_data.get("region").and_then(Value::as_str) {
            Some(r) if !r.trim().is_empty() => r.parse()?,
            _ => Region::default(),
        };

        let last_crawled_at = raw_data
            .get("last_crawled_at")
            .and_then(Value::as_str)
            .and_then(|s| match DateTime::parse_from_rfc3339(s) {
                Ok(ts) => Some(ts.with_timezone(&Utc)),
                Err(e) => {
                    tracing::warn!(value = s, error = %e, "ignoring unparseable last_crawled_at");
                    None
                }
            });

        Ok(Self {
            key: CharacterKey::new(region, realm, name),
            score: current_season_score(&raw_data),
            last_crawled_at,
            raw_data,
        })
    }
}

/// Reads `mythic_plus_scores_by_season[0].scores.all`, or `0.0`.
#[must_use]
pub fn current_season_score(profile: &Map<String, Value>) -> f64 {
    profile
        .get("mythic_plus_scores_by_season")
        .and_then(Value::as_array)
        .and_then(|seasons| seasons.first())
        .and_then(|season| season.get("scores"))
        .and_then(|scores| scores.get("all"))
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
}

fn required_str(profile: &Map<String, Value>, field: &str) -> Result<String, ArchiveError> {
    profile
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| ArchiveError::Validation("Invalid character data".to_string()))
}

/// An archived character as returned to clients.
///
/// `raw_data` is always a decoded object, or `null` when the stored payload
/// could not be repaired.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CharacterSnapshot {
    /// Surrogate row ID.
    pub id: i64,
    /// Character name.
    pub name: String,
    /// Realm slug.
    pub realm: String,
    /// Region as stored.
    pub region: String,
    /// Current-season score at archive time.
    pub score: Option<f64>,
    /// Upstream crawl timestamp.
    pub last_crawled_at: Option<DateTime<Utc>>,
    /// Decoded profile payload.
    #[schema(value_type = Option<Object>)]
    pub raw_data: Option<Map<String, Value>>,
    /// First-archive timestamp.
    pub created_at: DateTime<Utc>,
}
