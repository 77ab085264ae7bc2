//! Game region identifier.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ArchiveError;

/// A ranking region. Stored lowercase (`"eu"`, `"us"`, `"kr"`, `"tw"`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    /// Europe. Used when a profile carries no region.
    #[default]
    Eu,
    /// Americas.
    Us,
    /// Korea.
    Kr,
    /// Taiwan.
    Tw,
}

impl Region {
    /// All supported regions.
    pub const ALL: [Self; 4] = [Self::Eu, Self::Us, Self::Kr, Self::Tw];

    /// Returns the stored form of the region.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Eu => "eu",
            Self::Us => "us",
            Self::Kr => "kr",
            Self::Tw => "tw",
        }
    }
}

impl FromStr for Region {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eu" => Ok(Self::Eu),
            "us" => Ok(Self::Us),
            "kr" => Ok(Self::Kr),
            "tw" => Ok(Self::Tw),
            other => Err(ArchiveError::Validation(format!("unknown region: {other}"))),
        }
    }
}

impl From<Region> for String {
    fn from(region: Region) -> Self {
        region.as_str().to_string()
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert!(matches!("EU".parse::<Region>(), Ok(Region::Eu)));
        assert!(matches!(" us ".parse::<Region>(), Ok(Region::Us)));
    }

    #[test]
    fn unknown_region_is_validation_error() {
        assert!(matches!(
            "cn".parse::<Region>(),
            Err(ArchiveError::Validation(_))
        ));
    }

    #[test]
    fn display_matches_stored_form() {
        for region in Region::ALL {
            assert_eq!(region.to_string(), region.as_str());
        }
        assert_eq!(Region::default(), Region::Eu);
    }
}
