//! Map hex model: terrain, difficulty and per-hex features.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::constants::{DEFAULT_ZONE_DC, DEFAULT_ZONE_ENCOUNTER_DC};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TerrainType {
    #[default]
    Plains,
    Forest,
    Swamp,
    Mountain,
    Aquatic,
    Arctic,
    Desert,
    /// Terrain tag the rules tables do not know about.
    #[serde(other)]
    Unknown,
}

impl TerrainType {
    pub const ALL: [Self; 7] = [
        Self::Plains,
        Self::Forest,
        Self::Swamp,
        Self::Mountain,
        Self::Aquatic,
        Self::Arctic,
        Self::Desert,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plains => "plains",
            Self::Forest => "forest",
            Self::Swamp => "swamp",
            Self::Mountain => "mountain",
            Self::Aquatic => "aquatic",
            Self::Arctic => "arctic",
            Self::Desert => "desert",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TerrainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag that names no known terrain type or difficulty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnknownTerrain {
    #[error("unknown terrain {0:?}")]
    Type(String),
    #[error("unknown terrain difficulty {0:?}")]
    Difficulty(String),
}

impl FromStr for TerrainType {
    type Err = UnknownTerrain;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|terrain| terrain.as_str() == s)
            .ok_or_else(|| UnknownTerrain::Type(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TerrainDifficulty {
    #[default]
    Open,
    Difficult,
    GreaterDifficult,
}

impl TerrainDifficulty {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Difficult => "difficult",
            Self::GreaterDifficult => "greater-difficult",
        }
    }
}

impl fmt::Display for TerrainDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TerrainDifficulty {
    type Err = UnknownTerrain;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "difficult" => Ok(Self::Difficult),
            "greater-difficult" => Ok(Self::GreaterDifficult),
            other => Err(UnknownTerrain::Difficulty(other.to_string())),
        }
    }
}

/// Which rules variant the exploration run follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Ruleset {
    #[default]
    Standard,
    /// Adds zone DCs, weather checks and campsite preparation.
    Kingmaker,
}

impl Ruleset {
    #[must_use]
    pub const fn is_kingmaker(self) -> bool {
        matches!(self, Self::Kingmaker)
    }
}

/// Caller-supplied description of a hex, used for both the starting hex and
/// travel destinations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HexSetup {
    #[serde(default)]
    pub terrain_type: TerrainType,
    #[serde(default)]
    pub terrain_difficulty: TerrainDifficulty,
    #[serde(default)]
    pub has_road: bool,
    #[serde(default)]
    pub has_river: bool,
    #[serde(default)]
    pub is_reconnoitered: bool,
    #[serde(default)]
    pub is_mapped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_dc: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_encounter_dc: Option<i32>,
}

impl HexSetup {
    #[must_use]
    pub fn new(terrain_type: TerrainType, terrain_difficulty: TerrainDifficulty) -> Self {
        Self {
            terrain_type,
            terrain_difficulty,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_road(mut self, has_road: bool) -> Self {
        self.has_road = has_road;
        self
    }

    #[must_use]
    pub const fn with_river(mut self, has_river: bool) -> Self {
        self.has_river = has_river;
        self
    }

    #[must_use]
    pub const fn with_zone(mut self, zone_dc: i32, zone_encounter_dc: i32) -> Self {
        self.zone_dc = Some(zone_dc);
        self.zone_encounter_dc = Some(zone_encounter_dc);
        self
    }
}

/// The party's current location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Hex {
    pub terrain_type: TerrainType,
    pub terrain_difficulty: TerrainDifficulty,
    pub has_road: bool,
    pub has_river: bool,
    pub is_reconnoitered: bool,
    pub is_mapped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_dc: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_encounter_dc: Option<i32>,
}

impl Hex {
    /// Build the starting hex, keeping the caller's exploration flags.
    #[must_use]
    pub fn starting(setup: &HexSetup, ruleset: Ruleset) -> Self {
        let mut hex = Self::entered(setup, ruleset);
        hex.is_reconnoitered = setup.is_reconnoitered;
        hex.is_mapped = setup.is_mapped;
        hex
    }

    /// Build a freshly entered hex; exploration flags always start cleared.
    #[must_use]
    pub fn entered(setup: &HexSetup, ruleset: Ruleset) -> Self {
        let (zone_dc, zone_encounter_dc) = if ruleset.is_kingmaker() {
            (
                Some(setup.zone_dc.unwrap_or(DEFAULT_ZONE_DC)),
                Some(setup.zone_encounter_dc.unwrap_or(DEFAULT_ZONE_ENCOUNTER_DC)),
            )
        } else {
            (None, None)
        };
        Self {
            terrain_type: setup.terrain_type,
            terrain_difficulty: setup.terrain_difficulty,
            has_road: setup.has_road,
            has_river: setup.has_river,
            is_reconnoitered: false,
            is_mapped: false,
            zone_dc,
            zone_encounter_dc,
        }
    }

    /// Human-readable feature labels, `Standard` when the hex has none.
    #[must_use]
    pub fn feature_labels(&self) -> Vec<String> {
        let mut features = Vec::new();
        if self.has_road {
            features.push("Road".to_string());
        }
        if self.has_river {
            features.push("River".to_string());
        }
        if let Some(dc) = self.zone_dc {
            features.push(format!("Zone DC {dc}"));
        }
        if let Some(dc) = self.zone_encounter_dc {
            features.push(format!("Enc DC {dc}"));
        }
        if self.is_reconnoitered {
            features.push("Reconnoitered".to_string());
        }
        if self.is_mapped {
            features.push("Mapped".to_string());
        }
        if features.is_empty() {
            features.push("Standard".to_string());
        }
        features
    }
}
