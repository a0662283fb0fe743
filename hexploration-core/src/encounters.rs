//! Start-of-day encounter DC and flat-check resolution.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use crate::constants::{
    CRITICAL_MARGIN, D10_MAX, D10_MIN, DEFAULT_ENCOUNTER_DC, HARMLESS_ENCOUNTER_MAX,
    HAZARD_ENCOUNTER_MAX, MIN_ENCOUNTER_DC, RIVER_DC_MODIFIER, ROAD_DC_MODIFIER,
};
use crate::hex::{Hex, TerrainType};

/// Four-tier result of a check against a DC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegreeOfSuccess {
    CriticalFailure,
    Failure,
    Success,
    CriticalSuccess,
}

impl DegreeOfSuccess {
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success | Self::CriticalSuccess)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CriticalFailure => "Critical Failure",
            Self::Failure => "Failure",
            Self::Success => "Success",
            Self::CriticalSuccess => "Critical Success",
        }
    }
}

impl fmt::Display for DegreeOfSuccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Compare a check total against `dc` with critical bands at ±10.
#[must_use]
pub const fn flat_check(total: i32, dc: i32) -> DegreeOfSuccess {
    if total >= dc + CRITICAL_MARGIN {
        DegreeOfSuccess::CriticalSuccess
    } else if total >= dc {
        DegreeOfSuccess::Success
    } else if total <= dc - CRITICAL_MARGIN {
        DegreeOfSuccess::CriticalFailure
    } else {
        DegreeOfSuccess::Failure
    }
}

/// Base start-of-day encounter DC for a terrain type.
#[must_use]
pub const fn terrain_encounter_dc(terrain: TerrainType) -> i32 {
    match terrain {
        TerrainType::Plains => 12,
        TerrainType::Forest | TerrainType::Swamp => 14,
        TerrainType::Mountain => 16,
        TerrainType::Aquatic | TerrainType::Arctic | TerrainType::Desert => 17,
        TerrainType::Unknown => DEFAULT_ENCOUNTER_DC,
    }
}

/// Hex feature that shifted the encounter DC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DcModifier {
    Road,
    River,
}

impl DcModifier {
    #[must_use]
    pub const fn delta(self) -> i32 {
        match self {
            Self::Road => ROAD_DC_MODIFIER,
            Self::River => RIVER_DC_MODIFIER,
        }
    }
}

/// Breakdown of the encounter DC for the current hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterDc {
    pub base: i32,
    pub modifiers: SmallVec<[DcModifier; 2]>,
    pub dc: i32,
}

impl EncounterDc {
    /// Compute the DC with road/river modifiers (which do not stack), floored at 5.
    #[must_use]
    pub fn for_hex(hex: &Hex) -> Self {
        Self::from_base(terrain_encounter_dc(hex.terrain_type), hex.has_road, hex.has_river)
    }

    #[must_use]
    pub fn from_base(base: i32, has_road: bool, has_river: bool) -> Self {
        let mut modifiers = SmallVec::new();
        if has_road {
            modifiers.push(DcModifier::Road);
        } else if has_river {
            modifiers.push(DcModifier::River);
        }
        let adjusted = modifiers.iter().map(|m: &DcModifier| m.delta()).sum::<i32>() + base;
        Self {
            base,
            modifiers,
            dc: adjusted.max(MIN_ENCOUNTER_DC),
        }
    }
}

/// Outcome of the start-of-day encounter flat check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterCheck {
    pub dc: EncounterDc,
    pub roll: i32,
    pub degree: DegreeOfSuccess,
    pub encounters: u8,
}

impl EncounterCheck {
    #[must_use]
    pub fn resolve(dc: EncounterDc, roll: i32) -> Self {
        let degree = flat_check(roll, dc.dc);
        let encounters = match degree {
            DegreeOfSuccess::CriticalSuccess => 2,
            DegreeOfSuccess::Success => 1,
            DegreeOfSuccess::Failure | DegreeOfSuccess::CriticalFailure => 0,
        };
        Self {
            dc,
            roll,
            degree,
            encounters,
        }
    }
}

/// Broad category of a random encounter, from a d10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncounterKind {
    Harmless,
    Hazard,
    Creature,
}

impl EncounterKind {
    /// Classify a d10; `None` when the value is not a d10 face.
    #[must_use]
    pub const fn from_d10(roll: i32) -> Option<Self> {
        if roll < D10_MIN || roll > D10_MAX {
            None
        } else if roll <= HARMLESS_ENCOUNTER_MAX {
            Some(Self::Harmless)
        } else if roll <= HAZARD_ENCOUNTER_MAX {
            Some(Self::Hazard)
        } else {
            Some(Self::Creature)
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Harmless => "harmless",
            Self::Hazard => "hazard",
            Self::Creature => "creature",
        }
    }
}
