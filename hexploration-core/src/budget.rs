//! Daily activity budget: speed and terrain lookup tables plus spend rules.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use thiserror::Error;

use crate::constants::{
    FASTEST_ACTIVITY_HALVES, FORCED_MARCH_HALVES, INDIVIDUAL_ACTIVITY_HALVES,
    SPEED_ACTIVITY_TABLE,
};
use crate::hex::{Hex, HexSetup, TerrainDifficulty};

/// Activity points counted in half-point steps.
///
/// Parties of 10 feet or slower earn half a point per day, so the budget is
/// stored as a count of halves and exposed as a plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(into = "f32", try_from = "f32")]
pub struct ActivityPoints(u8);

impl ActivityPoints {
    pub const ZERO: Self = Self(0);
    pub const HALF: Self = Self(1);
    pub const ONE: Self = Self(2);

    #[must_use]
    pub const fn from_halves(halves: u8) -> Self {
        Self(halves)
    }

    #[must_use]
    pub const fn whole(points: u8) -> Self {
        Self(points.saturating_mul(2))
    }

    #[must_use]
    pub const fn halves(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn is_half_day(self) -> bool {
        self.0 == 1
    }

    /// Number of whole-point slots needed to display this amount.
    #[must_use]
    pub const fn slot_count(self) -> usize {
        self.0.div_ceil(2) as usize
    }

    #[must_use]
    pub const fn checked_sub(self, rhs: Self) -> Option<Self> {
        match self.0.checked_sub(rhs.0) {
            Some(halves) => Some(Self(halves)),
            None => None,
        }
    }

    #[must_use]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    #[must_use]
    pub fn as_f32(self) -> f32 {
        f32::from(self.0) / 2.0
    }
}

impl From<ActivityPoints> for f32 {
    fn from(value: ActivityPoints) -> Self {
        value.as_f32()
    }
}

/// Raised when a number is not a non-negative multiple of one half.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("activity points must be a non-negative multiple of 0.5 (got {0})")]
pub struct InvalidActivityPoints(pub f32);

impl TryFrom<f32> for ActivityPoints {
    type Error = InvalidActivityPoints;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        let doubled = value * 2.0;
        if !doubled.is_finite() || doubled < 0.0 || doubled > f32::from(u8::MAX) {
            return Err(InvalidActivityPoints(value));
        }
        if doubled.fract() != 0.0 {
            return Err(InvalidActivityPoints(value));
        }
        // Range and integrality were checked above.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let halves = doubled as u8;
        Ok(Self(halves))
    }
}

impl fmt::Display for ActivityPoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.0 / 2, self.0 % 2) {
            (0, 1) => f.write_str("1/2"),
            (whole, 0) => write!(f, "{whole}"),
            (whole, _) => write!(f, "{whole}.5"),
        }
    }
}

/// Tag recorded for every point (or half point) spent from the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "activity")]
pub enum ActivityKind {
    Travel,
    Reconnoiter,
    Individual,
    /// A one-point activity begun on a half-point day.
    HalfStarted(HalfActivityKind),
    /// A half-point day left unused.
    HalfSkipped,
}

impl ActivityKind {
    /// Points one entry of this tag stands for.
    #[must_use]
    pub const fn unit_cost(self) -> ActivityPoints {
        match self {
            Self::Travel | Self::Reconnoiter | Self::Individual => ActivityPoints::ONE,
            Self::HalfStarted(_) | Self::HalfSkipped => ActivityPoints::HALF,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Travel => "travel",
            Self::Reconnoiter => "reconnoiter",
            Self::Individual => "individual",
            Self::HalfStarted(_) => "started",
            Self::HalfSkipped => "skipped",
        }
    }
}

/// Activities that can be begun on a half-point day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HalfActivityKind {
    Group,
    Individual,
}

/// Spend ledger for the current day.
///
/// Snapshots are checked on load: `remaining` may not exceed `total`, and
/// the tags in `used` must account for exactly `total - remaining`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(try_from = "RawActivityBudget")]
pub struct ActivityBudget {
    pub total: ActivityPoints,
    pub remaining: ActivityPoints,
    #[serde(default)]
    pub used: SmallVec<[ActivityKind; 4]>,
}

#[derive(Deserialize)]
struct RawActivityBudget {
    total: ActivityPoints,
    remaining: ActivityPoints,
    #[serde(default)]
    used: SmallVec<[ActivityKind; 4]>,
}

impl TryFrom<RawActivityBudget> for ActivityBudget {
    type Error = InvalidBudget;

    fn try_from(raw: RawActivityBudget) -> Result<Self, Self::Error> {
        let budget = Self {
            total: raw.total,
            remaining: raw.remaining,
            used: raw.used,
        };
        budget.validate()?;
        Ok(budget)
    }
}

/// Why a spend was refused. The budget is unchanged in every case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SpendError {
    #[error("insufficient activity points: {required} required, {remaining} remaining")]
    Insufficient {
        required: ActivityPoints,
        remaining: ActivityPoints,
    },
    #[error("{cost} points cannot be recorded as whole {} entries", .kind.label())]
    UnevenCost {
        kind: ActivityKind,
        cost: ActivityPoints,
    },
}

/// A budget whose fields contradict each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidBudget {
    #[error("remaining {remaining} exceeds total {total}")]
    RemainingAboveTotal {
        total: ActivityPoints,
        remaining: ActivityPoints,
    },
    #[error("used entries account for {spent} but total {total} minus remaining {remaining} differs")]
    Unbalanced {
        total: ActivityPoints,
        remaining: ActivityPoints,
        spent: ActivityPoints,
    },
}

impl ActivityBudget {
    #[must_use]
    pub fn new(total: ActivityPoints) -> Self {
        Self {
            total,
            remaining: total,
            used: SmallVec::new(),
        }
    }

    /// The single Travel activity granted on a forced march day.
    #[must_use]
    pub fn forced_march() -> Self {
        Self::new(ActivityPoints::from_halves(FORCED_MARCH_HALVES))
    }

    #[must_use]
    pub fn can_afford(&self, cost: ActivityPoints) -> bool {
        cost <= self.remaining
    }

    /// Deduct `cost` and record one `kind` tag per whole point (or one tag
    /// for a half point). Nothing changes when the spend is refused.
    ///
    /// # Errors
    ///
    /// Returns [`SpendError::UnevenCost`] when `cost` is not a whole number
    /// of `kind` entries, and [`SpendError::Insufficient`] when it exceeds
    /// the remaining points.
    pub fn spend(&mut self, kind: ActivityKind, cost: ActivityPoints) -> Result<(), SpendError> {
        let unit = kind.unit_cost().halves();
        if cost.is_zero() || cost.halves() % unit != 0 {
            return Err(SpendError::UnevenCost { kind, cost });
        }
        let remaining = self.remaining.checked_sub(cost).ok_or(SpendError::Insufficient {
            required: cost,
            remaining: self.remaining,
        })?;
        self.remaining = remaining;
        for _ in 0..cost.halves() / unit {
            self.used.push(kind);
        }
        Ok(())
    }

    /// Check that `remaining` fits inside `total` and that `used` accounts
    /// for the difference.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidBudget`] describing the first contradiction found.
    pub fn validate(&self) -> Result<(), InvalidBudget> {
        let Some(expected) = self.total.checked_sub(self.remaining) else {
            return Err(InvalidBudget::RemainingAboveTotal {
                total: self.total,
                remaining: self.remaining,
            });
        };
        let spent = self.spent();
        if spent != expected {
            return Err(InvalidBudget::Unbalanced {
                total: self.total,
                remaining: self.remaining,
                spent,
            });
        }
        Ok(())
    }

    /// Sum of the costs recorded in `used`.
    #[must_use]
    pub fn spent(&self) -> ActivityPoints {
        self.used
            .iter()
            .fold(ActivityPoints::ZERO, |acc, kind| acc.saturating_add(kind.unit_cost()))
    }
}

/// Daily budget for a party whose slowest active member moves `speed` feet.
#[must_use]
pub fn activity_points_for_speed(speed: u32) -> ActivityPoints {
    SPEED_ACTIVITY_TABLE
        .iter()
        .find(|(max_speed, _)| speed <= *max_speed)
        .map_or(
            ActivityPoints::from_halves(FASTEST_ACTIVITY_HALVES),
            |(_, halves)| ActivityPoints::from_halves(*halves),
        )
}

/// Base activity cost of moving through or exploring terrain of `difficulty`.
#[must_use]
pub const fn base_cost(difficulty: TerrainDifficulty) -> u8 {
    match difficulty {
        TerrainDifficulty::Open => 1,
        TerrainDifficulty::Difficult => 2,
        TerrainDifficulty::GreaterDifficult => 3,
    }
}

/// Cost of travelling into `destination`; a road shaves one point off
/// difficult terrain but never drops the cost below one.
#[must_use]
pub const fn travel_cost(destination: &HexSetup) -> ActivityPoints {
    let base = base_cost(destination.terrain_difficulty);
    let cost = if destination.has_road && base > 1 {
        base - 1
    } else {
        base
    };
    ActivityPoints::whole(cost)
}

/// Cost of reconnoitering `current`; roads never help.
#[must_use]
pub const fn reconnoiter_cost(current: &Hex) -> ActivityPoints {
    ActivityPoints::whole(base_cost(current.terrain_difficulty))
}

/// Flat cost of one round of individual activities, however many take part.
#[must_use]
pub const fn individual_activities_cost() -> ActivityPoints {
    ActivityPoints::from_halves(INDIVIDUAL_ACTIVITY_HALVES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::{Ruleset, TerrainType};

    #[test]
    fn speed_table_matches_bands() {
        let cases = [
            (5, 0.5),
            (10, 0.5),
            (11, 1.0),
            (25, 1.0),
            (26, 2.0),
            (40, 2.0),
            (41, 3.0),
            (55, 3.0),
            (56, 4.0),
            (120, 4.0),
        ];
        for (speed, expected) in cases {
            let points = activity_points_for_speed(speed);
            assert!(
                (points.as_f32() - expected).abs() < f32::EPSILON,
                "speed {speed} produced {points}"
            );
        }
    }

    #[test]
    fn road_reduces_travel_only_on_rough_terrain() {
        let open = HexSetup::new(TerrainType::Plains, TerrainDifficulty::Open);
        assert_eq!(travel_cost(&open), ActivityPoints::whole(1));
        assert_eq!(travel_cost(&open.clone().with_road(true)), ActivityPoints::whole(1));

        let difficult = HexSetup::new(TerrainType::Forest, TerrainDifficulty::Difficult);
        assert_eq!(travel_cost(&difficult), ActivityPoints::whole(2));
        assert_eq!(travel_cost(&difficult.with_road(true)), ActivityPoints::whole(1));

        let greater = HexSetup::new(TerrainType::Mountain, TerrainDifficulty::GreaterDifficult);
        assert_eq!(travel_cost(&greater), ActivityPoints::whole(3));
        assert_eq!(travel_cost(&greater.with_road(true)), ActivityPoints::whole(2));
    }

    #[test]
    fn reconnoiter_ignores_roads() {
        let setup = HexSetup::new(TerrainType::Mountain, TerrainDifficulty::GreaterDifficult)
            .with_road(true);
        let hex = Hex::starting(&setup, Ruleset::Standard);
        assert_eq!(reconnoiter_cost(&hex), ActivityPoints::whole(3));
    }

    #[test]
    fn spend_records_one_tag_per_point_and_rejects_overdraw() {
        let mut budget = ActivityBudget::new(ActivityPoints::whole(3));
        budget.spend(ActivityKind::Travel, ActivityPoints::whole(2)).unwrap();
        assert_eq!(budget.remaining, ActivityPoints::whole(1));
        assert_eq!(budget.used.as_slice(), &[ActivityKind::Travel, ActivityKind::Travel]);

        let err = budget
            .spend(ActivityKind::Reconnoiter, ActivityPoints::whole(2))
            .unwrap_err();
        assert_eq!(
            err,
            SpendError::Insufficient {
                required: ActivityPoints::whole(2),
                remaining: ActivityPoints::whole(1),
            }
        );
        assert_eq!(budget.remaining, ActivityPoints::whole(1));
        assert_eq!(budget.used.len(), 2);
        assert_eq!(budget.spent().saturating_add(budget.remaining), budget.total);
    }

    #[test]
    fn half_day_tags_cost_half_a_point() {
        let mut budget = ActivityBudget::new(ActivityPoints::HALF);
        budget
            .spend(
                ActivityKind::HalfStarted(HalfActivityKind::Group),
                ActivityPoints::HALF,
            )
            .unwrap();
        assert!(budget.remaining.is_zero());
        assert_eq!(budget.spent(), budget.total);
    }

    #[test]
    fn spend_refuses_costs_that_tags_cannot_record() {
        let mut budget = ActivityBudget::new(ActivityPoints::whole(2));
        let err = budget
            .spend(ActivityKind::Travel, ActivityPoints::HALF)
            .unwrap_err();
        assert_eq!(
            err,
            SpendError::UnevenCost {
                kind: ActivityKind::Travel,
                cost: ActivityPoints::HALF,
            }
        );
        assert!(
            budget
                .spend(ActivityKind::Individual, ActivityPoints::from_halves(3))
                .is_err()
        );
        assert!(budget.spend(ActivityKind::Travel, ActivityPoints::ZERO).is_err());
        assert_eq!(budget.remaining, ActivityPoints::whole(2));
        assert!(budget.used.is_empty());
        budget.validate().unwrap();
    }

    #[test]
    fn contradictory_budgets_fail_to_load() {
        let err = serde_json::from_str::<ActivityBudget>(
            r#"{"total":1.0,"remaining":4.0,"used":[]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("remaining 4 exceeds total 1"), "{err}");

        let err = serde_json::from_str::<ActivityBudget>(
            r#"{"total":2.0,"remaining":1.0,"used":[]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("used entries account for 0"), "{err}");

        let ok: ActivityBudget = serde_json::from_str(
            r#"{"total":2.0,"remaining":1.0,"used":[{"kind":"travel"}]}"#,
        )
        .unwrap();
        assert_eq!(ok.used.as_slice(), &[ActivityKind::Travel]);
    }

    #[test]
    fn points_serialize_as_numbers() {
        let json = serde_json::to_string(&ActivityPoints::HALF).unwrap();
        assert_eq!(json, "0.5");
        let parsed: ActivityPoints = serde_json::from_str("3.0").unwrap();
        assert_eq!(parsed, ActivityPoints::whole(3));
        assert!(serde_json::from_str::<ActivityPoints>("0.3").is_err());
        assert!(serde_json::from_str::<ActivityPoints>("-1.0").is_err());
        assert_eq!(ActivityPoints::HALF.to_string(), "1/2");
        assert_eq!(ActivityPoints::from_halves(3).to_string(), "1.5");
    }
}
