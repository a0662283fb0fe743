//! Per-character tasks performed together as one individual-activities round.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::encounters::{DegreeOfSuccess, flat_check};
use crate::party::CharacterId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "activity", content = "description")]
pub enum IndividualActivity {
    /// No task chosen for this character.
    #[default]
    None,
    FortifyCamp,
    MapArea,
    Subsist,
    Aid,
    Seek,
    RestShort,
    Other(String),
}

impl IndividualActivity {
    #[must_use]
    pub const fn is_trivial(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Whether the task can be picked given the current hex state.
    #[must_use]
    pub const fn requires_reconnoitered_hex(&self) -> bool {
        matches!(self, Self::MapArea)
    }

    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::None => "none",
            Self::FortifyCamp => "fortify-camp",
            Self::MapArea => "map-area",
            Self::Subsist => "subsist",
            Self::Aid => "aid",
            Self::Seek => "seek",
            Self::RestShort => "rest-short",
            Self::Other(description) => description,
        }
    }

    /// Every selectable task, `Other` carrying an empty description.
    #[must_use]
    pub fn catalog() -> Vec<Self> {
        vec![
            Self::FortifyCamp,
            Self::MapArea,
            Self::Subsist,
            Self::Aid,
            Self::Seek,
            Self::RestShort,
            Self::Other(String::new()),
        ]
    }
}

impl fmt::Display for IndividualActivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A check rolled by the player, total against DC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub total: i32,
    pub dc: i32,
}

impl CheckResult {
    #[must_use]
    pub const fn new(total: i32, dc: i32) -> Self {
        Self { total, dc }
    }

    #[must_use]
    pub const fn degree(self) -> DegreeOfSuccess {
        flat_check(self.total, self.dc)
    }
}

/// One character's pick for the round, with an optional check outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndividualSelection {
    pub character: CharacterId,
    pub activity: IndividualActivity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<CheckResult>,
}

impl IndividualSelection {
    #[must_use]
    pub const fn new(character: CharacterId, activity: IndividualActivity) -> Self {
        Self {
            character,
            activity,
            check: None,
        }
    }

    #[must_use]
    pub fn with_check(mut self, total: i32, dc: i32) -> Self {
        self.check = Some(CheckResult::new(total, dc));
        self
    }
}

/// Session effects produced by a resolved round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoundEffects {
    pub camp_fortified: bool,
    pub hex_mapped: bool,
}

/// Effect of a single resolved task.
#[must_use]
pub fn effects_of(activity: &IndividualActivity, degree: Option<DegreeOfSuccess>) -> RoundEffects {
    let succeeded = degree.is_some_and(DegreeOfSuccess::is_success);
    RoundEffects {
        camp_fortified: succeeded && matches!(activity, IndividualActivity::FortifyCamp),
        hex_mapped: succeeded && matches!(activity, IndividualActivity::MapArea),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fortify_needs_a_success() {
        let fortify = IndividualActivity::FortifyCamp;
        assert!(effects_of(&fortify, Some(CheckResult::new(18, 15).degree())).camp_fortified);
        assert!(effects_of(&fortify, Some(CheckResult::new(30, 15).degree())).camp_fortified);
        assert!(!effects_of(&fortify, Some(CheckResult::new(14, 15).degree())).camp_fortified);
        assert!(!effects_of(&fortify, None).camp_fortified);
    }

    #[test]
    fn mapping_marks_hex_only_for_map_area() {
        let degree = Some(DegreeOfSuccess::Success);
        assert!(effects_of(&IndividualActivity::MapArea, degree).hex_mapped);
        assert!(!effects_of(&IndividualActivity::Seek, degree).hex_mapped);
    }

    #[test]
    fn only_none_is_trivial() {
        assert!(IndividualActivity::None.is_trivial());
        assert!(!IndividualActivity::RestShort.is_trivial());
        assert_eq!(IndividualActivity::Other("Pray".into()).label(), "Pray");
        assert!(IndividualActivity::catalog().iter().all(|a| !a.is_trivial()));
    }
}
