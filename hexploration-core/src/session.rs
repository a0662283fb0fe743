//! Exploration session root and its append-only day log.
use serde::{Deserialize, Serialize};

use crate::budget::ActivityBudget;
use crate::constants::{LOG_EXPLORATION_START, LOG_STARTING_HEX};
use crate::day_cycle::Phase;
use crate::encounters::{DegreeOfSuccess, EncounterCheck, EncounterKind};
use crate::fatigue::FatigueChange;
use crate::hex::{Hex, HexSetup, Ruleset};
use crate::party::{Party, RosterEntry, SetupError};

/// Deterministic position of a log entry: the day it was written on and
/// its index in the whole log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LogStamp {
    pub day: u32,
    pub seq: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayLogEntry {
    pub stamp: LogStamp,
    /// Stable message key for presentation layers.
    pub key: String,
    pub text: String,
}

/// Append-only log; entries are never edited or removed once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct DayLog {
    entries: Vec<DayLogEntry>,
}

impl DayLog {
    pub fn push(&mut self, day: u32, key: &str, text: impl Into<String>) {
        let seq = u32::try_from(self.entries.len()).unwrap_or(u32::MAX);
        self.entries.push(DayLogEntry {
            stamp: LogStamp { day, seq },
            key: key.to_string(),
            text: text.into(),
        });
    }

    #[must_use]
    pub fn entries(&self) -> &[DayLogEntry] {
        &self.entries
    }

    /// Entries appended at or after position `mark`.
    #[must_use]
    pub fn since(&self, mark: usize) -> &[DayLogEntry] {
        self.entries.get(mark..).unwrap_or(&[])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DayLogEntry> {
        self.entries.iter()
    }
}

/// Per-day outcomes cleared at the start of every day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DayState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encounter: Option<EncounterCheck>,
    #[serde(default)]
    pub encounter_kinds: Vec<EncounterKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_event: Option<DegreeOfSuccess>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campsite: Option<DegreeOfSuccess>,
    #[serde(default)]
    pub fatigue_changes: Vec<FatigueChange>,
}

impl DayState {
    #[must_use]
    pub fn encounters_today(&self) -> u8 {
        self.encounter.as_ref().map_or(0, |check| check.encounters)
    }

    #[must_use]
    pub fn weather_event_occurs(&self) -> bool {
        self.weather_event.is_some_and(DegreeOfSuccess::is_success)
    }
}

/// Root object for one exploration run; the day-cycle engine owns and
/// advances it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorationSession {
    pub day: u32,
    pub phase: Phase,
    #[serde(default)]
    pub ruleset: Ruleset,
    #[serde(default)]
    pub forced_march_active: bool,
    #[serde(default)]
    pub camp_fortified: bool,
    pub party: Party,
    pub hex: Hex,
    #[serde(default)]
    pub budget: ActivityBudget,
    #[serde(default)]
    pub today: DayState,
    #[serde(default)]
    pub log: DayLog,
}

impl ExplorationSession {
    /// Start a run on day one, awaiting the start-of-day step.
    ///
    /// # Errors
    ///
    /// Returns a [`SetupError`] when the roster is empty or invalid.
    pub fn new(
        roster: &[RosterEntry],
        start: &HexSetup,
        ruleset: Ruleset,
    ) -> Result<Self, SetupError> {
        let party = Party::from_roster(roster)?;
        let hex = Hex::starting(start, ruleset);
        let mut session = Self {
            day: 1,
            phase: Phase::StartOfDay,
            ruleset,
            forced_march_active: false,
            camp_fortified: false,
            party,
            hex,
            budget: ActivityBudget::default(),
            today: DayState::default(),
            log: DayLog::default(),
        };
        let mode = if ruleset.is_kingmaker() {
            "Enabled"
        } else {
            "Disabled"
        };
        session.record(
            LOG_EXPLORATION_START,
            format!("Starting Exploration (Kingmaker Mode: {mode})."),
        );
        let starting = format!(
            "Starting Hex: {}, {}.",
            session.hex.terrain_type, session.hex.terrain_difficulty
        );
        session.record(LOG_STARTING_HEX, starting);
        Ok(session)
    }

    /// Append a log line stamped with the current day.
    pub fn record(&mut self, key: &str, text: impl Into<String>) {
        self.log.push(self.day, key, text);
    }

    #[must_use]
    pub const fn is_terminated(&self) -> bool {
        matches!(self.phase, Phase::Terminated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::{TerrainDifficulty, TerrainType};

    #[test]
    fn new_session_starts_on_day_one_with_intro_log() {
        let session = ExplorationSession::new(
            &[RosterEntry::new("Seelah", 25, 1)],
            &HexSetup::new(TerrainType::Forest, TerrainDifficulty::Difficult),
            Ruleset::Standard,
        )
        .unwrap();
        assert_eq!(session.day, 1);
        assert_eq!(session.phase, Phase::StartOfDay);
        assert_eq!(session.log.len(), 2);
        assert_eq!(session.log.entries()[1].text, "Starting Hex: forest, difficult.");
        assert!(session.budget.total.is_zero());
    }

    #[test]
    fn empty_roster_blocks_session_start() {
        let err = ExplorationSession::new(&[], &HexSetup::default(), Ruleset::Standard)
            .unwrap_err();
        assert_eq!(err, SetupError::EmptyRoster);
    }

    #[test]
    fn log_stamps_are_sequential() {
        let mut log = DayLog::default();
        log.push(1, "a", "first");
        log.push(2, "b", "second");
        assert_eq!(log.entries()[0].stamp, LogStamp { day: 1, seq: 0 });
        assert_eq!(log.entries()[1].stamp, LogStamp { day: 2, seq: 1 });
        assert_eq!(log.since(1).len(), 1);
        assert!(log.since(5).is_empty());
    }
}
