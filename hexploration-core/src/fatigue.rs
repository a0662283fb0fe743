//! Forced-march streaks, rest recovery and fatigue onset.
use serde::{Deserialize, Serialize};

use crate::constants::MIN_FORCED_MARCH_TOLERANCE;
use crate::party::{Character, CharacterId, Party};

/// Consecutive forced-march days a character can absorb before fatigue.
#[must_use]
pub fn forced_march_tolerance(character: &Character) -> u32 {
    let tolerance = character.constitution_modifier.max(MIN_FORCED_MARCH_TOLERANCE);
    u32::try_from(tolerance).unwrap_or(u32::MAX)
}

/// Change to a character's fatigue recorded at day close.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum FatigueChange {
    Recovered {
        id: CharacterId,
        name: String,
    },
    Gained {
        id: CharacterId,
        name: String,
        forced_march_days: u32,
        tolerance: u32,
    },
}

/// Apply the rest decisions gathered during the fatigue check. Only fatigued
/// characters can be told to rest; everyone else stays active.
pub fn record_rest_decisions(party: &mut Party, mut decide: impl FnMut(&Character) -> bool) {
    for character in party.iter_mut() {
        character.will_rest_today = character.is_fatigued && decide(character);
    }
}

pub fn clear_rest_flags(party: &mut Party) {
    for character in party.iter_mut() {
        character.will_rest_today = false;
    }
}

/// A forced march was accepted: every streak grows by one day.
pub fn begin_forced_march(party: &mut Party) {
    for character in party.iter_mut() {
        character.forced_march_days = character.forced_march_days.saturating_add(1);
    }
}

/// Declining (or being unable) to march breaks every streak.
pub fn break_forced_march_streaks(party: &mut Party) {
    for character in party.iter_mut() {
        character.forced_march_days = 0;
    }
}

/// End-of-day fatigue processing: recovery for those who rested, then onset
/// for marchers whose streak passed their tolerance.
pub fn close_day(party: &mut Party, forced_march_active: bool) -> Vec<FatigueChange> {
    let mut changes = Vec::new();
    for character in party.iter_mut() {
        if character.is_fatigued && character.will_rest_today {
            character.is_fatigued = false;
            character.forced_march_days = 0;
            changes.push(FatigueChange::Recovered {
                id: character.id,
                name: character.name.clone(),
            });
        }
    }
    if !forced_march_active {
        return changes;
    }
    for character in party.iter_mut() {
        let tolerance = forced_march_tolerance(character);
        if !character.is_fatigued && character.forced_march_days > tolerance {
            character.is_fatigued = true;
            changes.push(FatigueChange::Gained {
                id: character.id,
                name: character.name.clone(),
                forced_march_days: character.forced_march_days,
                tolerance,
            });
        }
    }
    changes
}
