//! Party roster: characters and their day-to-day status.
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Opaque, session-unique character handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacterId(u32);

impl CharacterId {
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "character-{}", self.0)
    }
}

/// Caller-supplied roster line used to seed a character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub name: String,
    pub speed: u32,
    #[serde(default)]
    pub constitution_modifier: i32,
}

impl RosterEntry {
    #[must_use]
    pub fn new(name: impl Into<String>, speed: u32, constitution_modifier: i32) -> Self {
        Self {
            name: name.into(),
            speed,
            constitution_modifier,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    /// Movement speed in feet.
    pub speed: u32,
    pub constitution_modifier: i32,
    #[serde(default)]
    pub is_fatigued: bool,
    /// Consecutive forced-march days.
    #[serde(default)]
    pub forced_march_days: u32,
    /// Recomputed every day during the fatigue check.
    #[serde(default)]
    pub will_rest_today: bool,
}

impl Character {
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.will_rest_today
    }
}

/// Errors raised while building or editing the roster.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("the party needs at least one character")]
    EmptyRoster,
    #[error("{name} must have a positive speed (got {speed})")]
    InvalidSpeed { name: String, speed: u32 },
    #[error("no character with id {0}")]
    UnknownCharacter(CharacterId),
}

/// Partial edit applied to an existing character.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CharacterUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constitution_modifier: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_fatigued: Option<bool>,
}

/// Ordered party with stable id allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Party {
    members: Vec<Character>,
    next_id: u32,
}

impl Party {
    /// Seed a party from roster lines, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::EmptyRoster`] for an empty roster and
    /// [`SetupError::InvalidSpeed`] for a zero speed.
    pub fn from_roster(roster: &[RosterEntry]) -> Result<Self, SetupError> {
        if roster.is_empty() {
            return Err(SetupError::EmptyRoster);
        }
        let mut party = Self::default();
        for entry in roster {
            party.add(entry.clone())?;
        }
        Ok(party)
    }

    /// Append a character and return its fresh id.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::InvalidSpeed`] when `entry.speed` is zero.
    pub fn add(&mut self, entry: RosterEntry) -> Result<CharacterId, SetupError> {
        validate_speed(&entry.name, entry.speed)?;
        let id = CharacterId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.members.push(Character {
            id,
            name: entry.name,
            speed: entry.speed,
            constitution_modifier: entry.constitution_modifier,
            is_fatigued: false,
            forced_march_days: 0,
            will_rest_today: false,
        });
        Ok(id)
    }

    /// Remove a character by id, returning it.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::UnknownCharacter`] when no member has `id`.
    pub fn remove(&mut self, id: CharacterId) -> Result<Character, SetupError> {
        let index = self
            .members
            .iter()
            .position(|c| c.id == id)
            .ok_or(SetupError::UnknownCharacter(id))?;
        Ok(self.members.remove(index))
    }

    /// Apply a partial edit to a character.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::UnknownCharacter`] for a missing id and
    /// [`SetupError::InvalidSpeed`] for a zero speed.
    pub fn update(&mut self, id: CharacterId, update: CharacterUpdate) -> Result<(), SetupError> {
        let character = self.get_mut(id).ok_or(SetupError::UnknownCharacter(id))?;
        if let Some(speed) = update.speed {
            validate_speed(&character.name, speed)?;
            character.speed = speed;
        }
        if let Some(name) = update.name {
            character.name = name;
        }
        if let Some(modifier) = update.constitution_modifier {
            character.constitution_modifier = modifier;
        }
        if let Some(fatigued) = update.is_fatigued {
            character.is_fatigued = fatigued;
        }
        Ok(())
    }

    #[must_use]
    pub fn members(&self) -> &[Character] {
        &self.members
    }

    pub fn iter(&self) -> impl Iterator<Item = &Character> {
        self.members.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Character> {
        self.members.iter_mut()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: CharacterId) -> Option<&Character> {
        self.members.iter().find(|c| c.id == id)
    }

    pub fn get_mut(&mut self, id: CharacterId) -> Option<&mut Character> {
        self.members.iter_mut().find(|c| c.id == id)
    }

    /// Characters who are not resting today.
    pub fn active(&self) -> impl Iterator<Item = &Character> {
        self.members.iter().filter(|c| c.is_active())
    }

    /// Slowest active character; ties resolve to the earliest in roster order.
    #[must_use]
    pub fn slowest_active(&self) -> Option<&Character> {
        self.active()
            .fold(None, |slowest: Option<&Character>, current| match slowest {
                Some(s) if s.speed <= current.speed => Some(s),
                _ => Some(current),
            })
    }

    #[must_use]
    pub fn any_fatigued(&self) -> bool {
        self.members.iter().any(|c| c.is_fatigued)
    }
}

fn validate_speed(name: &str, speed: u32) -> Result<(), SetupError> {
    if speed == 0 {
        return Err(SetupError::InvalidSpeed {
            name: name.to_string(),
            speed,
        });
    }
    Ok(())
}
