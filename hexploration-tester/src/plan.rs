//! Expedition plans: roster, starting hex, ruleset and strategy for a run.
use hexploration_core::{HexSetup, RosterEntry, Ruleset, TerrainDifficulty, TerrainType};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::logic::GameplayStrategy;

pub const DEFAULT_PLAN_DAYS: u32 = 5;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("failed to read plan {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse plan {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("plan {0:?} needs at least one roster entry")]
    EmptyRoster(String),
    #[error("plan {0:?} must run for at least one day")]
    NoDays(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpeditionPlan {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_roster")]
    pub roster: Vec<RosterEntry>,
    #[serde(default)]
    pub start: HexSetup,
    #[serde(default)]
    pub ruleset: Ruleset,
    #[serde(default)]
    pub strategy: GameplayStrategy,
    #[serde(default = "default_days")]
    pub days: u32,
}

fn default_name() -> String {
    "custom".to_string()
}

fn default_roster() -> Vec<RosterEntry> {
    vec![
        RosterEntry::new("Amiri", 30, 2),
        RosterEntry::new("Ezren", 25, 0),
        RosterEntry::new("Kyra", 25, 1),
        RosterEntry::new("Merisiel", 30, 1),
    ]
}

const fn default_days() -> u32 {
    DEFAULT_PLAN_DAYS
}

impl Default for ExpeditionPlan {
    fn default() -> Self {
        Self {
            name: default_name(),
            roster: default_roster(),
            start: HexSetup::new(TerrainType::Plains, TerrainDifficulty::Open),
            ruleset: Ruleset::Standard,
            strategy: GameplayStrategy::default(),
            days: DEFAULT_PLAN_DAYS,
        }
    }
}

impl ExpeditionPlan {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_roster(mut self, roster: Vec<RosterEntry>) -> Self {
        self.roster = roster;
        self
    }

    #[must_use]
    pub fn with_start(mut self, start: HexSetup) -> Self {
        self.start = start;
        self
    }

    #[must_use]
    pub const fn with_ruleset(mut self, ruleset: Ruleset) -> Self {
        self.ruleset = ruleset;
        self
    }

    #[must_use]
    pub const fn with_strategy(mut self, strategy: GameplayStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    #[must_use]
    pub const fn with_days(mut self, days: u32) -> Self {
        self.days = days;
        self
    }

    /// Parse a plan from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError`] when the text is not a valid plan.
    pub fn from_json(label: &Path, json: &str) -> Result<Self, PlanError> {
        let plan: Self = serde_json::from_str(json).map_err(|source| PlanError::Parse {
            path: label.to_path_buf(),
            source,
        })?;
        plan.validate()?;
        Ok(plan)
    }

    /// Load a plan from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError`] when the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let json = std::fs::read_to_string(path).map_err(|source| PlanError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(path, &json)
    }

    fn validate(&self) -> Result<(), PlanError> {
        if self.roster.is_empty() {
            return Err(PlanError::EmptyRoster(self.name.clone()));
        }
        if self.days == 0 {
            return Err(PlanError::NoDays(self.name.clone()));
        }
        Ok(())
    }
}
