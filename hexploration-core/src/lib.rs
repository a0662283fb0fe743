//! Hexploration Day-Cycle Engine
//!
//! Platform-agnostic rules engine for the daily exploration loop of a
//! hex-crawl tabletop game. The crate owns no rendering, I/O or randomness:
//! callers feed die results and player decisions in, and read phase views
//! and log entries back out.

use anyhow::Context;

pub mod budget;
pub mod constants;
pub mod day_cycle;
pub mod encounters;
pub mod fatigue;
pub mod hex;
pub mod individual;
pub mod party;
pub mod session;

// Re-export commonly used types
pub use budget::{
    ActivityBudget, ActivityKind, ActivityPoints, HalfActivityKind, InvalidActivityPoints,
    InvalidBudget, SpendError, activity_points_for_speed, individual_activities_cost,
    reconnoiter_cost, travel_cost,
};
pub use day_cycle::{
    ActivityChoice, AvailableAction, BudgetSlot, DayCycleEngine, DayEndChoice, EngineError,
    GroupChoice, InputKind, Phase, PhaseInput, RestDecision, SessionView, Transition, step,
};
pub use encounters::{
    DegreeOfSuccess, EncounterCheck, EncounterDc, EncounterKind, flat_check, terrain_encounter_dc,
};
pub use fatigue::{FatigueChange, forced_march_tolerance};
pub use hex::{Hex, HexSetup, Ruleset, TerrainDifficulty, TerrainType, UnknownTerrain};
pub use individual::{CheckResult, IndividualActivity, IndividualSelection};
pub use party::{Character, CharacterId, CharacterUpdate, Party, RosterEntry, SetupError};
pub use session::{DayLog, DayLogEntry, DayState, ExplorationSession, LogStamp};

/// Trait for abstracting save/load of exploration sessions.
/// Platform-specific implementations should provide this
pub trait SessionStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save a session snapshot under `slot`
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be saved.
    fn save_session(&self, slot: &str, session: &ExplorationSession) -> Result<(), Self::Error>;

    /// Load the snapshot stored under `slot`
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be loaded.
    fn load_session(&self, slot: &str) -> Result<Option<ExplorationSession>, Self::Error>;

    /// Delete a saved snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    fn delete_session(&self, slot: &str) -> Result<(), Self::Error>;
}

/// Starts, saves and resumes exploration runs against a storage backend.
pub struct HexplorationEngine<S>
where
    S: SessionStorage,
{
    storage: S,
}

impl<S> HexplorationEngine<S>
where
    S: SessionStorage,
{
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Begin a new run on day one.
    ///
    /// # Errors
    ///
    /// Returns an error if the roster is empty or a speed is invalid.
    pub fn start_run(
        &self,
        roster: &[RosterEntry],
        start: &HexSetup,
        ruleset: Ruleset,
    ) -> Result<DayCycleEngine, EngineError> {
        DayCycleEngine::start(roster, start, ruleset)
    }

    /// Persist the run's current snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be saved.
    pub fn save_run(&self, slot: &str, run: &DayCycleEngine) -> Result<(), S::Error> {
        self.storage.save_session(slot, run.session())
    }

    /// Resume a saved run
    ///
    /// # Errors
    ///
    /// Returns an error if the stored snapshot cannot be loaded, has an
    /// empty party, or carries a budget whose fields contradict each other.
    pub fn resume_run(&self, slot: &str) -> Result<Option<DayCycleEngine>, anyhow::Error>
    where
        S::Error: Into<anyhow::Error>,
    {
        let Some(session) = self.storage.load_session(slot).map_err(Into::into)? else {
            return Ok(None);
        };
        if session.party.is_empty() {
            anyhow::bail!("saved session {slot:?} has an empty party");
        }
        session
            .budget
            .validate()
            .with_context(|| format!("saved session {slot:?} has an inconsistent budget"))?;
        log::debug!("resumed {slot} on day {} at {}", session.day, session.phase);
        Ok(Some(DayCycleEngine::from_session(session)))
    }

    /// Drop a saved run
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    pub fn delete_run(&self, slot: &str) -> Result<(), S::Error> {
        self.storage.delete_session(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct MemoryStorage {
        saves: Rc<RefCell<HashMap<String, String>>>,
    }

    impl SessionStorage for MemoryStorage {
        type Error = serde_json::Error;

        fn save_session(&self, slot: &str, session: &ExplorationSession) -> Result<(), Self::Error> {
            let json = serde_json::to_string(session)?;
            self.saves.borrow_mut().insert(slot.to_string(), json);
            Ok(())
        }

        fn load_session(&self, slot: &str) -> Result<Option<ExplorationSession>, Self::Error> {
            self.saves
                .borrow()
                .get(slot)
                .map(|json| serde_json::from_str(json))
                .transpose()
        }

        fn delete_session(&self, slot: &str) -> Result<(), Self::Error> {
            self.saves.borrow_mut().remove(slot);
            Ok(())
        }
    }

    #[test]
    fn engine_saves_and_resumes_runs() {
        let engine = HexplorationEngine::new(MemoryStorage::default());
        let mut run = engine
            .start_run(
                &[RosterEntry::new("Amiri", 30, 2)],
                &HexSetup::new(TerrainType::Swamp, TerrainDifficulty::Difficult),
                Ruleset::Kingmaker,
            )
            .unwrap();
        run.advance(PhaseInput::Continue).unwrap();
        run.advance(PhaseInput::Continue).unwrap();
        engine.save_run("slot-one", &run).unwrap();

        let resumed = engine.resume_run("slot-one").unwrap().expect("save exists");
        assert_eq!(resumed.session(), run.session());
        assert_eq!(resumed.phase(), Phase::DetermineActivities);
        assert_eq!(resumed.session().hex.zone_dc, Some(18));

        engine.delete_run("slot-one").unwrap();
        assert!(engine.resume_run("slot-one").unwrap().is_none());
    }

    fn tampered_save(storage: &MemoryStorage, edit: impl FnOnce(&mut serde_json::Value)) {
        let engine = HexplorationEngine::new(storage.clone());
        let run = engine
            .start_run(
                &[RosterEntry::new("Amiri", 30, 2)],
                &HexSetup::default(),
                Ruleset::Standard,
            )
            .unwrap();
        let mut value = serde_json::to_value(run.session()).unwrap();
        edit(&mut value);
        storage
            .saves
            .borrow_mut()
            .insert("tampered".to_string(), value.to_string());
    }

    #[test]
    fn resume_rejects_budget_above_total() {
        let storage = MemoryStorage::default();
        tampered_save(&storage, |value| {
            value["budget"] = serde_json::json!({"total": 1.0, "remaining": 4.0, "used": []});
        });
        let engine = HexplorationEngine::new(storage);
        let err = engine.resume_run("tampered").err().expect("resume must fail");
        assert!(format!("{err:#}").contains("remaining 4 exceeds total 1"), "{err:#}");
    }

    #[test]
    fn resume_rejects_unknown_phase_tag() {
        let storage = MemoryStorage::default();
        tampered_save(&storage, |value| value["phase"] = "lunch".into());
        let engine = HexplorationEngine::new(storage);
        let err = engine.resume_run("tampered").err().expect("resume must fail");
        assert!(format!("{err:#}").contains(r#"unknown phase tag "lunch""#), "{err:#}");
    }

    #[test]
    fn start_run_rejects_empty_roster() {
        let engine = HexplorationEngine::new(MemoryStorage::default());
        let err = engine
            .start_run(&[], &HexSetup::default(), Ruleset::Standard)
            .unwrap_err();
        assert_eq!(err, EngineError::Setup(SetupError::EmptyRoster));
    }
}
