//! Day-cycle phase machine driving an [`ExplorationSession`] one step at a time.
//!
//! Every step is a pure function of `(session, input)`: it works on a copy
//! of the session and only hands back the new snapshot when the input is
//! accepted, so a rejected input never leaves residue behind.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::budget::{ActivityPoints, HalfActivityKind, SpendError};
use crate::hex::{HexSetup, Ruleset};
use crate::individual::IndividualSelection;
use crate::party::{CharacterId, RosterEntry, SetupError};
use crate::session::{DayLogEntry, ExplorationSession};

mod phase;
pub mod view;

use phase::{ActivityPhase, MorningPhase, NightPhase};
pub use view::{AvailableAction, BudgetSlot, BudgetView, CharacterStatus, HexSummary, SessionView};

/// Phases of an exploration day, in nominal order.
///
/// Tags are read back through [`FromStr`], so an unknown tag in a saved
/// session is logged and reported as [`EngineError::UnknownPhase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum Phase {
    #[default]
    StartOfDay,
    FatigueCheck,
    DetermineActivities,
    ForcedMarchOption,
    /// Extended ruleset only.
    WeatherCheck,
    RandomEncounter,
    ActivitySelection,
    GroupActivity,
    Travel,
    Reconnoiter,
    IndividualActivities,
    /// Extended ruleset only.
    PrepareCampsite,
    EndOfDay,
    Terminated,
}

impl Phase {
    pub const ALL: [Self; 14] = [
        Self::StartOfDay,
        Self::FatigueCheck,
        Self::DetermineActivities,
        Self::ForcedMarchOption,
        Self::WeatherCheck,
        Self::RandomEncounter,
        Self::ActivitySelection,
        Self::GroupActivity,
        Self::Travel,
        Self::Reconnoiter,
        Self::IndividualActivities,
        Self::PrepareCampsite,
        Self::EndOfDay,
        Self::Terminated,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StartOfDay => "start-of-day",
            Self::FatigueCheck => "fatigue-check",
            Self::DetermineActivities => "determine-activities",
            Self::ForcedMarchOption => "forced-march-option",
            Self::WeatherCheck => "weather-check",
            Self::RandomEncounter => "random-encounter",
            Self::ActivitySelection => "activity-selection",
            Self::GroupActivity => "group-activity",
            Self::Travel => "travel",
            Self::Reconnoiter => "reconnoiter",
            Self::IndividualActivities => "individual-activities",
            Self::PrepareCampsite => "prepare-campsite",
            Self::EndOfDay => "end-of-day",
            Self::Terminated => "terminated",
        }
    }

    /// Kind of input this phase waits for.
    #[must_use]
    pub const fn expected_input(self) -> InputKind {
        match self {
            Self::StartOfDay | Self::DetermineActivities => InputKind::Continue,
            Self::FatigueCheck => InputKind::RestDecisions,
            Self::ForcedMarchOption => InputKind::ForcedMarchDecision,
            Self::WeatherCheck => InputKind::Roll,
            Self::RandomEncounter => InputKind::EncounterRoll,
            Self::ActivitySelection => InputKind::ActivityChoice,
            Self::GroupActivity => InputKind::GroupChoice,
            Self::Travel => InputKind::Destination,
            Self::Reconnoiter => InputKind::ReconnoiterResult,
            Self::IndividualActivities => InputKind::IndividualSelections,
            Self::PrepareCampsite => InputKind::CheckTotal,
            Self::EndOfDay => InputKind::DayEndChoice,
            Self::Terminated => InputKind::Nothing,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|phase| phase.as_str() == s)
            .ok_or_else(|| {
                log::error!("unknown phase tag {s:?}");
                EngineError::UnknownPhase(s.to_string())
            })
    }
}

impl TryFrom<String> for Phase {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Shape of the input a phase declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Continue,
    RestDecisions,
    ForcedMarchDecision,
    Roll,
    EncounterRoll,
    ActivityChoice,
    GroupChoice,
    Destination,
    ReconnoiterResult,
    IndividualSelections,
    CheckTotal,
    DayEndChoice,
    Nothing,
}

/// Whether a fatigued character spends the day resting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestDecision {
    pub character: CharacterId,
    pub rest: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityChoice {
    GroupActivity,
    IndividualActivities,
    /// Forced march days only.
    Travel,
    EndDay,
    /// Half-point days only.
    BeginHalf(HalfActivityKind),
    /// Half-point days only.
    SkipHalf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupChoice {
    Travel,
    Reconnoiter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayEndChoice {
    NextDay,
    EndExploration,
}

/// Caller decision fed into the current phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "input", content = "value")]
pub enum PhaseInput {
    Continue,
    Rest(Vec<RestDecision>),
    ForcedMarch(bool),
    /// Raw d20 result.
    Roll(i32),
    /// Start-of-day d20 plus one d10 per encounter for its type.
    Encounter { roll: i32, type_rolls: Vec<i32> },
    Activity(ActivityChoice),
    Group(GroupChoice),
    Travel(HexSetup),
    Reconnoiter { hidden_features_found: bool },
    Individual(Vec<IndividualSelection>),
    /// Leave a not-yet-confirmed step.
    Back,
    /// Check total (modifiers included) for the campsite check.
    CheckTotal(i32),
    EndOfDay(DayEndChoice),
}

/// Reasons a phase rejects its input. The session is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("phase {phase} expects {expected:?} input")]
    UnexpectedInput { phase: Phase, expected: InputKind },
    #[error("roll {value} is outside {min}..={max}")]
    InvalidRoll { value: i32, min: i32, max: i32 },
    #[error("insufficient activity points: {required} required, {remaining} remaining")]
    InsufficientActivityPoints {
        required: ActivityPoints,
        remaining: ActivityPoints,
    },
    #[error("the current hex has already been reconnoitered")]
    AlreadyReconnoitered,
    #[error("a forced march is not possible while anyone is fatigued")]
    ForcedMarchUnavailable,
    #[error("only travel is permitted on a forced march day")]
    ForcedMarchTravelOnly,
    #[error("select an activity for at least one character")]
    NoIndividualActivitySelected,
    #[error("{activity} is unavailable: {reason}")]
    ActivityUnavailable {
        activity: String,
        reason: &'static str,
    },
    #[error("{0} is resting today")]
    CharacterResting(CharacterId),
    #[error("{0} was given more than one activity")]
    DuplicateSelection(CharacterId),
    #[error("no character with id {0}")]
    UnknownCharacter(CharacterId),
    #[error("{0} is not fatigued")]
    NotFatigued(CharacterId),
    #[error("unknown phase tag {0:?}")]
    UnknownPhase(String),
    #[error("the exploration has ended")]
    SessionTerminated,
    #[error(transparent)]
    Setup(#[from] SetupError),
}

impl From<SpendError> for EngineError {
    fn from(value: SpendError) -> Self {
        match value {
            SpendError::Insufficient {
                required,
                remaining,
            } => Self::InsufficientActivityPoints {
                required,
                remaining,
            },
            SpendError::UnevenCost { kind, .. } => Self::ActivityUnavailable {
                activity: kind.label().to_string(),
                reason: "cost is not a whole number of entries",
            },
        }
    }
}

/// Result of an accepted step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: Phase,
    pub phase: Phase,
    /// Log entries written by this step, in order.
    pub emitted: Vec<DayLogEntry>,
}

/// Advance `session` by one phase.
///
/// # Errors
///
/// Returns an [`EngineError`] when the input does not fit the current phase
/// or breaks a rule; the caller should re-prompt the same phase.
pub fn step(
    session: &ExplorationSession,
    input: PhaseInput,
) -> Result<(ExplorationSession, Transition), EngineError> {
    let from = session.phase;
    let mut next = session.clone();
    let mark = next.log.len();
    let phase = dispatch(&mut next, input).inspect_err(|err| {
        if matches!(err, EngineError::SessionTerminated) {
            log::error!("input delivered to a terminated session on day {}", session.day);
        } else {
            log::warn!("{from} rejected input: {err}");
        }
    })?;
    next.phase = phase;
    log::debug!("day {} {from} -> {phase}", next.day);
    let transition = Transition {
        from,
        phase,
        emitted: next.log.since(mark).to_vec(),
    };
    Ok((next, transition))
}

fn dispatch(session: &mut ExplorationSession, input: PhaseInput) -> Result<Phase, EngineError> {
    let phase = session.phase;
    let unexpected = || EngineError::UnexpectedInput {
        phase,
        expected: phase.expected_input(),
    };
    match (phase, input) {
        (Phase::StartOfDay, PhaseInput::Continue) => Ok(MorningPhase::new(session).start_day()),
        (Phase::FatigueCheck, PhaseInput::Continue) => {
            MorningPhase::new(session).fatigue_check(&[])
        }
        (Phase::FatigueCheck, PhaseInput::Rest(decisions)) => {
            MorningPhase::new(session).fatigue_check(&decisions)
        }
        (Phase::DetermineActivities, PhaseInput::Continue) => {
            Ok(MorningPhase::new(session).determine_activities())
        }
        (Phase::ForcedMarchOption, PhaseInput::Continue) => {
            MorningPhase::new(session).forced_march(false)
        }
        (Phase::ForcedMarchOption, PhaseInput::ForcedMarch(accept)) => {
            MorningPhase::new(session).forced_march(accept)
        }
        (Phase::WeatherCheck, PhaseInput::Roll(roll)) => {
            MorningPhase::new(session).weather_check(roll)
        }
        (Phase::RandomEncounter, PhaseInput::Roll(roll)) => {
            MorningPhase::new(session).random_encounter(roll, &[])
        }
        (Phase::RandomEncounter, PhaseInput::Encounter { roll, type_rolls }) => {
            MorningPhase::new(session).random_encounter(roll, &type_rolls)
        }
        (Phase::ActivitySelection, PhaseInput::Continue) => {
            ActivityPhase::new(session).select(ActivityChoice::EndDay)
        }
        (Phase::ActivitySelection, PhaseInput::Activity(choice)) => {
            ActivityPhase::new(session).select(choice)
        }
        (Phase::GroupActivity, PhaseInput::Group(choice)) => {
            ActivityPhase::new(session).group(choice)
        }
        (Phase::Travel, PhaseInput::Travel(destination)) => {
            ActivityPhase::new(session).travel(&destination)
        }
        (Phase::Reconnoiter, PhaseInput::Reconnoiter {
            hidden_features_found,
        }) => ActivityPhase::new(session).reconnoiter(hidden_features_found),
        (Phase::IndividualActivities, PhaseInput::Individual(selections)) => {
            ActivityPhase::new(session).individual(&selections)
        }
        (
            Phase::GroupActivity | Phase::Travel | Phase::Reconnoiter | Phase::IndividualActivities,
            PhaseInput::Back,
        ) => Ok(ActivityPhase::new(session).back()),
        (Phase::PrepareCampsite, PhaseInput::CheckTotal(total)) => {
            Ok(NightPhase::new(session).prepare_campsite(total))
        }
        (Phase::EndOfDay, PhaseInput::Continue) => {
            Ok(NightPhase::new(session).finish(DayEndChoice::NextDay))
        }
        (Phase::EndOfDay, PhaseInput::EndOfDay(choice)) => Ok(NightPhase::new(session).finish(choice)),
        (Phase::Terminated, _) => Err(EngineError::SessionTerminated),
        _ => Err(unexpected()),
    }
}

/// Owns one exploration run and advances it phase by phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCycleEngine {
    session: ExplorationSession,
}

impl DayCycleEngine {
    /// Begin a new run.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Setup`] when the roster is empty or invalid.
    pub fn start(
        roster: &[RosterEntry],
        start: &HexSetup,
        ruleset: Ruleset,
    ) -> Result<Self, EngineError> {
        Ok(Self {
            session: ExplorationSession::new(roster, start, ruleset)?,
        })
    }

    /// Resume from an existing snapshot.
    #[must_use]
    pub const fn from_session(session: ExplorationSession) -> Self {
        Self { session }
    }

    /// Feed the current phase its input and commit the resulting snapshot.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] and keeps the previous snapshot when the
    /// input is rejected.
    pub fn advance(&mut self, input: PhaseInput) -> Result<Transition, EngineError> {
        let (next, transition) = step(&self.session, input)?;
        self.session = next;
        Ok(transition)
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.session.phase
    }

    #[must_use]
    pub const fn expected_input(&self) -> InputKind {
        self.session.phase.expected_input()
    }

    #[must_use]
    pub const fn session(&self) -> &ExplorationSession {
        &self.session
    }

    #[must_use]
    pub fn log(&self) -> &[DayLogEntry] {
        self.session.log.entries()
    }

    #[must_use]
    pub fn view(&self) -> SessionView {
        SessionView::project(&self.session)
    }

    #[must_use]
    pub fn into_session(self) -> ExplorationSession {
        self.session
    }
}

#[cfg(test)]
mod tests;
