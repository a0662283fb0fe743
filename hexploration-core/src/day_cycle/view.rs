//! Read-only projection of a session for presentation layers.
use serde::{Deserialize, Serialize};

use crate::budget::{ActivityKind, ActivityPoints, HalfActivityKind, individual_activities_cost, reconnoiter_cost};
use crate::day_cycle::{InputKind, Phase};
use crate::encounters::{DegreeOfSuccess, EncounterDc};
use crate::fatigue::forced_march_tolerance;
use crate::hex::{Ruleset, TerrainDifficulty, TerrainType};
use crate::individual::IndividualActivity;
use crate::party::CharacterId;
use crate::session::ExplorationSession;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HexSummary {
    pub terrain_type: TerrainType,
    pub terrain_difficulty: TerrainDifficulty,
    pub features: Vec<String>,
    pub is_reconnoitered: bool,
    pub is_mapped: bool,
    pub encounter_dc: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterStatus {
    pub id: CharacterId,
    pub name: String,
    pub speed: u32,
    pub is_fatigued: bool,
    pub forced_march_days: u32,
    /// Forced-march days tolerated before fatigue sets in.
    pub forced_march_tolerance: u32,
    pub is_resting: bool,
}

/// One display slot of the day's budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "slot", content = "kind")]
pub enum BudgetSlot {
    Free,
    Spent(ActivityKind),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetView {
    pub total: ActivityPoints,
    pub remaining: ActivityPoints,
    pub slots: Vec<BudgetSlot>,
}

/// Actions the caller can offer for the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailableAction {
    Continue,
    DecideRest,
    ForcedMarch,
    DeclineForcedMarch,
    RollWeather,
    RollEncounter,
    GroupActivity,
    IndividualActivities,
    Travel,
    Reconnoiter,
    BeginHalf(HalfActivityKind),
    SkipHalf,
    EndDay,
    Back,
    PrepareCampsite,
    NextDay,
    EndExploration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    pub day: u32,
    pub phase: Phase,
    pub expected_input: InputKind,
    pub ruleset: Ruleset,
    pub hex: HexSummary,
    pub characters: Vec<CharacterStatus>,
    pub budget: BudgetView,
    pub forced_march_active: bool,
    pub camp_fortified: bool,
    pub encounters_today: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_event: Option<DegreeOfSuccess>,
    pub available_actions: Vec<AvailableAction>,
    /// Individual tasks selectable in the current hex.
    pub individual_options: Vec<IndividualActivity>,
}

impl SessionView {
    #[must_use]
    pub fn project(session: &ExplorationSession) -> Self {
        let hex = &session.hex;
        Self {
            day: session.day,
            phase: session.phase,
            expected_input: session.phase.expected_input(),
            ruleset: session.ruleset,
            hex: HexSummary {
                terrain_type: hex.terrain_type,
                terrain_difficulty: hex.terrain_difficulty,
                features: hex.feature_labels(),
                is_reconnoitered: hex.is_reconnoitered,
                is_mapped: hex.is_mapped,
                encounter_dc: EncounterDc::for_hex(hex).dc,
            },
            characters: session
                .party
                .iter()
                .map(|character| CharacterStatus {
                    id: character.id,
                    name: character.name.clone(),
                    speed: character.speed,
                    is_fatigued: character.is_fatigued,
                    forced_march_days: character.forced_march_days,
                    forced_march_tolerance: forced_march_tolerance(character),
                    is_resting: character.will_rest_today,
                })
                .collect(),
            budget: budget_view(session),
            forced_march_active: session.forced_march_active,
            camp_fortified: session.camp_fortified,
            encounters_today: session.today.encounters_today(),
            weather_event: session.today.weather_event,
            available_actions: available_actions(session),
            individual_options: IndividualActivity::catalog()
                .into_iter()
                .filter(|activity| !activity.requires_reconnoitered_hex() || hex.is_reconnoitered)
                .collect(),
        }
    }

    #[must_use]
    pub fn offers(&self, action: AvailableAction) -> bool {
        self.available_actions.contains(&action)
    }
}

fn budget_view(session: &ExplorationSession) -> BudgetView {
    let budget = &session.budget;
    let mut slots: Vec<BudgetSlot> = budget.used.iter().copied().map(BudgetSlot::Spent).collect();
    let count = budget.total.slot_count().max(slots.len());
    slots.resize(count, BudgetSlot::Free);
    BudgetView {
        total: budget.total,
        remaining: budget.remaining,
        slots,
    }
}

fn available_actions(session: &ExplorationSession) -> Vec<AvailableAction> {
    use AvailableAction as A;

    let budget = &session.budget;
    match session.phase {
        Phase::StartOfDay | Phase::DetermineActivities => vec![A::Continue],
        Phase::FatigueCheck => {
            if session.party.any_fatigued() {
                vec![A::DecideRest, A::Continue]
            } else {
                vec![A::Continue]
            }
        }
        Phase::ForcedMarchOption => {
            if session.party.any_fatigued() {
                vec![A::Continue]
            } else {
                vec![A::ForcedMarch, A::DeclineForcedMarch]
            }
        }
        Phase::WeatherCheck => vec![A::RollWeather],
        Phase::RandomEncounter => vec![A::RollEncounter],
        Phase::ActivitySelection => {
            if session.forced_march_active {
                vec![A::Travel, A::EndDay]
            } else if budget.remaining.is_zero() {
                vec![A::EndDay]
            } else if budget.total.is_half_day() {
                vec![
                    A::BeginHalf(HalfActivityKind::Group),
                    A::BeginHalf(HalfActivityKind::Individual),
                    A::SkipHalf,
                    A::EndDay,
                ]
            } else {
                let mut actions = vec![A::GroupActivity];
                if budget.can_afford(individual_activities_cost()) {
                    actions.push(A::IndividualActivities);
                }
                actions.push(A::EndDay);
                actions
            }
        }
        Phase::GroupActivity => {
            let mut actions = vec![A::Travel];
            if !session.hex.is_reconnoitered && budget.can_afford(reconnoiter_cost(&session.hex)) {
                actions.push(A::Reconnoiter);
            }
            actions.push(A::Back);
            actions
        }
        Phase::Travel => vec![A::Travel, A::Back],
        Phase::Reconnoiter => vec![A::Reconnoiter, A::Back],
        Phase::IndividualActivities => vec![A::IndividualActivities, A::Back],
        Phase::PrepareCampsite => vec![A::PrepareCampsite],
        Phase::EndOfDay => vec![A::NextDay, A::EndExploration],
        Phase::Terminated => Vec::new(),
    }
}
