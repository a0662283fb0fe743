//! Phase handlers for the day cycle.
//!
//! Each handler borrows the working copy of the session for one step and
//! returns the phase to move to. Errors are raised before the first write
//! wherever possible; the caller discards the copy on error either way.

use std::collections::HashSet;

use crate::budget::{
    ActivityBudget, ActivityKind, ActivityPoints, HalfActivityKind, activity_points_for_speed,
    individual_activities_cost, reconnoiter_cost, travel_cost,
};
use crate::constants::{
    D10_MAX, D10_MIN, D20_MAX, D20_MIN, DEFAULT_ZONE_DC, KINGMAKER_WEATHER_EVENT_DC,
    LOG_ACTIVITY_BUDGET, LOG_ALL_RESTING, LOG_CAMP_FORTIFIED, LOG_CAMP_STATUS, LOG_DAY_END,
    LOG_DAY_START, LOG_DAY_SUMMARY, LOG_ENCOUNTER_CHECK, LOG_ENCOUNTER_TYPE, LOG_ENDED_EARLY,
    LOG_EXPLORATION_END, LOG_FATIGUE_GAINED, LOG_FATIGUE_RECOVERED, LOG_FORCED_MARCH_ACCEPTED,
    LOG_FORCED_MARCH_COMPLETED, LOG_FORCED_MARCH_DECLINED, LOG_FORCED_MARCH_UNAVAILABLE,
    LOG_HALF_SKIPPED, LOG_HALF_STARTED, LOG_HEX_MAPPED, LOG_HIDDEN_FEATURES, LOG_INDIVIDUAL_RESULT, LOG_NO_FATIGUE,
    LOG_PREPARE_CAMPSITE, LOG_PUSH_THROUGH, LOG_RECONNOITERED, LOG_REST_DECISION, LOG_TRAVELED,
    LOG_WEATHER_CHECK,
};
use crate::day_cycle::{ActivityChoice, DayEndChoice, EngineError, GroupChoice, Phase, RestDecision};
use crate::encounters::{EncounterCheck, EncounterDc, EncounterKind, flat_check};
use crate::fatigue::{self, FatigueChange};
use crate::hex::{Hex, HexSetup};
use crate::individual::{IndividualActivity, IndividualSelection, effects_of};
use crate::session::{DayState, ExplorationSession};

fn die(value: i32, min: i32, max: i32) -> Result<i32, EngineError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(EngineError::InvalidRoll { value, min, max })
    }
}

fn plural(count: impl Into<u32>, word: &str) -> String {
    let count = count.into();
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

/// Start-of-day through the random encounter check.
pub(super) struct MorningPhase<'a> {
    session: &'a mut ExplorationSession,
}

impl<'a> MorningPhase<'a> {
    pub(super) const fn new(session: &'a mut ExplorationSession) -> Self {
        Self { session }
    }

    pub(super) fn start_day(&mut self) -> Phase {
        let day = self.session.day;
        self.session
            .record(LOG_DAY_START, format!("--- Starting Day {day} ---"));
        self.session.forced_march_active = false;
        self.session.camp_fortified = false;
        self.session.budget = ActivityBudget::default();
        self.session.today = DayState::default();
        fatigue::clear_rest_flags(&mut self.session.party);
        Phase::FatigueCheck
    }

    pub(super) fn fatigue_check(&mut self, decisions: &[RestDecision]) -> Result<Phase, EngineError> {
        let mut seen = HashSet::new();
        for decision in decisions {
            let character = self
                .session
                .party
                .get(decision.character)
                .ok_or(EngineError::UnknownCharacter(decision.character))?;
            if !character.is_fatigued {
                return Err(EngineError::NotFatigued(decision.character));
            }
            if !seen.insert(decision.character) {
                return Err(EngineError::DuplicateSelection(decision.character));
            }
        }

        fatigue::record_rest_decisions(&mut self.session.party, |character| {
            decisions
                .iter()
                .find(|decision| decision.character == character.id)
                .is_none_or(|decision| decision.rest)
        });

        let lines: Vec<(&str, String)> = self
            .session
            .party
            .iter()
            .filter(|character| character.is_fatigued)
            .map(|character| {
                if character.will_rest_today {
                    (
                        LOG_REST_DECISION,
                        format!("{} is fatigued and will rest today.", character.name),
                    )
                } else {
                    (
                        LOG_PUSH_THROUGH,
                        format!("{} is fatigued but pushes on today.", character.name),
                    )
                }
            })
            .collect();
        if lines.is_empty() {
            self.session
                .record(LOG_NO_FATIGUE, "No party members are fatigued.");
        }
        for (key, text) in lines {
            self.session.record(key, text);
        }
        Ok(Phase::DetermineActivities)
    }

    pub(super) fn determine_activities(&mut self) -> Phase {
        let Some(slowest) = self.session.party.slowest_active() else {
            self.session.budget = ActivityBudget::new(ActivityPoints::ZERO);
            self.session.record(
                LOG_ALL_RESTING,
                "All party members are resting today. No activities are possible.",
            );
            return route_to_day_end(self.session);
        };
        let points = activity_points_for_speed(slowest.speed);
        let text = format!(
            "Party has {points} hexploration activities today (Slowest: {}, {} ft).",
            slowest.name, slowest.speed
        );
        self.session.budget = ActivityBudget::new(points);
        self.session.record(LOG_ACTIVITY_BUDGET, text);
        Phase::ForcedMarchOption
    }

    pub(super) fn forced_march(&mut self, accept: bool) -> Result<Phase, EngineError> {
        if self.session.party.any_fatigued() {
            if accept {
                return Err(EngineError::ForcedMarchUnavailable);
            }
            fatigue::break_forced_march_streaks(&mut self.session.party);
            self.session.record(
                LOG_FORCED_MARCH_UNAVAILABLE,
                "Forced march unavailable: a party member is fatigued.",
            );
        } else if accept {
            self.session.forced_march_active = true;
            self.session.budget = ActivityBudget::forced_march();
            fatigue::begin_forced_march(&mut self.session.party);
            self.session.record(
                LOG_FORCED_MARCH_ACCEPTED,
                "Party undertakes a forced march: one Travel activity today.",
            );
        } else {
            fatigue::break_forced_march_streaks(&mut self.session.party);
            self.session
                .record(LOG_FORCED_MARCH_DECLINED, "Party declines a forced march.");
        }
        Ok(if self.session.ruleset.is_kingmaker() {
            Phase::WeatherCheck
        } else {
            Phase::RandomEncounter
        })
    }

    pub(super) fn weather_check(&mut self, roll: i32) -> Result<Phase, EngineError> {
        let roll = die(roll, D20_MIN, D20_MAX)?;
        let degree = flat_check(roll, KINGMAKER_WEATHER_EVENT_DC);
        self.session.today.weather_event = Some(degree);
        let outcome = if degree.is_success() {
            "a weather event occurs today"
        } else {
            "no weather event"
        };
        self.session.record(
            LOG_WEATHER_CHECK,
            format!(
                "Weather Event Check (DC {KINGMAKER_WEATHER_EVENT_DC}): rolled {roll} - {degree}, {outcome}."
            ),
        );
        Ok(Phase::RandomEncounter)
    }

    pub(super) fn random_encounter(
        &mut self,
        roll: i32,
        type_rolls: &[i32],
    ) -> Result<Phase, EngineError> {
        let roll = die(roll, D20_MIN, D20_MAX)?;
        for &type_roll in type_rolls {
            die(type_roll, D10_MIN, D10_MAX)?;
        }

        let check = EncounterCheck::resolve(EncounterDc::for_hex(&self.session.hex), roll);
        let text = format!(
            "Random Encounter Check (DC {}): rolled {roll} - {}. {}.",
            check.dc.dc,
            check.degree,
            plural(check.encounters, "encounter")
        );
        self.session.record(LOG_ENCOUNTER_CHECK, text);

        let mut kinds = Vec::new();
        for index in 0..usize::from(check.encounters) {
            let text = match type_rolls.get(index).copied().and_then(EncounterKind::from_d10) {
                Some(kind) => {
                    kinds.push(kind);
                    format!("Encounter {}: {}.", index + 1, kind.as_str())
                }
                None => format!("Encounter {}: type undetermined.", index + 1),
            };
            self.session.record(LOG_ENCOUNTER_TYPE, text);
        }
        self.session.today.encounter = Some(check);
        self.session.today.encounter_kinds = kinds;
        Ok(Phase::ActivitySelection)
    }
}

/// The activity hub and everything reachable from it.
pub(super) struct ActivityPhase<'a> {
    session: &'a mut ExplorationSession,
}

impl<'a> ActivityPhase<'a> {
    pub(super) const fn new(session: &'a mut ExplorationSession) -> Self {
        Self { session }
    }

    pub(super) fn select(&mut self, choice: ActivityChoice) -> Result<Phase, EngineError> {
        let ActivityBudget {
            total, remaining, ..
        } = self.session.budget;
        if self.session.forced_march_active {
            return match choice {
                ActivityChoice::Travel => Ok(Phase::Travel),
                ActivityChoice::EndDay => Ok(self.end_early()),
                _ => Err(EngineError::ForcedMarchTravelOnly),
            };
        }
        if remaining.is_zero() {
            return match choice {
                ActivityChoice::EndDay => Ok(route_to_day_end(self.session)),
                _ => Err(EngineError::InsufficientActivityPoints {
                    required: ActivityPoints::ONE,
                    remaining: ActivityPoints::ZERO,
                }),
            };
        }
        if total.is_half_day() {
            return match choice {
                ActivityChoice::SkipHalf => self.skip_half(),
                ActivityChoice::BeginHalf(kind) => self.begin_half(kind),
                ActivityChoice::EndDay => Ok(self.end_early()),
                _ => Err(EngineError::InsufficientActivityPoints {
                    required: ActivityPoints::ONE,
                    remaining,
                }),
            };
        }
        match choice {
            ActivityChoice::GroupActivity => Ok(Phase::GroupActivity),
            ActivityChoice::IndividualActivities => {
                let cost = individual_activities_cost();
                if self.session.budget.can_afford(cost) {
                    Ok(Phase::IndividualActivities)
                } else {
                    Err(EngineError::InsufficientActivityPoints {
                        required: cost,
                        remaining,
                    })
                }
            }
            ActivityChoice::EndDay => Ok(self.end_early()),
            ActivityChoice::Travel => Err(EngineError::ActivityUnavailable {
                activity: "travel".to_string(),
                reason: "choose a group activity first",
            }),
            ActivityChoice::BeginHalf(_) | ActivityChoice::SkipHalf => {
                Err(EngineError::ActivityUnavailable {
                    activity: "half activity".to_string(),
                    reason: "only offered on half-point days",
                })
            }
        }
    }

    pub(super) fn group(&mut self, choice: GroupChoice) -> Result<Phase, EngineError> {
        match choice {
            GroupChoice::Travel => Ok(Phase::Travel),
            GroupChoice::Reconnoiter => {
                if self.session.hex.is_reconnoitered {
                    return Err(EngineError::AlreadyReconnoitered);
                }
                let cost = reconnoiter_cost(&self.session.hex);
                if !self.session.budget.can_afford(cost) {
                    return Err(EngineError::InsufficientActivityPoints {
                        required: cost,
                        remaining: self.session.budget.remaining,
                    });
                }
                Ok(Phase::Reconnoiter)
            }
        }
    }

    pub(super) fn travel(&mut self, destination: &HexSetup) -> Result<Phase, EngineError> {
        let cost = travel_cost(destination);
        self.session.budget.spend(ActivityKind::Travel, cost)?;
        self.session.hex = Hex::entered(destination, self.session.ruleset);
        let text = format!(
            "Traveled to new hex: {}, {} ({}). Used {cost} activity point(s).",
            self.session.hex.terrain_type,
            self.session.hex.terrain_difficulty,
            self.session.hex.feature_labels().join(", ")
        );
        self.session.record(LOG_TRAVELED, text);
        Ok(self.after_action())
    }

    pub(super) fn reconnoiter(&mut self, hidden_features_found: bool) -> Result<Phase, EngineError> {
        if self.session.hex.is_reconnoitered {
            return Err(EngineError::AlreadyReconnoitered);
        }
        let cost = reconnoiter_cost(&self.session.hex);
        self.session.budget.spend(ActivityKind::Reconnoiter, cost)?;
        self.session.hex.is_reconnoitered = true;
        self.session.record(
            LOG_RECONNOITERED,
            format!(
                "Reconnoitered the {} hex. Used {cost} activity point(s).",
                self.session.hex.terrain_type
            ),
        );
        if hidden_features_found {
            self.session
                .record(LOG_HIDDEN_FEATURES, "Hidden features were discovered!");
        }
        Ok(self.after_action())
    }

    pub(super) fn individual(
        &mut self,
        selections: &[IndividualSelection],
    ) -> Result<Phase, EngineError> {
        let mut seen = HashSet::new();
        for selection in selections {
            let character = self
                .session
                .party
                .get(selection.character)
                .ok_or(EngineError::UnknownCharacter(selection.character))?;
            if !seen.insert(selection.character) {
                return Err(EngineError::DuplicateSelection(selection.character));
            }
            if selection.activity.is_trivial() {
                continue;
            }
            if !character.is_active() {
                return Err(EngineError::CharacterResting(selection.character));
            }
            if selection.activity.requires_reconnoitered_hex() && !self.session.hex.is_reconnoitered
            {
                return Err(EngineError::ActivityUnavailable {
                    activity: selection.activity.label().to_string(),
                    reason: "the current hex has not been reconnoitered",
                });
            }
        }
        let chosen: Vec<&IndividualSelection> = selections
            .iter()
            .filter(|selection| !selection.activity.is_trivial())
            .collect();
        if chosen.is_empty() {
            return Err(EngineError::NoIndividualActivitySelected);
        }

        self.session
            .budget
            .spend(ActivityKind::Individual, individual_activities_cost())?;

        for selection in chosen {
            let name = self
                .session
                .party
                .get(selection.character)
                .map(|character| character.name.clone())
                .unwrap_or_default();
            let degree = selection.check.map(|check| check.degree());
            let text = match (selection.check, degree) {
                (Some(check), Some(degree)) => format!(
                    "{name}: {} (total {} vs DC {}) - {degree}.",
                    selection.activity, check.total, check.dc
                ),
                _ => format!("{name}: {} (resolved manually).", selection.activity),
            };
            self.session.record(LOG_INDIVIDUAL_RESULT, text);

            let effects = effects_of(&selection.activity, degree);
            if effects.camp_fortified && !self.session.camp_fortified {
                self.session.camp_fortified = true;
                self.session
                    .record(LOG_CAMP_FORTIFIED, format!("{name} fortified the camp."));
            }
            if effects.hex_mapped && !self.session.hex.is_mapped {
                self.session.hex.is_mapped = true;
                self.session
                    .record(LOG_HEX_MAPPED, format!("{name} mapped the current hex."));
            }
            if let IndividualActivity::Other(description) = &selection.activity {
                log::debug!("free-form activity for {name}: {description}");
            }
        }
        Ok(self.after_action())
    }

    /// Leave a step before it is confirmed; nothing is refunded or undone.
    pub(super) fn back(&mut self) -> Phase {
        match self.session.phase {
            Phase::Travel if !self.session.forced_march_active => Phase::GroupActivity,
            Phase::Reconnoiter => Phase::GroupActivity,
            _ => Phase::ActivitySelection,
        }
    }

    fn skip_half(&mut self) -> Result<Phase, EngineError> {
        self.session
            .budget
            .spend(ActivityKind::HalfSkipped, ActivityPoints::HALF)?;
        self.session.record(
            LOG_HALF_SKIPPED,
            "Party forgoes its half activity point today.",
        );
        Ok(route_to_day_end(self.session))
    }

    fn begin_half(&mut self, kind: HalfActivityKind) -> Result<Phase, EngineError> {
        self.session
            .budget
            .spend(ActivityKind::HalfStarted(kind), ActivityPoints::HALF)?;
        let label = match kind {
            HalfActivityKind::Group => "group",
            HalfActivityKind::Individual => "individual",
        };
        self.session.record(
            LOG_HALF_STARTED,
            format!(
                "Party begins a {label} activity with its 1/2 point; another 1/2 point is needed tomorrow to complete it."
            ),
        );
        Ok(route_to_day_end(self.session))
    }

    fn end_early(&mut self) -> Phase {
        let remaining = self.session.budget.remaining;
        self.session.record(
            LOG_ENDED_EARLY,
            format!("Party chose to end the day early with {remaining} activity points remaining."),
        );
        route_to_day_end(self.session)
    }

    fn after_action(&mut self) -> Phase {
        if self.session.forced_march_active {
            self.session.record(
                LOG_FORCED_MARCH_COMPLETED,
                "Forced March travel completed. Proceeding to End of Day.",
            );
            route_to_day_end(self.session)
        } else if self.session.budget.remaining.is_zero() {
            route_to_day_end(self.session)
        } else {
            Phase::ActivitySelection
        }
    }
}

/// Campsite preparation, day closure and the next-day decision.
pub(super) struct NightPhase<'a> {
    session: &'a mut ExplorationSession,
}

impl<'a> NightPhase<'a> {
    pub(super) const fn new(session: &'a mut ExplorationSession) -> Self {
        Self { session }
    }

    pub(super) fn prepare_campsite(&mut self, total: i32) -> Phase {
        let dc = self.session.hex.zone_dc.unwrap_or(DEFAULT_ZONE_DC);
        let degree = flat_check(total, dc);
        self.session.today.campsite = Some(degree);
        self.session.record(
            LOG_PREPARE_CAMPSITE,
            format!("Prepare Campsite (Survival vs Zone DC {dc}): total {total} - {degree}."),
        );
        self.close_day()
    }

    /// Summary, then fatigue recovery and onset. Leaves the session waiting
    /// for the next-day decision.
    pub(super) fn close_day(&mut self) -> Phase {
        let day = self.session.day;
        let budget = &self.session.budget;
        let spent: Vec<&str> = budget.used.iter().map(|kind| kind.label()).collect();
        let summary = if spent.is_empty() {
            format!("Day {day} summary: no activity points used (of {}).", budget.total)
        } else {
            format!(
                "Day {day} summary: used {} of {} activity points ({}).",
                budget.spent(),
                budget.total,
                spent.join(", ")
            )
        };
        self.session.record(LOG_DAY_SUMMARY, summary);
        if self.session.camp_fortified {
            self.session
                .record(LOG_CAMP_STATUS, "The camp is fortified for the night.");
        }

        let forced_march_active = self.session.forced_march_active;
        let changes = fatigue::close_day(&mut self.session.party, forced_march_active);
        for change in &changes {
            match change {
                FatigueChange::Recovered { name, .. } => self.session.record(
                    LOG_FATIGUE_RECOVERED,
                    format!("{name} rested and is no longer fatigued."),
                ),
                FatigueChange::Gained {
                    name,
                    forced_march_days,
                    tolerance,
                    ..
                } => self.session.record(
                    LOG_FATIGUE_GAINED,
                    format!(
                        "{name} becomes fatigued after {} of forced march (tolerance {tolerance}).",
                        plural(*forced_march_days, "day")
                    ),
                ),
            }
        }
        self.session.today.fatigue_changes = changes;
        self.session
            .record(LOG_DAY_END, format!("--- End of Day {day} ---"));
        Phase::EndOfDay
    }

    pub(super) fn finish(&mut self, choice: DayEndChoice) -> Phase {
        match choice {
            DayEndChoice::NextDay => {
                self.session.day = self.session.day.saturating_add(1);
                self.session.budget = ActivityBudget::default();
                Phase::StartOfDay
            }
            DayEndChoice::EndExploration => {
                let day = self.session.day;
                self.session.record(
                    LOG_EXPLORATION_END,
                    format!("=== Exploration Ended After Day {day} ==="),
                );
                Phase::Terminated
            }
        }
    }
}

/// Where a finished activity period goes next: campsite preparation under
/// the extended ruleset, otherwise straight to day closure.
fn route_to_day_end(session: &mut ExplorationSession) -> Phase {
    if session.ruleset.is_kingmaker() {
        Phase::PrepareCampsite
    } else {
        NightPhase::new(session).close_day()
    }
}
