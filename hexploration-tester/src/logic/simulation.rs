//! Drives a [`DayCycleEngine`] through an expedition with seeded dice.
//!
//! The engine never rolls; this runner plays the table, supplying d20/d10
//! results, check totals and destinations from a `ChaCha20Rng`.

use std::hash::Hasher;

use anyhow::{Context, Result};
use hexploration_core::{
    ActivityChoice, ActivityPoints, DayCycleEngine, DayEndChoice, DayLogEntry, EngineError, ExplorationSession,
    FatigueChange, HexSetup, IndividualSelection, InputKind, Phase, PhaseInput, RestDecision,
    TerrainDifficulty, TerrainType,
};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use twox_hash::XxHash64;

use crate::logic::policy::DecisionPolicy;
use crate::plan::ExpeditionPlan;

/// Steps allowed per planned day before a run is declared stuck.
const STEP_LIMIT_PER_DAY: u32 = 96;
/// Flat bonus added to d20 check totals for the automated party.
const CHECK_BONUS: i32 = 6;
const ROAD_CHANCE: f64 = 0.2;
const RIVER_CHANCE: f64 = 0.25;

/// Outcome of one simulated expedition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub plan: String,
    pub strategy: String,
    pub seed: u64,
    pub days_completed: u32,
    pub terminated: bool,
    pub steps: u32,
    pub hexes_traveled: u32,
    pub hexes_reconnoitered: u32,
    pub hexes_mapped: u32,
    pub encounters: u32,
    pub forced_march_days: u32,
    pub fatigue_onsets: u32,
    pub recoveries: u32,
    pub rejected_inputs: u32,
    pub log_entries: usize,
    /// `XxHash64` of the serialized day log; equal seeds give equal digests.
    pub log_digest: u64,
    pub invariant_violations: Vec<String>,
    #[serde(skip)]
    pub final_session: Option<ExplorationSession>,
}

impl SimulationSummary {
    fn new(plan: &ExpeditionPlan, seed: u64) -> Self {
        Self {
            plan: plan.name.clone(),
            strategy: plan.strategy.label().to_string(),
            seed,
            days_completed: 0,
            terminated: false,
            steps: 0,
            hexes_traveled: 0,
            hexes_reconnoitered: 0,
            hexes_mapped: 0,
            encounters: 0,
            forced_march_days: 0,
            fatigue_onsets: 0,
            recoveries: 0,
            rejected_inputs: 0,
            log_entries: 0,
            log_digest: 0,
            invariant_violations: Vec::new(),
            final_session: None,
        }
    }
}

/// Seeded table: dice, checks and destination hexes.
struct Table {
    rng: ChaCha20Rng,
}

impl Table {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    fn d20(&mut self) -> i32 {
        self.rng.gen_range(1..=20)
    }

    fn d10(&mut self) -> i32 {
        self.rng.gen_range(1..=10)
    }

    fn check(&mut self) -> i32 {
        self.d20() + CHECK_BONUS
    }

    fn destination(&mut self) -> HexSetup {
        let terrain = TerrainType::ALL
            .choose(&mut self.rng)
            .copied()
            .unwrap_or_default();
        let difficulty = [
            TerrainDifficulty::Open,
            TerrainDifficulty::Open,
            TerrainDifficulty::Difficult,
            TerrainDifficulty::GreaterDifficult,
        ]
        .choose(&mut self.rng)
        .copied()
        .unwrap_or_default();
        HexSetup::new(terrain, difficulty)
            .with_road(self.rng.gen_bool(ROAD_CHANCE))
            .with_river(self.rng.gen_bool(RIVER_CHANCE))
    }
}

pub struct Simulation<'a> {
    plan: &'a ExpeditionPlan,
    policy: Box<dyn DecisionPolicy + Send>,
    table: Table,
    summary: SimulationSummary,
    verbose: bool,
}

impl<'a> Simulation<'a> {
    #[must_use]
    pub fn new(plan: &'a ExpeditionPlan, seed: u64, verbose: bool) -> Self {
        Self {
            plan,
            policy: plan.strategy.create_policy(seed),
            table: Table::new(seed),
            summary: SimulationSummary::new(plan, seed),
            verbose,
        }
    }

    /// Play the plan to completion.
    ///
    /// # Errors
    ///
    /// Returns an error when the engine refuses to start, rejects an input
    /// the runner has no fallback for, or the run exceeds its step budget.
    pub fn run(mut self) -> Result<SimulationSummary> {
        let mut engine = DayCycleEngine::start(&self.plan.roster, &self.plan.start, self.plan.ruleset)
            .with_context(|| format!("starting plan {}", self.plan.name))?;
        let step_limit = self.plan.days.saturating_mul(STEP_LIMIT_PER_DAY);
        log::info!(
            "plan {} seed {} with {} policy",
            self.plan.name,
            self.summary.seed,
            self.policy.name()
        );

        while engine.phase() != Phase::Terminated {
            anyhow::ensure!(
                self.summary.steps < step_limit,
                "plan {} exceeded {step_limit} steps on day {}",
                self.plan.name,
                engine.session().day
            );
            self.summary.steps += 1;
            let input = self.decide(&engine);
            let log_before = engine.log().len();
            let before = engine.session().clone();
            match engine.advance(input.clone()) {
                Ok(transition) => {
                    log::debug!(
                        "{} day {}: {} -> {}",
                        self.plan.name,
                        engine.session().day,
                        transition.from,
                        transition.phase
                    );
                    self.observe(&before, engine.session(), &transition.emitted);
                    self.check_invariants(&before, &engine, log_before);
                }
                Err(err) => self.recover(&mut engine, &input, &err)?,
            }
        }

        let session = engine.into_session();
        self.summary.terminated = session.is_terminated();
        self.summary.log_entries = session.log.len();
        self.summary.log_digest = log_digest(session.log.entries())?;
        self.summary.final_session = Some(session);
        Ok(self.summary)
    }

    fn decide(&mut self, engine: &DayCycleEngine) -> PhaseInput {
        let view = engine.view();
        match view.expected_input {
            InputKind::Continue | InputKind::Nothing => PhaseInput::Continue,
            InputKind::RestDecisions => PhaseInput::Rest(
                view.characters
                    .iter()
                    .filter(|c| c.is_fatigued)
                    .map(|c| RestDecision {
                        character: c.id,
                        rest: self.policy.rest(c),
                    })
                    .collect(),
            ),
            InputKind::ForcedMarchDecision => PhaseInput::ForcedMarch(self.policy.forced_march(&view)),
            InputKind::Roll => PhaseInput::Roll(self.table.d20()),
            InputKind::EncounterRoll => PhaseInput::Encounter {
                roll: self.table.d20(),
                type_rolls: vec![self.table.d10(), self.table.d10()],
            },
            InputKind::ActivityChoice => PhaseInput::Activity(self.policy.activity(&view)),
            InputKind::GroupChoice => PhaseInput::Group(self.policy.group(&view)),
            InputKind::Destination => PhaseInput::Travel(self.table.destination()),
            InputKind::ReconnoiterResult => PhaseInput::Reconnoiter {
                hidden_features_found: self.table.d20() >= 15,
            },
            InputKind::IndividualSelections => PhaseInput::Individual(
                self.policy
                    .individual(&view)
                    .into_iter()
                    .map(|(character, activity)| {
                        let total = self.table.check();
                        IndividualSelection::new(character, activity).with_check(total, 15)
                    })
                    .collect(),
            ),
            InputKind::CheckTotal => PhaseInput::CheckTotal(self.table.check()),
            InputKind::DayEndChoice => {
                if engine.session().day >= self.plan.days {
                    PhaseInput::EndOfDay(DayEndChoice::EndExploration)
                } else {
                    PhaseInput::EndOfDay(DayEndChoice::NextDay)
                }
            }
        }
    }

    /// Rejections are part of normal play: back out or end the day.
    fn recover(
        &mut self,
        engine: &mut DayCycleEngine,
        input: &PhaseInput,
        err: &EngineError,
    ) -> Result<()> {
        self.summary.rejected_inputs += 1;
        if self.verbose {
            println!("  ↩ day {} {}: {err}", engine.session().day, engine.phase());
        }
        let fallback = match (engine.phase(), err) {
            (Phase::Travel | Phase::Reconnoiter | Phase::IndividualActivities | Phase::GroupActivity, _) => {
                PhaseInput::Back
            }
            (Phase::ActivitySelection, _) => PhaseInput::Activity(ActivityChoice::EndDay),
            (Phase::ForcedMarchOption, EngineError::ForcedMarchUnavailable) => {
                PhaseInput::ForcedMarch(false)
            }
            (Phase::FatigueCheck, _) => PhaseInput::Continue,
            _ => anyhow::bail!(
                "no fallback for rejected {input:?} in {}: {err}",
                engine.phase()
            ),
        };
        let log_before = engine.log().len();
        let before = engine.session().clone();
        let transition = engine
            .advance(fallback)
            .with_context(|| format!("fallback after {err}"))?;
        self.observe(&before, engine.session(), &transition.emitted);
        self.check_invariants(&before, engine, log_before);
        Ok(())
    }

    fn observe(
        &mut self,
        before: &ExplorationSession,
        after: &ExplorationSession,
        emitted: &[DayLogEntry],
    ) {
        let summary = &mut self.summary;
        if before.phase == Phase::Travel && after.budget.used.len() > before.budget.used.len() {
            summary.hexes_traveled += 1;
        }
        if after.hex.is_reconnoitered && !before.hex.is_reconnoitered {
            summary.hexes_reconnoitered += 1;
        }
        if after.hex.is_mapped && !before.hex.is_mapped {
            summary.hexes_mapped += 1;
        }
        if after.forced_march_active && !before.forced_march_active {
            summary.forced_march_days += 1;
        }
        if before.phase == Phase::RandomEncounter {
            summary.encounters += u32::from(after.today.encounters_today());
        }
        if after.phase == Phase::EndOfDay && before.phase != Phase::EndOfDay {
            summary.days_completed += 1;
            for change in &after.today.fatigue_changes {
                match change {
                    FatigueChange::Gained { .. } => summary.fatigue_onsets += 1,
                    FatigueChange::Recovered { .. } => summary.recoveries += 1,
                }
            }
        }
        if self.verbose {
            for entry in emitted {
                println!("    [{}] {}", entry.stamp.day, entry.text);
            }
        }
    }

    fn check_invariants(
        &mut self,
        before: &ExplorationSession,
        engine: &DayCycleEngine,
        log_before: usize,
    ) {
        let session = engine.session();
        let budget = &session.budget;
        let day = session.day;
        let mut violations = Vec::new();
        if budget.remaining > budget.total {
            violations.push(format!(
                "day {day}: remaining {} exceeds total {}",
                budget.remaining, budget.total
            ));
        }
        if budget.spent().saturating_add(budget.remaining) != budget.total {
            violations.push(format!(
                "day {day}: spent {} + remaining {} != total {}",
                budget.spent(),
                budget.remaining,
                budget.total
            ));
        }
        if session.log.entries().get(..log_before) != before.log.entries().get(..log_before) {
            violations.push(format!("day {day}: log prefix was rewritten"));
        }
        if session.forced_march_active && budget.total > ActivityPoints::ONE {
            violations.push(format!("day {day}: forced march budget above one point"));
        }
        if session.phase == Phase::ActivitySelection {
            for character in session.party.iter() {
                if character.will_rest_today && !character.is_fatigued {
                    violations.push(format!("day {day}: {} rests without fatigue", character.name));
                }
            }
        }
        for violation in &violations {
            log::error!("{}: {violation}", self.plan.name);
        }
        self.summary.invariant_violations.extend(violations);
    }
}

fn log_digest(entries: &[DayLogEntry]) -> Result<u64> {
    let bytes = serde_json::to_vec(entries).context("serializing day log")?;
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(&bytes);
    Ok(hasher.finish())
}
