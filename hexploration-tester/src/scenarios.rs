//! Built-in scenario catalog.
use anyhow::{Result, ensure};
use hexploration_core::{HexSetup, RosterEntry, Ruleset, TerrainDifficulty, TerrainType};

use crate::logic::{GameplayStrategy, Simulation, SimulationSummary, TestScenario};
use crate::plan::ExpeditionPlan;

const CATALOG: [(&str, &str); 7] = [
    ("smoke", "Cautious party crosses open plains for three days"),
    ("forced-march", "Trailblazers march until fatigue sets in, then recover"),
    ("survey", "Surveyors reconnoiter and map every hex they enter"),
    ("half-day", "A party slowed to 10 ft spends its half points"),
    ("kingmaker", "Extended ruleset with weather and campsite steps"),
    ("wanderer", "Random choices among offered actions over a long trek"),
    ("determinism", "Replays each seed twice and compares log digests"),
];

#[must_use]
pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    CATALOG.to_vec()
}

/// Expand `all` into every catalog key, keeping other names in order.
#[must_use]
pub fn expand_scenarios(names: &[String]) -> Vec<String> {
    let mut expanded: Vec<String> = names.iter().filter(|n| *n != "all").cloned().collect();
    if names.iter().any(|n| n == "all") {
        for (key, _) in CATALOG {
            if !expanded.iter().any(|n| n == key) {
                expanded.push(key.to_string());
            }
        }
    }
    expanded
}

#[must_use]
pub fn get_scenario(key: &str) -> Option<TestScenario> {
    let scenario = match key {
        "smoke" => TestScenario::new(key, ExpeditionPlan::named(key).with_days(3))
            .with_expectation(completes_all_days),
        "forced-march" => TestScenario::new(
            key,
            ExpeditionPlan::named(key)
                .with_roster(vec![
                    RosterEntry::new("Valeros", 30, 1),
                    RosterEntry::new("Seelah", 30, 2),
                ])
                .with_strategy(GameplayStrategy::Trailblazer)
                .with_days(6),
        )
        .with_expectation(completes_all_days)
        .with_expectation(fatigue_follows_marching),
        "survey" => TestScenario::new(
            key,
            ExpeditionPlan::named(key)
                .with_start(
                    HexSetup::new(TerrainType::Forest, TerrainDifficulty::Difficult)
                        .with_river(true),
                )
                .with_strategy(GameplayStrategy::Surveyor)
                .with_days(6),
        )
        .with_expectation(completes_all_days)
        .with_expectation(maps_something),
        "half-day" => TestScenario::new(
            key,
            ExpeditionPlan::named(key)
                .with_roster(vec![
                    RosterEntry::new("Harsk", 10, 3),
                    RosterEntry::new("Lem", 30, 0),
                ])
                .with_strategy(GameplayStrategy::Trailblazer)
                .with_days(4),
        )
        .with_expectation(completes_all_days),
        "kingmaker" => TestScenario::new(
            key,
            ExpeditionPlan::named(key)
                .with_start(
                    HexSetup::new(TerrainType::Swamp, TerrainDifficulty::Open).with_zone(20, 15),
                )
                .with_ruleset(Ruleset::Kingmaker)
                .with_strategy(GameplayStrategy::Surveyor),
        )
        .with_expectation(completes_all_days),
        "wanderer" => TestScenario::new(
            key,
            ExpeditionPlan::named(key)
                .with_strategy(GameplayStrategy::Wanderer)
                .with_days(10),
        )
        .with_expectation(completes_all_days),
        "determinism" => TestScenario::new(
            key,
            ExpeditionPlan::named(key)
                .with_ruleset(Ruleset::Kingmaker)
                .with_strategy(GameplayStrategy::Wanderer),
        )
        .with_expectation(replays_identically),
        _ => return None,
    };
    Some(scenario)
}

/// Scenario for a caller-supplied plan file.
#[must_use]
pub fn plan_scenario(plan: ExpeditionPlan) -> TestScenario {
    TestScenario::new(format!("plan:{}", plan.name), plan).with_expectation(completes_all_days)
}

fn completes_all_days(summary: &SimulationSummary) -> Result<()> {
    ensure!(summary.terminated, "run did not reach the end of exploration");
    let planned = summary
        .final_session
        .as_ref()
        .map_or(0, |session| session.day);
    ensure!(
        summary.days_completed == planned,
        "completed {} days but the session ended on day {planned}",
        summary.days_completed
    );
    Ok(())
}

fn fatigue_follows_marching(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.forced_march_days > 0,
        "trailblazers never took a forced march"
    );
    ensure!(
        summary.fatigue_onsets > 0,
        "{} forced-march days produced no fatigue",
        summary.forced_march_days
    );
    Ok(())
}

fn maps_something(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.hexes_reconnoitered > 0,
        "surveyors never reconnoitered"
    );
    Ok(())
}

fn replays_identically(summary: &SimulationSummary) -> Result<()> {
    let plan = ExpeditionPlan::named("determinism")
        .with_ruleset(Ruleset::Kingmaker)
        .with_strategy(GameplayStrategy::Wanderer)
        .with_days(summary.days_completed.max(1));
    let replay = Simulation::new(&plan, summary.seed, false).run()?;
    ensure!(
        replay.log_digest == summary.log_digest,
        "seed {} replayed to digest {:#x}, expected {:#x}",
        summary.seed,
        replay.log_digest,
        summary.log_digest
    );
    Ok(())
}
