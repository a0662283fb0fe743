use anyhow::Result;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::logic::simulation::{Simulation, SimulationSummary};
use crate::plan::ExpeditionPlan;

/// Assertion hook run after a simulation completes.
type ExpectationFn = Arc<dyn Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct Expectation(ExpectationFn);

impl std::fmt::Debug for Expectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Expectation").finish()
    }
}

impl Expectation {
    #[must_use]
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    fn evaluate(&self, summary: &SimulationSummary) -> Result<()> {
        (self.0)(summary)
    }
}

/// A named expedition plus the checks its runs must satisfy.
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub key: String,
    pub plan: ExpeditionPlan,
    pub expectations: Vec<Expectation>,
}

impl TestScenario {
    #[must_use]
    pub fn new(key: impl Into<String>, plan: ExpeditionPlan) -> Self {
        Self {
            key: key.into(),
            plan,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_expectation<F>(mut self, expectation: F) -> Self
    where
        F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
    {
        self.expectations.push(Expectation::new(expectation));
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    /// Summaries of the successful iterations, in order.
    pub runs: Vec<SimulationSummary>,
}

pub struct LogicTester {
    verbose: bool,
}

impl LogicTester {
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        seeds
            .iter()
            .map(|&seed| {
                if self.verbose {
                    println!(
                        "🧪 Testing scenario: {} (ruleset: {:?} strategy: {} seed: {})",
                        scenario.key.bright_white(),
                        scenario.plan.ruleset,
                        scenario.plan.strategy,
                        seed
                    );
                }
                self.run_single_scenario(scenario, seed, iterations)
            })
            .collect()
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let mut failures = Vec::new();
        let mut runs = Vec::new();
        let mut durations = Vec::new();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
            let outcome = Simulation::new(&scenario.plan, iteration_seed, self.verbose)
                .run()
                .and_then(|summary| {
                    evaluate_expectations(scenario, &summary)?;
                    Ok(summary)
                });
            match outcome {
                Ok(summary) => {
                    let duration = start_time.elapsed();
                    durations.push(duration);
                    if self.verbose {
                        println!(
                            "  ✅ Iteration {}/{} passed ({duration:?}) days:{} hexes:{} encounters:{}",
                            i + 1,
                            iterations,
                            summary.days_completed,
                            summary.hexes_traveled,
                            summary.encounters
                        );
                    }
                    runs.push(summary);
                }
                Err(err) => {
                    let message = format!(
                        "Iteration {} (strategy {}, seed {iteration_seed}): {err:#}",
                        i + 1,
                        scenario.plan.strategy
                    );
                    if self.verbose {
                        println!("  ❌ {}", message.clone().red());
                    }
                    failures.push(message);
                }
            }
        }

        let average_duration = if durations.is_empty() {
            Duration::ZERO
        } else {
            durations.iter().sum::<Duration>() / u32::try_from(durations.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.key.clone(),
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: runs.len(),
            failures,
            average_duration,
            runs,
        }
    }
}

fn evaluate_expectations(scenario: &TestScenario, summary: &SimulationSummary) -> Result<()> {
    anyhow::ensure!(
        summary.invariant_violations.is_empty(),
        "invariant violations: {}",
        summary.invariant_violations.join("; ")
    );
    for expectation in &scenario.expectations {
        expectation.evaluate(summary)?;
    }
    Ok(())
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failing_expectation_is_reported() {
        let scenario = TestScenario::new("always-fails", ExpeditionPlan::named("x").with_days(1))
            .with_expectation(|_: &SimulationSummary| -> Result<()> { anyhow::bail!("nope") });
        let results = LogicTester::new(false).run_scenario(&scenario, &[1, 2], 2);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| !r.passed));
        assert!(results[0].failures[0].contains("nope"));
        assert_eq!(results[0].successful_iterations, 0);
    }

    #[test]
    fn passing_runs_keep_summaries() {
        let scenario = TestScenario::new("passes", ExpeditionPlan::named("x").with_days(2));
        let results = LogicTester::new(false).run_scenario(&scenario, &[5], 3);
        assert!(results[0].passed);
        assert_eq!(results[0].runs.len(), 3);
        assert_eq!(results[0].runs[1].seed, 6);
    }
}
