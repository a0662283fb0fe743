mod logic;
mod plan;
mod scenarios;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use logic::{GameplayStrategy, LogicTester, ScenarioResult, TestScenario};
use plan::ExpeditionPlan;
use scenarios::{expand_scenarios, get_scenario, list_scenarios, plan_scenario};

#[derive(Debug, Parser)]
#[command(name = "hexploration-tester", version)]
#[command(about = "Plays automated expeditions through the hexploration day cycle and checks its rules")]
struct Args {
    /// Scenarios to run (comma-separated, or `all`)
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Override the number of days every expedition runs
    #[arg(long)]
    days: Option<u32>,

    /// Run an expedition plan from a JSON file instead of the catalog
    #[arg(long)]
    plan: Option<PathBuf>,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let seeds = parse_seeds(&args.seeds)?;
    let scenarios = resolve_scenarios(&args)?;
    let tester = LogicTester::new(args.verbose);

    println!("{}", "🧭 Running Expeditions".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let mut results: Vec<ScenarioResult> = Vec::new();
    for scenario in &scenarios {
        results.extend(tester.run_scenario(scenario, &seeds, args.iterations));
    }

    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:15} - {description}")?;
    }
    let strategies: Vec<&str> = GameplayStrategy::ALL.iter().map(|s| s.label()).collect();
    writeln!(output_target.writer(), "Strategies: {}", strategies.join(", "))?;
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🗺️  Hexploration Automated Tester".bright_cyan().bold());
    println!("{}", "=================================".cyan());
}

fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

fn parse_seeds(arg: &str) -> Result<Vec<u64>> {
    let seeds = split_csv(arg)
        .iter()
        .map(|token| {
            token
                .parse::<u64>()
                .with_context(|| format!("invalid seed {token:?}"))
        })
        .collect::<Result<Vec<_>>>()?;
    anyhow::ensure!(!seeds.is_empty(), "at least one seed is required");
    Ok(seeds)
}

fn resolve_scenarios(args: &Args) -> Result<Vec<TestScenario>> {
    let mut scenarios = Vec::new();
    if let Some(path) = &args.plan {
        let plan = ExpeditionPlan::load(path)?;
        scenarios.push(plan_scenario(plan));
    } else {
        for name in expand_scenarios(&split_csv(&args.scenarios)) {
            match get_scenario(&name) {
                Some(scenario) => scenarios.push(scenario),
                None => eprintln!("⚠️  Unknown scenario: {}", name.yellow()),
            }
        }
    }
    if let Some(days) = args.days {
        anyhow::ensure!(days > 0, "--days must be at least 1");
        for scenario in &mut scenarios {
            scenario.plan.days = days;
        }
    }
    Ok(scenarios)
}

fn write_reports(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => logic::reports::generate_json_report(&mut output_target, results)?,
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Hexploration Expedition Test Results\n\n_No scenarios executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        _ => {
            if results.is_empty() {
                writeln!(&mut output_target, "No scenarios executed.")?;
            } else {
                logic::reports::generate_console_report(
                    &mut output_target,
                    results,
                    start_time.elapsed(),
                )?;
            }
        }
    }

    if args.report != "json" {
        let duration = start_time.elapsed();
        writeln!(&mut output_target)?;
        writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
    }
    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args {
            scenarios: "smoke".to_string(),
            list_scenarios: false,
            seeds: "1337".to_string(),
            iterations: 1,
            days: None,
            plan: None,
            report: "json".to_string(),
            verbose: false,
            output: None,
        }
    }

    #[test]
    fn split_csv_trims_and_filters() {
        assert_eq!(split_csv(" alpha, ,beta,  gamma "), vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn seeds_must_be_numeric() {
        assert_eq!(parse_seeds("1, 2,3").unwrap(), vec![1, 2, 3]);
        assert!(parse_seeds("abc").is_err());
        assert!(parse_seeds(" , ").is_err());
    }

    #[test]
    fn days_override_applies_to_every_scenario() {
        let mut args = base_args();
        args.scenarios = "smoke,kingmaker,bogus".to_string();
        args.days = Some(2);
        let scenarios = resolve_scenarios(&args).unwrap();
        assert_eq!(scenarios.len(), 2);
        assert!(scenarios.iter().all(|s| s.plan.days == 2));
    }

    #[test]
    fn zero_days_is_rejected() {
        let mut args = base_args();
        args.days = Some(0);
        assert!(resolve_scenarios(&args).is_err());
    }
}
