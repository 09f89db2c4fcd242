mod common;
mod logic;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use common::scenario::{get_scenario, list_scenarios};
use common::split_csv;
use logic::{GameTester, LogicTester, ScenarioResult, TesterAssets, reports};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    /// Colored summary for terminals
    Console,
    /// Pretty-printed array of scenario results
    Json,
    /// Markdown document for CI artifacts
    Markdown,
}

#[derive(Debug, Parser)]
#[command(name = "mouhitotsu-tester", version = "0.1.0")]
#[command(about = "Scripted playthroughs and invariant checks for the Mouhitotsu progression engine")]
struct Args {
    /// Scenarios to run (comma-separated, or "all")
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

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Scenario catalog JSON to play instead of the embedded story
    #[arg(long)]
    content: Option<PathBuf>,

    /// Character profile JSON to use instead of the embedded profiles
    #[arg(long)]
    characters: Option<PathBuf>,

    /// Anomaly content JSON to use instead of the embedded replacements
    #[arg(long)]
    anomaly: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.list_scenarios {
        let mut out = open_output(args.output.as_deref())?;
        write_scenario_list(&mut out)?;
        out.flush()?;
        return Ok(());
    }

    println!("{}", "🎮 Mouhitotsu Automated Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());

    let start_time = Instant::now();
    let seeds = parse_seeds(&args.seeds)?;
    let assets = TesterAssets::from_paths(
        args.content.as_deref(),
        args.characters.as_deref(),
        args.anomaly.as_deref(),
    )?;
    let logic_tester = LogicTester::new(GameTester::new(Arc::new(assets), args.verbose), args.verbose);

    let results = run_scenarios(
        &logic_tester,
        &expand_scenarios(&args.scenarios),
        &seeds,
        args.iterations,
    );

    let mut out = open_output(args.output.as_deref())?;
    write_report(&mut out, args.report, &results, start_time)?;
    out.flush()?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(stdout().lock())),
    })
}

fn write_scenario_list(out: &mut impl Write) -> Result<()> {
    writeln!(out, "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(out, "  {key:25} - {description}")?;
    }
    Ok(())
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s == "all") {
        scenarios.retain(|s| s != "all");
        for (key, _) in list_scenarios() {
            if !scenarios.iter().any(|s| s == key) {
                scenarios.push(key.to_string());
            }
        }
    }
    scenarios
}

fn parse_seeds(seeds_arg: &str) -> Result<Vec<u64>> {
    split_csv(seeds_arg)
        .iter()
        .map(|s| {
            s.parse::<u64>()
                .with_context(|| format!("invalid seed '{s}'"))
        })
        .collect()
}

fn run_scenarios(
    logic_tester: &LogicTester,
    scenarios: &[String],
    seeds: &[u64],
    iterations: usize,
) -> Vec<ScenarioResult> {
    println!("{}", "🧠 Running Logic Tests".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let mut results = Vec::new();
    for scenario_name in scenarios {
        match get_scenario(scenario_name) {
            Some(scenario) => results.extend(logic_tester.run_scenario(&scenario, seeds, iterations)),
            None => eprintln!("⚠️  Unknown scenario: {}", scenario_name.yellow()),
        }
    }
    results
}

fn write_report(
    out: &mut impl Write,
    format: ReportFormat,
    results: &[ScenarioResult],
    start_time: Instant,
) -> Result<()> {
    match format {
        ReportFormat::Json => reports::generate_json_report(out, results),
        ReportFormat::Markdown => reports::generate_markdown_report(out, results),
        ReportFormat::Console => {
            reports::generate_console_report(out, results, start_time.elapsed())?;
            writeln!(out, "\n🏁 Total time: {:?}", start_time.elapsed())?;
            Ok(())
        }
    }
}
