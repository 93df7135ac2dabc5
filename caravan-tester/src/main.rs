mod logic;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use logic::{DrivingStrategy, LogicTester, RunPlan, ScenarioResult, SeedInfo, resolve_seed_inputs};

#[derive(Debug, Parser)]
#[command(name = "caravan-tester", version = "0.1.0")]
#[command(about = "Headless autopilot sweeps for the Caravan simulation core")]
struct Args {
    /// Driving policies to run (comma-separated, or `all`)
    #[arg(long, default_value = "balanced")]
    policies: String,

    /// List all available policies and exit
    #[arg(long)]
    list_policies: bool,

    /// Seeds to run (comma-separated numbers or CV- share codes, or `all`)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per policy and seed
    #[arg(long, default_value_t = 3)]
    iterations: usize,

    /// Legs to drive before retiring at the haven
    #[arg(long, default_value_t = 2)]
    legs: u32,

    /// Loop steps before a run is recorded as unfinished
    #[arg(long, default_value_t = 40_000)]
    max_steps: u64,

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

    /// Simulation config JSON to use instead of the defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Encounter catalog JSON to use instead of the bundled one
    #[arg(long)]
    catalog: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_policies(&args)? {
        return Ok(());
    }

    if args.report != "json" || args.output.is_some() {
        announce_banner();
    }

    let start_time = Instant::now();
    let strategies = expand_policies(&args.policies)?;
    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let plan = RunPlan::bundled(args.legs, args.max_steps)
        .with_overrides(args.config.as_deref(), args.catalog.as_deref())?;
    let tester = LogicTester::new(plan, args.verbose);

    let results = run_sweep(&tester, &strategies, &seeds, args.iterations);
    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_policies(args: &Args) -> Result<bool> {
    if !args.list_policies {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available policies:")?;
    for strategy in DrivingStrategy::ALL {
        writeln!(
            output_target.writer(),
            "  {:12} - {}",
            strategy.key(),
            strategy.description()
        )?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🐪 Caravan Autopilot Tester".bright_cyan().bold());
    println!("{}", "===========================".cyan());
}

fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

fn expand_policies(policies_arg: &str) -> Result<Vec<DrivingStrategy>> {
    let mut strategies = Vec::new();
    for token in split_csv(policies_arg) {
        if token.eq_ignore_ascii_case("all") {
            strategies.extend(DrivingStrategy::ALL);
            continue;
        }
        let Some(strategy) = DrivingStrategy::from_key(&token) else {
            bail!("Unknown policy: {token} (try --list-policies)");
        };
        strategies.push(strategy);
    }
    let mut seen = Vec::new();
    strategies.retain(|strategy| {
        if seen.contains(strategy) {
            false
        } else {
            seen.push(*strategy);
            true
        }
    });
    Ok(strategies)
}

fn run_sweep(
    tester: &LogicTester,
    strategies: &[DrivingStrategy],
    seeds: &[SeedInfo],
    iterations: usize,
) -> Vec<ScenarioResult> {
    strategies
        .iter()
        .flat_map(|&strategy| {
            log::info!(
                "running {} across {} seeds x {iterations}",
                strategy,
                seeds.len()
            );
            tester.run_strategy(strategy, seeds, iterations)
        })
        .collect()
}

fn write_reports(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => {
            logic::reports::generate_json_report(&mut output_target, results)?;
        }
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Caravan Autopilot Results\n\n_No scenarios executed._"
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
            writeln!(&mut output_target)?;
            writeln!(
                &mut output_target,
                "🏁 Total time: {:?}",
                start_time.elapsed()
            )?;
        }
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
