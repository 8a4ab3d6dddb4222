//! CLI entrypoint for etiss-sweep.
//!
//! - `run`      expand the axes, execute every combination, persist results
//! - `compare`  derive overhead/improvement between persisted result sets
//! - `profiles` list the names in both configuration stores
//!
//! The sweep environment is loaded once here and handed down by reference.
//! Ctrl-C stops after the current run; collected records are still flushed.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::builder::PossibleValuesParser;
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use etiss_sweep::compare::{compare_aggregates, render_table, Direction, Metric};
use etiss_sweep::env::SweepEnv;
use etiss_sweep::executor::{ProcessSimulator, RunExecutor};
use etiss_sweep::experiment::{AggregateResult, ExperimentRecord, ResultAggregator, ResultLayout};
use etiss_sweep::profile::{Resolver, StoreKind};
use etiss_sweep::sweep::{
    run_sweep, Axis, AxisSet, OptLevels, DEFAULT_OPT_LEVEL, GCC_OPT_LEVELS, LLVM_OPT_LEVELS,
};
use etiss_sweep::toolchain::Toolchain;

/// Exit status after a user interrupt.
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Debug, Parser)]
#[command(
    name = "etiss-sweep",
    about = "Benchmark-sweep orchestrator for ETISS JIT experiments",
    version
)]
struct Cli {
    /// Environment file with KEY=VALUE lines (ETISS_ROOT, EXAMPLES_ROOT, ...).
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    /// Verbosity: -v, -vv
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run every combination of the given axes.
    Run(RunArgs),
    /// Compare durations between two persisted result sets.
    Compare(CompareArgs),
    /// List available build profiles and ETISS variants.
    Profiles,
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Programs to run.
    #[arg(long, num_args = 1.., default_value = "hello_world")]
    programs: Vec<String>,

    /// Program build profile(s).
    #[arg(long = "profile", num_args = 1.., default_value = "default")]
    profiles: Vec<String>,

    /// ETISS build variant(s), with or without the `etiss_` prefix.
    #[arg(long = "etiss-variant", alias = "variant", num_args = 1.., default_value = "default")]
    variants: Vec<String>,

    /// JIT backends (GCC, TCC, LLVM).
    #[arg(long, num_args = 1.., default_value = "TCC")]
    jits: Vec<String>,

    /// Block sizes.
    #[arg(long, num_args = 1.., default_value = "100")]
    block_sizes: Vec<String>,

    /// Fast JIT backends for tiered compilation; `None` runs without one.
    #[arg(long, num_args = 1..)]
    fast_jits: Vec<String>,

    /// Background optimization thread counts.
    #[arg(long, num_args = 1..)]
    optimization_threads: Vec<String>,

    /// GCC JIT optimization level.
    #[arg(
        long,
        default_value = DEFAULT_OPT_LEVEL,
        value_parser = PossibleValuesParser::new(GCC_OPT_LEVELS.iter().copied())
    )]
    gcc_opt_level: String,

    /// LLVM JIT optimization level.
    #[arg(
        long,
        default_value = DEFAULT_OPT_LEVEL,
        value_parser = PossibleValuesParser::new(LLVM_OPT_LEVELS.iter().copied())
    )]
    llvm_opt_level: String,

    /// Do not ask the simulator for JIT statistics.
    #[arg(long)]
    no_stats: bool,

    /// Rebuild programs before running.
    #[arg(long)]
    rebuild: bool,

    /// Rebuild ETISS variants before running.
    #[arg(long)]
    rebuild_etiss: bool,

    /// Output file for the aggregate result (overrides the per-experiment path).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Experiment name; namespaces persisted results.
    #[arg(long)]
    experiment_name: Option<String>,
}

#[derive(Debug, Args)]
struct CompareArgs {
    /// Aggregate result for side A (with-feature / old).
    a: PathBuf,

    /// Aggregate result for side B (without-feature / new). Defaults to A.
    b: Option<PathBuf>,

    /// Select side-A records, e.g. `variant=stats`.
    #[arg(long = "a-filter", value_parser = parse_filter)]
    a_filter: Vec<(Axis, String)>,

    /// Select side-B records, e.g. `variant=nostats`.
    #[arg(long = "b-filter", value_parser = parse_filter)]
    b_filter: Vec<(Axis, String)>,

    /// Axes that must agree for two records to be paired.
    #[arg(long = "match", value_delimiter = ',', required = true)]
    matching: Vec<Axis>,

    /// overhead: (a-b)/b, improvement: (a-b)/a.
    #[arg(long, default_value = "overhead")]
    direction: Direction,

    /// Print rows as JSON instead of a table.
    #[arg(long)]
    json: bool,
}

fn parse_filter(s: &str) -> std::result::Result<(Axis, String), String> {
    let (axis, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected axis=value, got '{s}'"))?;
    let axis = axis.parse::<Axis>().map_err(|e| e.to_string())?;
    Ok((axis, value.to_string()))
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match dispatch(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn dispatch(cli: Cli) -> Result<ExitCode> {
    let base = std::env::current_dir().context("cannot determine working directory")?;
    let env = SweepEnv::load(cli.env_file.as_deref(), &base)?;

    match cli.command {
        Command::Run(args) => run(&env, args),
        Command::Compare(args) => compare(&args),
        Command::Profiles => profiles(&env),
    }
}

fn run(env: &SweepEnv, args: RunArgs) -> Result<ExitCode> {
    let resolver = Resolver::load(env).context("cannot load configuration stores")?;
    let opt_levels = OptLevels::new(args.gcc_opt_level, args.llvm_opt_level)?;

    let mut axes = AxisSet::new()
        .with_axis(Axis::Variant, args.variants)
        .with_axis(Axis::Profile, args.profiles)
        .with_axis(Axis::Program, args.programs)
        .with_axis(Axis::Jit, args.jits);
    if !args.fast_jits.is_empty() {
        axes = axes.with_axis(Axis::FastJit, args.fast_jits);
    }
    if !args.optimization_threads.is_empty() {
        axes = axes.with_axis(Axis::OptimizationThreads, args.optimization_threads);
    }
    let axes = axes
        .with_axis(Axis::BlockSize, args.block_sizes)
        .normalized()
        .context("invalid sweep axes")?;
    axes.require(&Axis::REQUIRED)?;
    let combinations = axes.expand()?;

    let toolchain = Toolchain::new(env);
    let values = |axis: Axis| axes.values(axis).unwrap_or_default();
    if args.rebuild_etiss {
        for variant in values(Axis::Variant) {
            toolchain.build_variant(variant, true)?;
        }
    }
    if args.rebuild {
        for profile in values(Axis::Profile) {
            for program in values(Axis::Program) {
                toolchain.build_program(profile, program, true)?;
            }
        }
    }

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        if let Err(e) = ctrlc::set_handler(move || cancel.store(true, Ordering::SeqCst)) {
            warn!(error = %e, "could not install interrupt handler");
        }
    }

    let scratch = tempfile::TempDir::new().context("cannot create scratch directory")?;
    let mut executor = RunExecutor::new(env, &resolver, ProcessSimulator)
        .with_opt_levels(opt_levels.clone())
        .with_cancel_flag(Arc::clone(&cancel));
    if !args.no_stats {
        executor = executor.with_stats_dir(scratch.path());
    }

    let experiment = ExperimentRecord::builder(args.experiment_name.unwrap_or_default(), axes)
        .opt_levels(opt_levels)
        .build();
    info!(
        experiment = experiment.name(),
        total = experiment.total_combinations(),
        "starting sweep"
    );
    let mut aggregator = ResultAggregator::new(experiment, ResultLayout::from_env(env, args.output));

    let summary = run_sweep(&combinations, &executor, &mut aggregator);
    let path = aggregator.flush().context("cannot persist results")?;

    println!("{}", "=".repeat(60));
    println!(
        "Completed {} of {} runs ({} ok, {} failed, {} cancelled)",
        summary.attempted, summary.total, summary.succeeded, summary.failed, summary.cancelled
    );
    println!("Results saved to: {}", path.display());
    println!("{}", "=".repeat(60));

    if cancel.load(Ordering::SeqCst) {
        return Ok(ExitCode::from(EXIT_INTERRUPTED));
    }
    Ok(ExitCode::SUCCESS)
}

fn compare(args: &CompareArgs) -> Result<ExitCode> {
    let a = AggregateResult::load(&args.a)
        .with_context(|| format!("cannot load {}", args.a.display()))?;
    let b = match &args.b {
        Some(path) => AggregateResult::load(path)
            .with_context(|| format!("cannot load {}", path.display()))?,
        None => a.clone(),
    };

    let rows = compare_aggregates(
        (&a, &args.a_filter),
        (&b, &args.b_filter),
        &args.matching,
        args.direction,
    );

    let missing = rows
        .iter()
        .filter(|r| r.metric == Metric::NotAvailable)
        .count();
    if missing > 0 {
        warn!(rows = missing, "comparison has unmatched or failed runs");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        print!("{}", render_table(&rows, &args.matching));
    }
    Ok(ExitCode::SUCCESS)
}

fn profiles(env: &SweepEnv) -> Result<ExitCode> {
    let resolver = Resolver::load(env).context("cannot load configuration stores")?;
    for kind in [StoreKind::Program, StoreKind::Variant] {
        println!("{kind}s:");
        let store = resolver.store(kind);
        for name in store.names() {
            let description = store
                .lookup(name)
                .found()
                .map(|p| p.description().to_string())
                .unwrap_or_default();
            println!("  {name:<24} {description}");
        }
    }
    Ok(ExitCode::SUCCESS)
}
