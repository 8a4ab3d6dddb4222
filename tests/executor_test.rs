//! Run Executor and sweep driver tests
//!
//! A fake simulator stands in for the ETISS binary: it reads the overlay it
//! was given, writes a statistics artifact when asked, and fails for GCC.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use etiss_sweep::env::SweepEnv;
use etiss_sweep::executor::{Invocation, RunExecutor, SimOutcome, SimOutput, Simulator};
use etiss_sweep::experiment::{
    ExperimentRecord, FailureKind, ResultAggregator, ResultLayout, RunStatus,
};
use etiss_sweep::profile::{ProfileStore, Resolver, StoreKind};
use etiss_sweep::sweep::{run_sweep, Axis, AxisSet, Combination, OptLevels};
use tempfile::TempDir;

// =============================================================================
// Fixtures
// =============================================================================

#[derive(Default)]
struct FakeSimulator {
    overlays: RefCell<Vec<PathBuf>>,
    args: RefCell<Vec<Vec<String>>>,
}

impl FakeSimulator {
    fn calls(&self) -> usize {
        self.args.borrow().len()
    }
}

impl Simulator for FakeSimulator {
    fn invoke(&self, invocation: &Invocation) -> etiss_sweep::Result<SimOutput> {
        let args = arg_strings(invocation);
        let overlay = overlay_path(&args);
        let text = fs::read_to_string(&overlay)?;

        if let Some(stats) = text.lines().find_map(|l| l.strip_prefix("jit.stats_json=")) {
            fs::write(
                stats,
                r#"{"performance": {"mips_estimated": 250.0}, "compilation": {"unique_blocks": 42}}"#,
            )?;
        }

        self.overlays.borrow_mut().push(overlay);
        self.args.borrow_mut().push(args);

        if text.contains("jit.type=GCCJIT") {
            return Ok(SimOutcome::Exited(1).into());
        }
        Ok(SimOutcome::Success.into())
    }
}

/// Prints a performance summary instead of writing a statistics artifact.
struct SummaryOnlySimulator;

impl Simulator for SummaryOnlySimulator {
    fn invoke(&self, _invocation: &Invocation) -> etiss_sweep::Result<SimOutput> {
        Ok(SimOutput {
            outcome: SimOutcome::Success,
            stdout: "=== Simulation Summary ===\n\
                     CPU Cycles (estimated): 1200000\n\
                     Simulation Time: 0.52\n\
                     MIPS (estimated): 231.75\n"
                .to_string(),
        })
    }
}

/// Raises the interrupt flag while "running" and then exits cleanly.
struct InterruptedSimulator {
    cancel: Arc<AtomicBool>,
    overlays: RefCell<Vec<PathBuf>>,
}

impl Simulator for InterruptedSimulator {
    fn invoke(&self, invocation: &Invocation) -> etiss_sweep::Result<SimOutput> {
        self.overlays
            .borrow_mut()
            .push(overlay_path(&arg_strings(invocation)));
        self.cancel.store(true, Ordering::SeqCst);
        Ok(SimOutcome::Success.into())
    }
}

fn arg_strings(invocation: &Invocation) -> Vec<String> {
    invocation
        .args
        .iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}

fn overlay_path(args: &[String]) -> PathBuf {
    PathBuf::from(args[1].strip_prefix("-i").unwrap())
}

struct Fixture {
    _dir: TempDir,
    root: PathBuf,
    env: SweepEnv,
    resolver: Resolver,
}

fn touch(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"").unwrap();
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let root = dir.path().to_path_buf();

    let mut vars = BTreeMap::new();
    vars.insert("ETISS_ROOT".to_string(), root.join("etiss").display().to_string());
    vars.insert("EXAMPLES_ROOT".to_string(), root.join("examples").display().to_string());
    vars.insert("SWEEP_RESULTS_DIR".to_string(), root.join("results").display().to_string());
    let env = SweepEnv::from_vars(&vars, &root);

    touch(&root.join("etiss/build_v1/installed/bin/bare_etiss_processor"));
    touch(&root.join("etiss/custom/installed/bin/bare_etiss_processor"));
    touch(&root.join("examples/build_default/install/bin/p1"));
    touch(&root.join("examples/build_default/install/ini/p1.ini"));
    touch(&root.join("examples/build_twice/install/bin/p1"));
    touch(&root.join("examples/build_twice/install/ini/p1.ini"));

    let variants = ProfileStore::from_json_str(
        StoreKind::Variant,
        r#"{"builds": {"v1": {}, "v3": {"build_dir": "custom"}}}"#,
    )
    .unwrap();
    let programs = ProfileStore::from_json_str(
        StoreKind::Program,
        r#"{"builds": {"default": {"arch": "RV32IMC"}, "twice": {"runs": 2}}}"#,
    )
    .unwrap();

    Fixture {
        _dir: dir,
        root,
        env,
        resolver: Resolver::new(variants, programs),
    }
}

fn combo(program: &str, profile: &str, variant: &str, jit: &str) -> Combination {
    Combination::from_pairs([
        (Axis::Program, program),
        (Axis::Profile, profile),
        (Axis::Variant, variant),
        (Axis::Jit, jit),
        (Axis::BlockSize, "100"),
    ])
}

// =============================================================================
// Single combination
// =============================================================================

#[test]
fn test_successful_run_invokes_simulator_with_layered_configs() {
    let fx = fixture();
    let executor = RunExecutor::new(&fx.env, &fx.resolver, FakeSimulator::default());

    let record = executor.execute(&combo("p1", "default", "etiss_v1", "TCC"));

    assert_eq!(record.status(), RunStatus::Success);
    assert!(record.failure().is_none());
    assert!(record.stats_path().is_none(), "stats were not requested");
    assert_eq!(record.durations_secs().len(), 1);

    let args = fx_args(executor.simulator());
    assert_eq!(args.len(), 3);
    assert_eq!(
        args[0],
        format!("-i{}", fx.root.join("examples/build_default/install/ini/p1.ini").display())
    );
    assert_eq!(args[2], "--arch.cpu=RV32IMC");
}

fn fx_args(sim: &FakeSimulator) -> Vec<String> {
    sim.args.borrow()[0].clone()
}

#[test]
fn test_overlay_deleted_after_success_and_failure() {
    let fx = fixture();
    let executor = RunExecutor::new(&fx.env, &fx.resolver, FakeSimulator::default());

    let ok = executor.execute(&combo("p1", "default", "v1", "TCC"));
    let failed = executor.execute(&combo("p1", "default", "v1", "GCC"));

    assert_eq!(ok.status(), RunStatus::Success);
    assert_eq!(failed.status(), RunStatus::Failed);
    let overlays = executor.simulator().overlays.borrow();
    assert_eq!(overlays.len(), 2);
    for overlay in overlays.iter() {
        assert!(!overlay.exists(), "overlay leaked: {}", overlay.display());
    }
}

#[test]
fn test_nonzero_exit_is_recorded_failure() {
    let fx = fixture();
    let executor = RunExecutor::new(&fx.env, &fx.resolver, FakeSimulator::default());

    let record = executor.execute(&combo("p1", "default", "v1", "GCC"));

    assert_eq!(
        record.failure(),
        Some(&FailureKind::SimulatorExecutionFailure {
            code: Some(1),
            signal: None
        })
    );
}

#[test]
fn test_missing_program_never_invokes_simulator() {
    let fx = fixture();
    let executor = RunExecutor::new(&fx.env, &fx.resolver, FakeSimulator::default());

    let record = executor.execute(&combo("not_built", "default", "v1", "TCC"));

    assert_eq!(record.status(), RunStatus::Failed);
    assert!(matches!(
        record.failure(),
        Some(FailureKind::MissingBuildArtifact { path }) if path.ends_with("install/bin/not_built")
    ));
    assert!(record.duration_secs().abs() < f64::EPSILON);
    assert_eq!(executor.simulator().calls(), 0);
}

#[test]
fn test_unknown_profile_is_configuration_not_found() {
    let fx = fixture();
    let executor = RunExecutor::new(&fx.env, &fx.resolver, FakeSimulator::default());

    let record = executor.execute(&combo("p1", "nightly", "v1", "TCC"));

    assert_eq!(
        record.failure(),
        Some(&FailureKind::ConfigurationNotFound {
            store: StoreKind::Program,
            name: "nightly".to_string()
        })
    );
    assert_eq!(executor.simulator().calls(), 0);
}

#[test]
fn test_variant_build_dir_from_store() {
    let fx = fixture();
    let executor = RunExecutor::new(&fx.env, &fx.resolver, FakeSimulator::default());

    let record = executor.execute(&combo("p1", "default", "v3", "LLVM"));
    assert_eq!(record.status(), RunStatus::Success);
}

#[test]
fn test_runs_field_repeats_invocation() {
    let fx = fixture();
    let executor = RunExecutor::new(&fx.env, &fx.resolver, FakeSimulator::default());

    let record = executor.execute(&combo("p1", "twice", "v1", "TCC"));

    assert_eq!(record.status(), RunStatus::Success);
    assert_eq!(record.durations_secs().len(), 2);
    assert_eq!(executor.simulator().calls(), 2);
}

#[test]
fn test_statistics_captured_when_requested() {
    let fx = fixture();
    let scratch = TempDir::new().unwrap();
    let executor = RunExecutor::new(&fx.env, &fx.resolver, FakeSimulator::default())
        .with_stats_dir(scratch.path());

    let combination = combo("p1", "default", "v1", "TCC");
    let record = executor.execute(&combination);

    let expected = scratch
        .path()
        .join(format!("{}.json", combination.artifact_name()));
    assert_eq!(record.stats_path(), Some(expected.as_path()));
    let stats = record.stats().expect("stats parsed");
    assert_eq!(stats.compilation.unique_blocks, 42);
}

#[test]
fn test_failed_run_has_no_statistics_path() {
    let fx = fixture();
    let scratch = TempDir::new().unwrap();
    let executor = RunExecutor::new(&fx.env, &fx.resolver, FakeSimulator::default())
        .with_stats_dir(scratch.path());

    let record = executor.execute(&combo("p1", "default", "v1", "GCC"));
    assert!(record.stats_path().is_none());
    assert!(record.stats().is_none());
}

#[test]
fn test_cancelled_before_run() {
    let fx = fixture();
    let executor = RunExecutor::new(&fx.env, &fx.resolver, FakeSimulator::default())
        .with_cancel_flag(Arc::new(AtomicBool::new(true)));

    let record = executor.execute(&combo("p1", "default", "v1", "TCC"));
    assert_eq!(record.status(), RunStatus::Cancelled);
    assert_eq!(executor.simulator().calls(), 0);
}

#[test]
fn test_interrupt_during_successful_run_is_cancelled() {
    let fx = fixture();
    let scratch = TempDir::new().unwrap();
    let cancel = Arc::new(AtomicBool::new(false));
    let simulator = InterruptedSimulator {
        cancel: Arc::clone(&cancel),
        overlays: RefCell::default(),
    };
    let executor = RunExecutor::new(&fx.env, &fx.resolver, simulator)
        .with_stats_dir(scratch.path())
        .with_cancel_flag(cancel);

    let record = executor.execute(&combo("p1", "twice", "v1", "TCC"));

    assert_eq!(record.status(), RunStatus::Cancelled);
    assert_eq!(record.failure(), Some(&FailureKind::Cancelled));
    assert!(record.durations_secs().is_empty());
    assert!(record.stats().is_none());
    assert!(record.stats_path().is_none());

    let overlays = executor.simulator().overlays.borrow();
    assert_eq!(overlays.len(), 1, "second run must not start");
    assert!(!overlays[0].exists(), "overlay leaked: {}", overlays[0].display());
}

#[test]
fn test_statistics_from_stdout_without_artifact() {
    let fx = fixture();
    let executor = RunExecutor::new(&fx.env, &fx.resolver, SummaryOnlySimulator);

    let record = executor.execute(&combo("p1", "default", "v1", "TCC"));

    assert_eq!(record.status(), RunStatus::Success);
    assert!(record.stats_path().is_none());
    let stats = record.stats().expect("summary parsed");
    assert!((stats.performance.mips_estimated - 231.75).abs() < 1e-9);
    assert!((stats.performance.simulation_time_s - 0.52).abs() < 1e-9);
    assert_eq!(stats.compilation.unique_blocks, 0);
}

#[test]
fn test_stdout_fallback_when_requested_artifact_missing() {
    let fx = fixture();
    let scratch = TempDir::new().unwrap();
    let executor = RunExecutor::new(&fx.env, &fx.resolver, SummaryOnlySimulator)
        .with_stats_dir(scratch.path());

    let record = executor.execute(&combo("p1", "default", "v1", "TCC"));

    assert!(record.stats_path().is_none());
    let stats = record.stats().expect("summary parsed");
    assert!((stats.performance.mips_estimated - 231.75).abs() < 1e-9);
}

#[test]
fn test_opt_levels_reach_overlay() {
    let fx = fixture();
    let executor = RunExecutor::new(&fx.env, &fx.resolver, OverlayCapture::default())
        .with_opt_levels(OptLevels::new("2", "z").unwrap());

    let record = executor.execute(&combo("p1", "default", "v1", "LLVM"));

    assert_eq!(record.status(), RunStatus::Success);
    let text = executor.simulator().text.borrow();
    assert!(text.contains("jit.gcc.opt_level=2\n"));
    assert!(text.contains("jit.llvm.opt_level=z\n"));
}

#[derive(Default)]
struct OverlayCapture {
    text: RefCell<String>,
}

impl Simulator for OverlayCapture {
    fn invoke(&self, invocation: &Invocation) -> etiss_sweep::Result<SimOutput> {
        let overlay = overlay_path(&arg_strings(invocation));
        *self.text.borrow_mut() = fs::read_to_string(overlay)?;
        Ok(SimOutcome::Success.into())
    }
}

// =============================================================================
// Sweep driver
// =============================================================================

#[test]
fn test_sweep_continues_past_unresolvable_variant() {
    let fx = fixture();
    let axes = AxisSet::new()
        .with_axis(Axis::Program, ["p1"])
        .with_axis(Axis::Profile, ["default"])
        .with_axis(Axis::Variant, ["v1", "v2"])
        .with_axis(Axis::Jit, ["TCC"])
        .with_axis(Axis::BlockSize, ["100"]);
    let combinations = axes.expand().unwrap();

    let executor = RunExecutor::new(&fx.env, &fx.resolver, FakeSimulator::default());
    let mut aggregator = ResultAggregator::new(
        ExperimentRecord::new("scenario", axes),
        ResultLayout::from_env(&fx.env, None),
    );

    let summary = run_sweep(&combinations, &executor, &mut aggregator);

    assert_eq!(summary.total, 2);
    assert_eq!(summary.attempted, 2);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 1);

    let records = aggregator.aggregate().records();
    assert_eq!(records[0].combination().get(Axis::Variant), Some("v1"));
    assert_eq!(records[0].status(), RunStatus::Success);
    assert_eq!(records[1].combination().get(Axis::Variant), Some("v2"));
    assert!(matches!(
        records[1].failure(),
        Some(FailureKind::ConfigurationNotFound { store: StoreKind::Variant, .. })
    ));
}

#[test]
fn test_cancelled_sweep_records_nothing_further() {
    let fx = fixture();
    let axes = AxisSet::new()
        .with_axis(Axis::Program, ["p1"])
        .with_axis(Axis::Profile, ["default"])
        .with_axis(Axis::Variant, ["v1"])
        .with_axis(Axis::Jit, ["TCC", "LLVM"])
        .with_axis(Axis::BlockSize, ["100"]);
    let combinations = axes.expand().unwrap();

    let executor = RunExecutor::new(&fx.env, &fx.resolver, FakeSimulator::default())
        .with_cancel_flag(Arc::new(AtomicBool::new(true)));
    let mut aggregator = ResultAggregator::new(
        ExperimentRecord::new("cancelled", axes),
        ResultLayout::from_env(&fx.env, None),
    );

    let summary = run_sweep(&combinations, &executor, &mut aggregator);
    assert_eq!(summary.total, 2);
    assert_eq!(summary.attempted, 0);
    assert!(!summary.is_complete());

    let path = aggregator.flush().unwrap();
    assert!(path.exists());
}
