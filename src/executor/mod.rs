//! Run Executor
//!
//! Turns one [`Combination`] into one [`RunRecord`]:
//!
//! 1. resolve the variant and program profiles
//! 2. check the simulator binary and program artifacts exist
//! 3. write a temporary overlay ini (deleted on every exit path)
//! 4. run the simulator `runs` times, timing only the invocation
//! 5. pick up the statistics artifact if one was requested, otherwise the
//!    performance summary printed on stdout
//!
//! Every failure is folded into the record; nothing here aborts a sweep.

mod overlay;
mod simulator;

pub use overlay::{Overlay, LOG_LEVEL};
pub use simulator::{Invocation, ProcessSimulator, SimOutcome, SimOutput, Simulator};

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::env::SweepEnv;
use crate::experiment::{FailureKind, JitStats, RunRecord, RunRecordBuilder};
use crate::profile::{Field, ResolvedProfile, Resolver, StoreKind};
use crate::sweep::{Axis, Combination, OptLevels};
use crate::{Error, Result};

/// Architecture passed to the simulator when the profile has none.
pub const DEFAULT_ARCH: &str = "RV32IMACFD";

/// On-disk locations derived from the environment and resolved profiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifacts {
    /// Simulator executable of the variant
    pub simulator: PathBuf,
    /// Program ELF
    pub program_elf: PathBuf,
    /// Program's own simulator configuration
    pub program_ini: PathBuf,
}

impl BuildArtifacts {
    /// Derive artifact paths for a variant/profile/program triple.
    #[must_use]
    pub fn locate(
        env: &SweepEnv,
        variant: &ResolvedProfile,
        profile: &ResolvedProfile,
        program: &str,
    ) -> Self {
        let variant_dir = build_dir(variant);
        let profile_dir = env.examples_root.join(build_dir(profile)).join("install");
        Self {
            simulator: env
                .etiss_root
                .join(variant_dir)
                .join("installed")
                .join("bin")
                .join(&env.etiss_binary),
            program_elf: profile_dir.join("bin").join(program),
            program_ini: profile_dir.join("ini").join(format!("{program}.ini")),
        }
    }

    /// First artifact that does not exist.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingBuildArtifact` naming the missing path
    pub fn check(&self) -> Result<()> {
        for path in [&self.simulator, &self.program_elf, &self.program_ini] {
            if !path.exists() {
                return Err(Error::MissingBuildArtifact(path.clone()));
            }
        }
        Ok(())
    }
}

fn build_dir(profile: &ResolvedProfile) -> PathBuf {
    match profile.str_field("build_dir") {
        Field::Present(dir) => PathBuf::from(dir),
        Field::Absent => PathBuf::from(format!("build_{}", profile.name())),
    }
}

/// Everything needed to run a combination once it has been resolved.
#[derive(Debug)]
struct Prepared {
    invocation: Invocation,
    runs: u64,
    stats_path: Option<PathBuf>,
    // Held for the duration of the runs; dropping it deletes the file.
    _overlay: tempfile::NamedTempFile,
}

/// Executes combinations one at a time against a [`Simulator`].
#[derive(Debug)]
pub struct RunExecutor<'a, S: Simulator> {
    env: &'a SweepEnv,
    resolver: &'a Resolver,
    simulator: S,
    stats_dir: Option<PathBuf>,
    opt_levels: OptLevels,
    cancel: Arc<AtomicBool>,
}

impl<'a, S: Simulator> RunExecutor<'a, S> {
    /// Create an executor that does not request statistics.
    #[must_use]
    pub fn new(env: &'a SweepEnv, resolver: &'a Resolver, simulator: S) -> Self {
        Self {
            env,
            resolver,
            simulator,
            stats_dir: None,
            opt_levels: OptLevels::default(),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request a statistics artifact per run, written under `dir`.
    #[must_use]
    pub fn with_stats_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.stats_dir = Some(dir.into());
        self
    }

    /// JIT optimization levels written into every overlay.
    #[must_use]
    pub fn with_opt_levels(mut self, opt_levels: OptLevels) -> Self {
        self.opt_levels = opt_levels;
        self
    }

    /// Share a cancellation flag (set by the interrupt handler).
    #[must_use]
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Whether the user asked to stop.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// The simulator in use.
    #[must_use]
    pub const fn simulator(&self) -> &S {
        &self.simulator
    }

    /// Execute one combination. Never fails; failures land in the record.
    #[must_use]
    pub fn execute(&self, combination: &Combination) -> RunRecord {
        let builder = RunRecord::builder(combination.clone());
        match self.prepare(combination) {
            Ok(prepared) => self.run(builder, prepared),
            Err(e) => {
                warn!(combination = %combination, error = %e, "skipping combination");
                builder.failure(FailureKind::from(e)).build()
            }
        }
    }

    fn prepare(&self, combination: &Combination) -> Result<Prepared> {
        let value_of = |axis: Axis| {
            combination
                .get(axis)
                .ok_or_else(|| Error::EmptyAxis(axis.name().to_string()))
        };
        let program = value_of(Axis::Program)?;
        let jit = value_of(Axis::Jit)?;
        let block_size = parse_u64(Axis::BlockSize, value_of(Axis::BlockSize)?)?;
        let optimization_threads = combination
            .get(Axis::OptimizationThreads)
            .map(|v| parse_u64(Axis::OptimizationThreads, v))
            .transpose()?;

        let variant = self
            .resolver
            .resolve(StoreKind::Variant, value_of(Axis::Variant)?)
            .into_result()?;
        let profile = self
            .resolver
            .resolve(StoreKind::Program, value_of(Axis::Profile)?)
            .into_result()?;

        let artifacts = BuildArtifacts::locate(self.env, &variant, &profile, program);
        artifacts.check()?;

        let stats_path = match &self.stats_dir {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                let path = dir.join(format!("{}.json", combination.artifact_name()));
                if path.exists() {
                    fs::remove_file(&path)?;
                }
                Some(path)
            }
            None => None,
        };

        let overlay = Overlay {
            jit,
            fast_jit: combination.fast_jit(),
            stats_path: stats_path.as_deref(),
            optimization_threads,
            block_size,
            opt_levels: &self.opt_levels,
        }
        .materialize()?;

        let arch = profile.str_field("arch").unwrap_or(DEFAULT_ARCH);
        let invocation = Invocation {
            program: artifacts.simulator,
            args: vec![
                ini_arg(&artifacts.program_ini),
                ini_arg(overlay.path()),
                OsString::from(format!("--arch.cpu={arch}")),
            ],
        };

        Ok(Prepared {
            invocation,
            runs: profile.u64_field("runs")?.unwrap_or(1).max(1),
            stats_path,
            _overlay: overlay,
        })
    }

    fn run(&self, mut builder: RunRecordBuilder, prepared: Prepared) -> RunRecord {
        let mut stdout = String::new();
        for attempt in 1..=prepared.runs {
            if self.is_cancelled() {
                return builder.failure(FailureKind::Cancelled).build();
            }

            let started = Instant::now();
            let output = self.simulator.invoke(&prepared.invocation);
            let elapsed = started.elapsed().as_secs_f64();

            // An interrupt during the invocation voids the timing, whatever the exit status.
            if self.is_cancelled() {
                warn!(attempt, "run interrupted");
                return builder.failure(FailureKind::Cancelled).build();
            }

            match output.and_then(|o| o.outcome.into_result().map(|()| o.stdout)) {
                Ok(out) => {
                    builder = builder.duration_secs(elapsed);
                    stdout = out;
                    info!(attempt, runs = prepared.runs, duration_secs = elapsed, "run finished");
                }
                Err(e) => {
                    builder = builder.duration_secs(elapsed);
                    warn!(attempt, error = %e, "simulator run failed");
                    return builder.failure(FailureKind::from(e)).build();
                }
            }
        }

        let mut captured = false;
        if let Some(path) = prepared.stats_path {
            if path.exists() {
                match JitStats::load(&path) {
                    Ok(stats) => {
                        builder = builder.stats(stats);
                        captured = true;
                    }
                    Err(e) => warn!(path = %path.display(), error = %e, "unreadable statistics artifact"),
                }
                builder = builder.stats_path(path);
            } else {
                warn!(path = %path.display(), "simulator wrote no statistics artifact, falling back to stdout");
            }
        }
        if !captured {
            match JitStats::from_stdout(&stdout) {
                Ok(Some(stats)) => builder = builder.stats(stats),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "cannot parse simulator stdout"),
            }
        }
        builder.build()
    }
}

fn ini_arg(path: &Path) -> OsString {
    let mut arg = OsString::from("-i");
    arg.push(path);
    arg
}

fn parse_u64(axis: Axis, value: &str) -> Result<u64> {
    value.parse().map_err(|_| Error::InvalidAxisValue {
        axis: axis.name().to_string(),
        value: value.to_string(),
    })
}
