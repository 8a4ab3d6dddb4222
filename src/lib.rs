//! # etiss-sweep: Benchmark-Sweep Orchestrator
//!
//! Expands named configuration axes (programs, build profiles, simulator
//! variants, JIT backends, block sizes, ...) into every combination, runs the
//! simulator once per combination, and aggregates timings and JIT statistics
//! into a result set for comparative analysis.
//!
//! ## Data Flow
//!
//! ```text
//! AxisSet ──expand──> [Combination] ──RunExecutor──> RunRecord
//!                                                       │
//!                         ResultAggregator <────────────┘
//!                               │ flush
//!                               ▼
//!                        AggregateResult (JSON) ──compare──> [ComparisonRow]
//! ```
//!
//! ## Design Principles (Toyota Way Aligned)
//!
//! - **Jidoka**: A failed combination is recorded and the sweep moves on
//! - **Poka-Yoke**: Empty axes and unknown values are rejected before any run
//! - **Genchi Genbutsu**: Runs are strictly sequential so wall-clock timings
//!   are not distorted by contention
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use etiss_sweep::env::SweepEnv;
//! use etiss_sweep::executor::{ProcessSimulator, RunExecutor};
//! use etiss_sweep::experiment::{ExperimentRecord, ResultAggregator, ResultLayout};
//! use etiss_sweep::profile::Resolver;
//! use etiss_sweep::sweep::{run_sweep, Axis, AxisSet};
//!
//! let env = SweepEnv::load(None, Path::new("."))?;
//! let resolver = Resolver::load(&env)?;
//!
//! let axes = AxisSet::new()
//!     .with_axis(Axis::Variant, ["default"])
//!     .with_axis(Axis::Profile, ["default"])
//!     .with_axis(Axis::Program, ["hello_world"])
//!     .with_axis(Axis::Jit, ["TCC", "LLVM"])
//!     .with_axis(Axis::BlockSize, ["100"])
//!     .normalized()?;
//!
//! let combinations = axes.expand()?;
//! let executor = RunExecutor::new(&env, &resolver, ProcessSimulator);
//! let mut aggregator = ResultAggregator::new(
//!     ExperimentRecord::new("jit_backends", axes),
//!     ResultLayout::from_env(&env, None),
//! );
//!
//! let summary = run_sweep(&combinations, &executor, &mut aggregator);
//! aggregator.flush()?;
//! println!("{} of {} runs succeeded", summary.succeeded, summary.total);
//! # Ok::<(), etiss_sweep::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod compare;
pub mod env;
pub mod error;
pub mod executor;
pub mod experiment;
pub mod profile;
pub mod sweep;
pub mod toolchain;

pub use error::{Error, Result};
