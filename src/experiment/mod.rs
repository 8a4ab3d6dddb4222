//! Experiment results: run records, aggregate, persistence
//!
//! ## Schema Overview
//!
//! ```text
//! AggregateResult
//!   ├── ExperimentRecord  (name, timestamp, axes, total combinations)
//!   └──< RunRecord (N)    [enumeration order]
//!          ├── Combination
//!          ├── status / failure / durations
//!          └── stats artifact path + parsed JitStats
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use etiss_sweep::experiment::{AggregateResult, ExperimentRecord, RunRecord, RunStatus};
//! use etiss_sweep::sweep::{Axis, AxisSet, Combination};
//!
//! let axes = AxisSet::new().with_axis(Axis::Program, ["hello_world"]);
//! let mut aggregate = AggregateResult::new(ExperimentRecord::new("baseline", axes));
//!
//! let run = RunRecord::builder(Combination::from_pairs([(Axis::Program, "hello_world")]))
//!     .duration_secs(0.42)
//!     .build();
//! aggregate.push(run);
//!
//! assert_eq!(aggregate.records()[0].status(), RunStatus::Success);
//! assert!(aggregate.summary().is_complete());
//! ```

mod aggregate;
mod experiment_record;
mod run_record;
mod stats;
mod store;

pub use aggregate::{AggregateResult, SweepSummary};
pub use experiment_record::{ExperimentRecord, ExperimentRecordBuilder, DEFAULT_EXPERIMENT};
pub use run_record::{FailureKind, RunRecord, RunRecordBuilder, RunStatus};
pub use stats::{CacheStats, CompilationStats, ExecutionStats, JitStats, OptimizationStats, PerformanceStats};
pub use store::{ResultAggregator, ResultLayout};
