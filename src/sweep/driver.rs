//! Sequential sweep loop

use std::time::Instant;

use tracing::{info, warn};

use super::Combination;
use crate::executor::{RunExecutor, Simulator};
use crate::experiment::{ResultAggregator, RunStatus, SweepSummary};

/// Run every combination in order, one at a time, recording each result.
///
/// Stops early (without recording the rest) once the executor's cancel flag
/// is set. The caller flushes the aggregator afterwards either way.
#[allow(clippy::cast_precision_loss)]
pub fn run_sweep<S: Simulator>(
    combinations: &[Combination],
    executor: &RunExecutor<'_, S>,
    aggregator: &mut ResultAggregator,
) -> SweepSummary {
    let total = combinations.len();
    let started = Instant::now();

    for (index, combination) in combinations.iter().enumerate() {
        if executor.is_cancelled() {
            warn!(remaining = total - index, "sweep interrupted");
            break;
        }

        info!("[{}/{}] {combination}", index + 1, total);
        let record = executor.execute(combination);
        match record.status() {
            RunStatus::Success => match record.stats() {
                Some(stats) => info!(
                    duration_secs = record.duration_secs(),
                    mips_estimated = stats.performance.mips_estimated,
                    mips_corrected = stats.performance.mips_corrected,
                    wall_time_s = stats.performance.wall_time_s,
                    "  -> ok"
                ),
                None => info!(duration_secs = record.duration_secs(), "  -> ok"),
            },
            RunStatus::Failed => warn!(failure = ?record.failure(), "  -> FAILED"),
            RunStatus::Cancelled => warn!("  -> cancelled"),
        }
        aggregator.record(record);

        let done = index + 1;
        if done < total {
            let eta = started.elapsed().as_secs_f64() / done as f64 * (total - done) as f64;
            info!(eta_secs = eta.round(), "estimated time remaining");
        }
    }

    let summary = aggregator.aggregate().summary();
    info!(
        attempted = summary.attempted,
        total = summary.total,
        succeeded = summary.succeeded,
        failed = summary.failed,
        cancelled = summary.cancelled,
        "sweep finished"
    );
    summary
}
