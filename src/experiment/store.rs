//! Result Aggregator - collects run records and persists them
//!
//! ```text
//! <results>/<experiment>/sweep_<YYYYmmdd_HHMMSS>.json   aggregate (or --output)
//! <results>/jit_stats/<experiment>/<artifact>.json      per-run statistics copies
//! ```
//!
//! Statistics file names come from [`Combination::artifact_name`], so
//! flushing the same combinations again overwrites instead of duplicating.
//!
//! [`Combination::artifact_name`]: crate::sweep::Combination::artifact_name

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::{AggregateResult, ExperimentRecord, RunRecord};
use crate::env::SweepEnv;
use crate::Result;

/// Where a sweep's artifacts land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultLayout {
    results_dir: PathBuf,
    output: Option<PathBuf>,
}

impl ResultLayout {
    /// Layout rooted at `results_dir`, optionally overriding the aggregate path.
    #[must_use]
    pub fn new(results_dir: impl Into<PathBuf>, output: Option<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
            output,
        }
    }

    /// Layout from the sweep environment.
    #[must_use]
    pub fn from_env(env: &SweepEnv, output: Option<PathBuf>) -> Self {
        Self::new(env.results_dir.clone(), output)
    }

    /// Aggregate document path for an experiment.
    #[must_use]
    pub fn aggregate_path(&self, experiment: &ExperimentRecord) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            self.results_dir.join(experiment.name()).join(format!(
                "sweep_{}.json",
                experiment.created_at().format("%Y%m%d_%H%M%S")
            ))
        })
    }

    /// Per-experiment statistics directory.
    #[must_use]
    pub fn stats_dir(&self, experiment: &str) -> PathBuf {
        self.results_dir.join("jit_stats").join(experiment)
    }
}

/// In-memory aggregate plus its persistence layout.
#[derive(Debug)]
pub struct ResultAggregator {
    aggregate: AggregateResult,
    layout: ResultLayout,
}

impl ResultAggregator {
    /// Start collecting for an experiment.
    #[must_use]
    pub const fn new(experiment: ExperimentRecord, layout: ResultLayout) -> Self {
        Self {
            aggregate: AggregateResult::new(experiment),
            layout,
        }
    }

    /// Append a record. Order of calls is the persisted order.
    pub fn record(&mut self, run: RunRecord) {
        self.aggregate.push(run);
    }

    /// Records collected so far.
    #[must_use]
    pub const fn aggregate(&self) -> &AggregateResult {
        &self.aggregate
    }

    /// Persist statistics copies and the aggregate document.
    ///
    /// The written aggregate references the persisted statistics copies. A
    /// copy that fails is logged and its record keeps the scratch path, so
    /// the aggregate document is always written. Returns the aggregate path.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if a directory or file cannot be written
    pub fn flush(&self) -> Result<PathBuf> {
        let experiment = self.aggregate.experiment();
        let stats_dir = self.layout.stats_dir(experiment.name());

        let mut records = Vec::with_capacity(self.aggregate.records().len());
        for run in self.aggregate.records() {
            match persist_stats(run, &stats_dir) {
                Ok(persisted) => records.push(persisted),
                Err(e) => {
                    warn!(
                        combination = %run.combination(),
                        error = %e,
                        "cannot persist statistics copy, keeping scratch path"
                    );
                    records.push(run.clone());
                }
            }
        }

        let path = self.layout.aggregate_path(experiment);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let persisted = AggregateResult::from_parts(experiment.clone(), records);
        fs::write(&path, serde_json::to_string_pretty(&persisted)?)?;

        let summary = persisted.summary();
        info!(
            path = %path.display(),
            records = summary.attempted,
            total = summary.total,
            "results saved"
        );
        Ok(path)
    }
}

fn persist_stats(run: &RunRecord, stats_dir: &Path) -> Result<RunRecord> {
    let Some(source) = run.stats_path() else {
        return Ok(run.clone());
    };
    let target = stats_dir.join(format!("{}.json", run.combination().artifact_name()));
    if source == target {
        return Ok(run.clone());
    }
    if !source.exists() {
        warn!(path = %source.display(), "statistics artifact vanished before flush");
        return Ok(run.clone());
    }
    fs::create_dir_all(stats_dir)?;
    fs::copy(source, &target)?;
    Ok(run.with_stats_path(target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sweep::AxisSet;
    use chrono::TimeZone;

    #[test]
    fn test_default_aggregate_path() {
        let created = chrono::Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 5).unwrap();
        let experiment = ExperimentRecord::builder("stats_overhead", AxisSet::new())
            .created_at(created)
            .build();
        let layout = ResultLayout::new("/r", None);
        assert_eq!(
            layout.aggregate_path(&experiment),
            PathBuf::from("/r/stats_overhead/sweep_20260301_123005.json")
        );
        assert_eq!(layout.stats_dir("x"), PathBuf::from("/r/jit_stats/x"));
    }

    #[test]
    fn test_output_override() {
        let layout = ResultLayout::new("/r", Some(PathBuf::from("/tmp/out.json")));
        let experiment = ExperimentRecord::new("e", AxisSet::new());
        assert_eq!(layout.aggregate_path(&experiment), PathBuf::from("/tmp/out.json"));
    }
}
