//! Aggregate Result - the durable output of a sweep

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{ExperimentRecord, RunRecord, RunStatus};
use crate::sweep::Axis;
use crate::Result;

/// Ordered run records plus sweep metadata.
///
/// Records appear in the sweep's enumeration order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregateResult {
    experiment: ExperimentRecord,
    records: Vec<RunRecord>,
}

/// Outcome counts of a sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepSummary {
    /// Combinations the sweep set out to run
    pub total: usize,
    /// Records collected
    pub attempted: usize,
    /// Successful runs
    pub succeeded: usize,
    /// Failed runs
    pub failed: usize,
    /// Interrupted runs
    pub cancelled: usize,
}

impl SweepSummary {
    /// Whether every planned combination has a record.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.attempted == self.total
    }
}

impl AggregateResult {
    /// Empty aggregate for an experiment.
    #[must_use]
    pub const fn new(experiment: ExperimentRecord) -> Self {
        Self {
            experiment,
            records: Vec::new(),
        }
    }

    /// Assemble from existing parts.
    #[must_use]
    pub const fn from_parts(experiment: ExperimentRecord, records: Vec<RunRecord>) -> Self {
        Self {
            experiment,
            records,
        }
    }

    /// Load a persisted aggregate.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` or `Error::Json`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    /// Sweep metadata.
    #[must_use]
    pub const fn experiment(&self) -> &ExperimentRecord {
        &self.experiment
    }

    /// Records in enumeration order.
    #[must_use]
    pub fn records(&self) -> &[RunRecord] {
        &self.records
    }

    /// Append one record.
    pub fn push(&mut self, record: RunRecord) {
        self.records.push(record);
    }

    /// Records whose combination matches every `(axis, value)` filter.
    #[must_use]
    pub fn filter(&self, filters: &[(Axis, String)]) -> Vec<RunRecord> {
        self.records
            .iter()
            .filter(|r| r.combination().matches(filters))
            .cloned()
            .collect()
    }

    /// Outcome counts.
    #[must_use]
    pub fn summary(&self) -> SweepSummary {
        let count = |status: RunStatus| self.records.iter().filter(|r| r.status() == status).count();
        SweepSummary {
            total: self.experiment.total_combinations(),
            attempted: self.records.len(),
            succeeded: count(RunStatus::Success),
            failed: count(RunStatus::Failed),
            cancelled: count(RunStatus::Cancelled),
        }
    }
}
