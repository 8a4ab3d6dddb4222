//! Experiment Record - sweep-level metadata

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sweep::{AxisSet, OptLevels};

/// Name used when the caller does not give one.
pub const DEFAULT_EXPERIMENT: &str = "default";

/// Experiment Record describes one sweep invocation.
///
/// `total_combinations` is fixed before the first run so progress and
/// completeness can be judged from the persisted document alone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExperimentRecord {
    name: String,
    created_at: DateTime<Utc>,
    total_combinations: usize,
    axes: AxisSet,
    #[serde(default)]
    opt_levels: OptLevels,
}

impl ExperimentRecord {
    /// Create a record for a normalized axis set, timestamped now.
    #[must_use]
    pub fn new(name: impl Into<String>, axes: AxisSet) -> Self {
        Self::builder(name, axes).build()
    }

    /// Create a builder for constructing an experiment record with optional fields.
    #[must_use]
    pub fn builder(name: impl Into<String>, axes: AxisSet) -> ExperimentRecordBuilder {
        ExperimentRecordBuilder::new(name, axes)
    }

    /// Experiment name (namespaces persisted artifacts).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sweep start timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Number of combinations the sweep set out to run.
    #[must_use]
    pub const fn total_combinations(&self) -> usize {
        self.total_combinations
    }

    /// Axes swept.
    #[must_use]
    pub const fn axes(&self) -> &AxisSet {
        &self.axes
    }

    /// JIT optimization levels every run used.
    #[must_use]
    pub const fn opt_levels(&self) -> &OptLevels {
        &self.opt_levels
    }
}

/// Builder for `ExperimentRecord`.
#[derive(Debug)]
pub struct ExperimentRecordBuilder {
    name: String,
    created_at: DateTime<Utc>,
    axes: AxisSet,
    opt_levels: OptLevels,
}

impl ExperimentRecordBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(name: impl Into<String>, axes: AxisSet) -> Self {
        let name = name.into();
        Self {
            name: if name.trim().is_empty() {
                DEFAULT_EXPERIMENT.to_string()
            } else {
                name
            },
            created_at: Utc::now(),
            axes,
            opt_levels: OptLevels::default(),
        }
    }

    /// Set a custom creation timestamp (useful for deserialization/testing).
    #[must_use]
    pub const fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Record the JIT optimization levels of the sweep.
    #[must_use]
    pub fn opt_levels(mut self, opt_levels: OptLevels) -> Self {
        self.opt_levels = opt_levels;
        self
    }

    /// Build the `ExperimentRecord`.
    #[must_use]
    pub fn build(self) -> ExperimentRecord {
        ExperimentRecord {
            name: self.name,
            created_at: self.created_at,
            total_combinations: self.axes.total(),
            axes: self.axes,
            opt_levels: self.opt_levels,
        }
    }
}
