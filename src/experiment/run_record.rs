//! Run Record - outcome of executing one combination

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::JitStats;
use crate::profile::StoreKind;
use crate::sweep::Combination;
use crate::Error;

/// Status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Run completed successfully.
    Success,
    /// Run failed (see [`FailureKind`]).
    Failed,
    /// Run was interrupted by the user.
    Cancelled,
}

/// Why a run failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureKind {
    /// Named profile/variant absent from its store.
    ConfigurationNotFound {
        /// Store searched
        store: StoreKind,
        /// Name requested
        name: String,
    },
    /// Program or simulator binary not built.
    MissingBuildArtifact {
        /// Expected path
        path: PathBuf,
    },
    /// Simulator exited unsuccessfully.
    SimulatorExecutionFailure {
        /// Exit code
        code: Option<i32>,
        /// Terminating signal
        signal: Option<i32>,
    },
    /// Interrupted by the user.
    Cancelled,
    /// Anything else that went wrong preparing or running the combination.
    Other {
        /// Error message
        message: String,
    },
}

impl From<Error> for FailureKind {
    fn from(error: Error) -> Self {
        match error {
            Error::ConfigurationNotFound { store, name } => Self::ConfigurationNotFound { store, name },
            Error::MissingBuildArtifact(path) => Self::MissingBuildArtifact { path },
            Error::SimulatorExecutionFailure { code, signal } => {
                Self::SimulatorExecutionFailure { code, signal }
            }
            other => Self::Other {
                message: other.to_string(),
            },
        }
    }
}

/// Run Record represents a single executed combination.
///
/// Records are immutable once built; the aggregator owns them afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunRecord {
    combination: Combination,
    status: RunStatus,
    duration_secs: f64,
    #[serde(default)]
    durations_secs: Vec<f64>,
    started_at: DateTime<Utc>,
    #[serde(default)]
    stats_path: Option<PathBuf>,
    #[serde(default)]
    stats: Option<JitStats>,
    #[serde(default)]
    failure: Option<FailureKind>,
}

impl RunRecord {
    /// Create a builder for a combination.
    #[must_use]
    pub fn builder(combination: Combination) -> RunRecordBuilder {
        RunRecordBuilder::new(combination)
    }

    /// Failed record with no simulator invocation and zero duration.
    #[must_use]
    pub fn failed(combination: Combination, failure: FailureKind) -> Self {
        RunRecordBuilder::new(combination).failure(failure).build()
    }

    /// The combination that produced this record.
    #[must_use]
    pub const fn combination(&self) -> &Combination {
        &self.combination
    }

    /// Final status.
    #[must_use]
    pub const fn status(&self) -> RunStatus {
        self.status
    }

    /// Whether the run succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }

    /// Mean wall-clock duration of the simulator invocations, in seconds.
    #[must_use]
    pub const fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    /// Individual invocation durations.
    #[must_use]
    pub fn durations_secs(&self) -> &[f64] {
        &self.durations_secs
    }

    /// Start timestamp.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Statistics artifact path, if requested and produced.
    #[must_use]
    pub fn stats_path(&self) -> Option<&Path> {
        self.stats_path.as_deref()
    }

    /// Parsed statistics, if available.
    #[must_use]
    pub const fn stats(&self) -> Option<&JitStats> {
        self.stats.as_ref()
    }

    /// Failure reason, if not successful.
    #[must_use]
    pub const fn failure(&self) -> Option<&FailureKind> {
        self.failure.as_ref()
    }

    /// Copy of this record pointing at a relocated statistics artifact.
    #[must_use]
    pub fn with_stats_path(&self, path: PathBuf) -> Self {
        Self {
            stats_path: Some(path),
            ..self.clone()
        }
    }
}

/// Builder for `RunRecord`.
#[derive(Debug)]
pub struct RunRecordBuilder {
    combination: Combination,
    durations_secs: Vec<f64>,
    started_at: DateTime<Utc>,
    stats_path: Option<PathBuf>,
    stats: Option<JitStats>,
    failure: Option<FailureKind>,
}

impl RunRecordBuilder {
    /// Create a new builder; the start timestamp is now.
    #[must_use]
    pub fn new(combination: Combination) -> Self {
        Self {
            combination,
            durations_secs: Vec::new(),
            started_at: Utc::now(),
            stats_path: None,
            stats: None,
            failure: None,
        }
    }

    /// Set a custom start timestamp.
    #[must_use]
    pub const fn started_at(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = started_at;
        self
    }

    /// Add one measured invocation.
    #[must_use]
    pub fn duration_secs(mut self, secs: f64) -> Self {
        self.durations_secs.push(secs);
        self
    }

    /// Set the statistics artifact path.
    #[must_use]
    pub fn stats_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.stats_path = Some(path.into());
        self
    }

    /// Set the parsed statistics.
    #[must_use]
    pub fn stats(mut self, stats: JitStats) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Mark the run as failed.
    #[must_use]
    pub fn failure(mut self, failure: FailureKind) -> Self {
        self.failure = Some(failure);
        self
    }

    /// Build the `RunRecord`. Failed runs never carry statistics.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn build(self) -> RunRecord {
        let status = match self.failure {
            None => RunStatus::Success,
            Some(FailureKind::Cancelled) => RunStatus::Cancelled,
            Some(_) => RunStatus::Failed,
        };
        let duration_secs = if self.durations_secs.is_empty() {
            0.0
        } else {
            self.durations_secs.iter().sum::<f64>() / self.durations_secs.len() as f64
        };
        let success = status == RunStatus::Success;
        RunRecord {
            combination: self.combination,
            status,
            duration_secs,
            durations_secs: self.durations_secs,
            started_at: self.started_at,
            stats_path: self.stats_path.filter(|_| success),
            stats: self.stats.filter(|_| success),
            failure: self.failure,
        }
    }
}
