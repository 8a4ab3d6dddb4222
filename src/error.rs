//! Error types for etiss-sweep
//!
//! Toyota Way: Clear error messages with actionable guidance (Respect for People)

use std::path::PathBuf;

use thiserror::Error;

use crate::profile::StoreKind;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// etiss-sweep error types
#[derive(Error, Debug)]
pub enum Error {
    /// Named profile/variant is not present in its store
    #[error("{store} '{name}' not found\nRun `etiss-sweep profiles` to list the available names")]
    ConfigurationNotFound {
        /// Store the lookup was made against
        store: StoreKind,
        /// Name as given by the caller
        name: String,
    },

    /// Resolved configuration points to a file that has not been built
    #[error("Build artifact missing: {}\nBuild it first (see --rebuild / --rebuild-etiss)", .0.display())]
    MissingBuildArtifact(PathBuf),

    /// Simulator exited unsuccessfully
    #[error("Simulator failed (exit code: {code:?}, signal: {signal:?})")]
    SimulatorExecutionFailure {
        /// Exit code, if the process exited normally
        code: Option<i32>,
        /// Terminating signal, if killed by one
        signal: Option<i32>,
    },

    /// Comparison against a zero-duration baseline
    #[error("Division by zero: baseline duration is 0")]
    DivisionByZero,

    /// An axis reduced to zero values before expansion
    #[error("Axis '{0}' has no values\nEvery swept axis needs at least one value")]
    EmptyAxis(String),

    /// An axis value failed validation
    #[error("Invalid value '{value}' for axis '{axis}'")]
    InvalidAxisValue {
        /// Axis name
        axis: String,
        /// Offending value
        value: String,
    },

    /// A profile field is present but has the wrong type
    #[error("{profile}: field '{key}' has unusable value {value}")]
    InvalidField {
        /// Profile name
        profile: String,
        /// Field name
        key: String,
        /// Offending value as JSON
        value: String,
    },

    /// JIT optimization level not accepted by the backend
    #[error("Invalid {backend} optimization level '{level}' (expected one of {expected})")]
    InvalidOptLevel {
        /// Backend (`GCC` or `LLVM`)
        backend: String,
        /// Offending level
        level: String,
        /// Accepted levels, comma separated
        expected: String,
    },

    /// Configuration store could not be loaded
    #[error("Invalid configuration store {}: {reason}", .path.display())]
    InvalidStore {
        /// Store file
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// External build script failed
    #[error("Build script {} failed (exit code: {code:?})", .script.display())]
    BuildFailed {
        /// Script that was run
        script: PathBuf,
        /// Exit code, if any
        code: Option<i32>,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid regular expression
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
