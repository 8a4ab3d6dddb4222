//! Simulator invocation

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};

use tracing::{debug, warn};

use crate::{Error, Result};

/// Typed result of one simulator process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimOutcome {
    /// Exit status 0.
    Success,
    /// Nonzero exit code.
    Exited(i32),
    /// Killed by a signal.
    Signaled(i32),
}

impl SimOutcome {
    /// Whether the simulator succeeded.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    /// `Ok(())` on success, `SimulatorExecutionFailure` otherwise.
    ///
    /// # Errors
    ///
    /// Returns `Error::SimulatorExecutionFailure` for any non-success outcome
    pub fn into_result(self) -> Result<()> {
        match self {
            Self::Success => Ok(()),
            Self::Exited(code) => Err(Error::SimulatorExecutionFailure {
                code: Some(code),
                signal: None,
            }),
            Self::Signaled(signal) => Err(Error::SimulatorExecutionFailure {
                code: None,
                signal: Some(signal),
            }),
        }
    }

    fn from_status(status: ExitStatus) -> Self {
        if status.success() {
            return Self::Success;
        }
        if let Some(code) = status.code() {
            return Self::Exited(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Self::Signaled(signal);
            }
        }
        Self::Exited(-1)
    }
}

/// Outcome of one simulator process plus what it printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimOutput {
    /// Exit classification
    pub outcome: SimOutcome,
    /// Captured standard output
    pub stdout: String,
}

impl From<SimOutcome> for SimOutput {
    fn from(outcome: SimOutcome) -> Self {
        Self {
            outcome,
            stdout: String::new(),
        }
    }
}

/// Fully-resolved command line for one simulator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Simulator executable
    pub program: PathBuf,
    /// Arguments: layered `-i<ini>` files then `--arch.cpu=<arch>`
    pub args: Vec<OsString>,
}

/// Something that can run the simulator.
///
/// Blocks until the run finishes. Spawn failures are `Err`; a process that
/// ran and failed is `Ok` with a non-success outcome.
pub trait Simulator {
    /// Run one invocation to completion.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the process could not be started
    fn invoke(&self, invocation: &Invocation) -> Result<SimOutput>;
}

/// Runs the real simulator binary as a child process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessSimulator;

impl Simulator for ProcessSimulator {
    fn invoke(&self, invocation: &Invocation) -> Result<SimOutput> {
        debug!(program = %invocation.program.display(), args = ?invocation.args, "spawning simulator");
        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .output()?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            warn!(stderr = %stderr.trim_end(), "simulator stderr");
        }
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(stdout = %stdout.trim_end(), "simulator stdout");

        Ok(SimOutput {
            outcome: SimOutcome::from_status(output.status),
            stdout,
        })
    }
}
