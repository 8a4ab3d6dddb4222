//! JIT backend optimization levels (sweep-wide, not swept)

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Levels the GCC JIT accepts.
pub const GCC_OPT_LEVELS: &[&str] = &["0", "1", "2", "3", "s", "fast"];

/// Levels the LLVM JIT accepts.
pub const LLVM_OPT_LEVELS: &[&str] = &["0", "1", "2", "3", "s", "z", "fast"];

/// Level used when none is given.
pub const DEFAULT_OPT_LEVEL: &str = "3";

/// Optimization levels handed to the GCC and LLVM backends on every run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptLevels {
    gcc: String,
    llvm: String,
}

impl OptLevels {
    /// Validated pair of levels.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidOptLevel` if either level is not accepted by its backend
    pub fn new(gcc: impl Into<String>, llvm: impl Into<String>) -> Result<Self> {
        let gcc = gcc.into();
        let llvm = llvm.into();
        check("GCC", &gcc, GCC_OPT_LEVELS)?;
        check("LLVM", &llvm, LLVM_OPT_LEVELS)?;
        Ok(Self { gcc, llvm })
    }

    /// GCC JIT level.
    #[must_use]
    pub fn gcc(&self) -> &str {
        &self.gcc
    }

    /// LLVM JIT level.
    #[must_use]
    pub fn llvm(&self) -> &str {
        &self.llvm
    }
}

impl Default for OptLevels {
    fn default() -> Self {
        Self {
            gcc: DEFAULT_OPT_LEVEL.to_string(),
            llvm: DEFAULT_OPT_LEVEL.to_string(),
        }
    }
}

fn check(backend: &str, level: &str, accepted: &[&str]) -> Result<()> {
    if accepted.contains(&level) {
        return Ok(());
    }
    Err(Error::InvalidOptLevel {
        backend: backend.to_string(),
        level: level.to_string(),
        expected: accepted.join(", "),
    })
}
