//! Temporary configuration overlay passed after the program's own ini

use std::fmt::Write as _;
use std::io::Write as _;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::sweep::OptLevels;
use crate::Result;

/// Log verbosity written into every overlay.
pub const LOG_LEVEL: u32 = 4;

/// Settings for one run's overlay file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlay<'a> {
    /// Primary JIT backend (`TCC`, `GCC`, `LLVM`)
    pub jit: &'a str,
    /// Fast JIT backend, if tiered compilation is on
    pub fast_jit: Option<&'a str>,
    /// Where the simulator should write JIT statistics
    pub stats_path: Option<&'a Path>,
    /// Background optimization threads
    pub optimization_threads: Option<u64>,
    /// Maximum translation block size
    pub block_size: u64,
    /// GCC and LLVM backend optimization levels
    pub opt_levels: &'a OptLevels,
}

impl Overlay<'_> {
    /// Render as an ETISS ini document.
    #[must_use]
    pub fn render(&self) -> String {
        let mut ini = String::from("[StringConfigurations]\n");
        let _ = writeln!(ini, "jit.type={}JIT", self.jit);
        if let Some(fast) = self.fast_jit {
            let _ = writeln!(ini, "jit.fast_type={fast}JIT");
        }
        if let Some(path) = self.stats_path {
            let _ = writeln!(ini, "jit.stats_json={}", path.display());
        }
        let _ = writeln!(ini, "jit.gcc.opt_level={}", self.opt_levels.gcc());
        let _ = writeln!(ini, "jit.llvm.opt_level={}", self.opt_levels.llvm());

        ini.push_str("\n[IntConfigurations]\n");
        let _ = writeln!(ini, "etiss.max_block_size={}", self.block_size);
        if let Some(threads) = self.optimization_threads {
            let _ = writeln!(ini, "jit.optimization_threads={threads}");
        }
        let _ = writeln!(ini, "etiss.loglevel={LOG_LEVEL}");

        ini.push_str("\n[BoolConfigurations]\njit.debug=false\n");
        ini
    }

    /// Write to a temporary file that is deleted when the handle drops.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be created or written
    pub fn materialize(&self) -> Result<NamedTempFile> {
        let mut file = tempfile::Builder::new()
            .prefix("etiss-overlay-")
            .suffix(".ini")
            .tempfile()?;
        file.write_all(self.render().as_bytes())?;
        file.flush()?;
        Ok(file)
    }
}
