//! JIT statistics artifact written by the simulator
//!
//! The simulator dumps one JSON document per run when `jit.stats_json` is
//! set. Every section and field is optional; missing values read as zero.
//! Without a document, the performance section can still be recovered from
//! the summary lines the simulator prints on stdout.

// Field names mirror the simulator's JSON keys.
#![allow(missing_docs)]

use std::fs;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Parsed statistics artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JitStats {
    /// Throughput and timing
    pub performance: PerformanceStats,
    /// Block compilation
    pub compilation: CompilationStats,
    /// Block execution
    pub execution: ExecutionStats,
    /// Background optimization
    pub optimization: OptimizationStats,
    /// Translation cache
    pub cache: CacheStats,
}

/// `performance` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceStats {
    pub mips_estimated: f64,
    pub mips_corrected: f64,
    pub simulation_time_s: f64,
    pub wall_time_s: f64,
    pub cpu_cycles: f64,
    pub cpu_time_s: f64,
}

/// `compilation` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilationStats {
    pub unique_blocks: u64,
    pub fast_jit_blocks: u64,
    pub optimizing_jit_blocks: u64,
    pub total_time_s: f64,
    pub fast_jit_time_s: f64,
    pub optimizing_jit_time_s: f64,
    pub avg_fast_jit_time_ms: f64,
    pub avg_optimizing_jit_time_ms: f64,
    pub fast_jit_speedup: f64,
    pub compilation_percentage: f64,
    pub execution_percentage: f64,
}

/// `execution` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionStats {
    pub total_block_executions: u64,
    pub fast_jit_executions: u64,
    pub optimized_executions: u64,
    pub fast_jit_exec_percentage: f64,
    pub optimized_exec_percentage: f64,
    pub block_execution_time_ms: f64,
}

/// `optimization` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationStats {
    pub blocks_optimized: u64,
    pub blocks_switched: u64,
    pub optimization_success_rate: f64,
    pub switch_rate: f64,
    pub avg_executions_before_switch: f64,
}

/// `cache` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheStats {
    pub total_lookups: u64,
    pub sequential_hits: u64,
    pub branch_hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub miss_rate: f64,
}

/// Summary lines the simulator prints on exit.
const STDOUT_METRICS: &str = r"(MIPS \(estimated\)|MIPS \(corrected\)|Simulation Time|Wallclock Time|CPU Cycles \(estimated\)): ([\d.e+-]+)";

impl PerformanceStats {
    /// Recover performance figures from the simulator's stdout summary.
    ///
    /// Returns `None` when none of the summary lines are present.
    ///
    /// # Errors
    ///
    /// Returns `Error::Regex` if the summary pattern fails to compile
    pub fn from_stdout(stdout: &str) -> Result<Option<Self>> {
        let pattern = Regex::new(STDOUT_METRICS)?;
        let mut stats = Self::default();
        let mut found = false;

        for caps in pattern.captures_iter(stdout) {
            let Ok(value) = caps[2].parse::<f64>() else {
                continue;
            };
            let slot = match &caps[1] {
                "MIPS (estimated)" => &mut stats.mips_estimated,
                "MIPS (corrected)" => &mut stats.mips_corrected,
                "Simulation Time" => &mut stats.simulation_time_s,
                "Wallclock Time" => &mut stats.wall_time_s,
                _ => &mut stats.cpu_cycles,
            };
            *slot = value;
            found = true;
        }
        Ok(found.then_some(stats))
    }
}

impl JitStats {
    /// Statistics carrying only the stdout performance summary.
    ///
    /// # Errors
    ///
    /// Returns `Error::Regex` if the summary pattern fails to compile
    pub fn from_stdout(stdout: &str) -> Result<Option<Self>> {
        Ok(PerformanceStats::from_stdout(stdout)?.map(|performance| Self {
            performance,
            ..Self::default()
        }))
    }

    /// Parse a statistics document.
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` if the text is not a JSON object
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a statistics artifact.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` or `Error::Json`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }
}
