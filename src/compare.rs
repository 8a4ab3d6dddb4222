//! Comparative Analyzer
//!
//! Pairs run records from two result sets that agree on a chosen subset of
//! axes and derives a percentage from their durations:
//!
//! - overhead:    `(a - b) / b * 100`, `a` is the with-feature run
//! - improvement: `(a - b) / a * 100`, `a` is the old run, `b` the new one
//!
//! Records without a counterpart, or whose run failed, still produce a row
//! with [`Metric::NotAvailable`] so incomplete coverage stays visible.
//!
//! ```rust
//! use etiss_sweep::compare::{compare, Direction, Metric};
//! use etiss_sweep::experiment::RunRecord;
//! use etiss_sweep::sweep::{Axis, Combination};
//!
//! let run = |variant: &str, secs: f64| {
//!     RunRecord::builder(Combination::from_pairs([
//!         (Axis::Profile, "default"),
//!         (Axis::Variant, variant),
//!     ]))
//!     .duration_secs(secs)
//!     .build()
//! };
//!
//! let rows = compare(&[run("stats", 1.2)], &[run("nostats", 1.0)], &[Axis::Profile], Direction::Overhead);
//! assert_eq!(rows.len(), 1);
//! assert!(matches!(rows[0].metric, Metric::Percent(p) if (p - 20.0).abs() < 1e-9));
//! ```

use std::fmt::{self, Write as _};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::experiment::{AggregateResult, RunRecord};
use crate::sweep::Axis;
use crate::{Error, Result};

/// Which percentage to derive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Cost of a feature: `(a - b) / b`
    Overhead,
    /// Gain of a new implementation: `(a - b) / a`
    Improvement,
}

impl Direction {
    /// Percentage between two durations.
    ///
    /// # Errors
    ///
    /// Returns `Error::DivisionByZero` when the baseline is zero
    pub fn percent(self, a: f64, b: f64) -> Result<f64> {
        let baseline = match self {
            Self::Overhead => b,
            Self::Improvement => a,
        };
        if baseline == 0.0 {
            return Err(Error::DivisionByZero);
        }
        Ok((a - b) / baseline * 100.0)
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "overhead" => Ok(Self::Overhead),
            "improvement" => Ok(Self::Improvement),
            other => Err(Error::Other(format!(
                "Unknown comparison direction '{other}' (expected overhead or improvement)"
            ))),
        }
    }
}

/// Derived value of one comparison row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Metric {
    /// Percentage difference
    Percent(f64),
    /// One side missing or failed
    NotAvailable,
    /// Zero-duration baseline
    DivisionByZero,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Percent(p) => write!(f, "{p:+.2}%"),
            Self::NotAvailable => f.write_str("N/A"),
            Self::DivisionByZero => f.write_str("div/0"),
        }
    }
}

/// One compared pair (or an unmatched record).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    /// Values of the matching axes
    pub key: Vec<Option<String>>,
    /// Duration on side A, if it ran successfully
    pub duration_a: Option<f64>,
    /// Duration on side B, if it ran successfully
    pub duration_b: Option<f64>,
    /// Derived percentage
    pub metric: Metric,
}

impl ComparisonRow {
    fn new(key: Vec<Option<String>>, a: Option<&RunRecord>, b: Option<&RunRecord>, direction: Direction) -> Self {
        let duration_a = a.and_then(success_duration);
        let duration_b = b.and_then(success_duration);
        let metric = match (duration_a, duration_b) {
            (Some(a), Some(b)) => match direction.percent(a, b) {
                Ok(p) => Metric::Percent(p),
                Err(_) => Metric::DivisionByZero,
            },
            _ => Metric::NotAvailable,
        };
        Self {
            key,
            duration_a,
            duration_b,
            metric,
        }
    }
}

fn success_duration(record: &RunRecord) -> Option<f64> {
    record.is_success().then(|| record.duration_secs())
}

/// Compare two record sets on `matching` axes.
///
/// Rows follow side A's order (one per matching pair), then any side-B
/// records no A record matched.
#[must_use]
pub fn compare(a: &[RunRecord], b: &[RunRecord], matching: &[Axis], direction: Direction) -> Vec<ComparisonRow> {
    let b_keys: Vec<_> = b.iter().map(|r| r.combination().key(matching)).collect();
    let mut b_matched = vec![false; b.len()];
    let mut rows = Vec::with_capacity(a.len().max(b.len()));

    for ra in a {
        let key = ra.combination().key(matching);
        let mut matched = false;
        for (j, rb) in b.iter().enumerate() {
            if b_keys[j] == key {
                matched = true;
                b_matched[j] = true;
                rows.push(ComparisonRow::new(key.clone(), Some(ra), Some(rb), direction));
            }
        }
        if !matched {
            rows.push(ComparisonRow::new(key, Some(ra), None, direction));
        }
    }

    for (j, rb) in b.iter().enumerate() {
        if !b_matched[j] {
            rows.push(ComparisonRow::new(b_keys[j].clone(), None, Some(rb), direction));
        }
    }
    rows
}

/// Compare filtered selections of two aggregates.
#[must_use]
pub fn compare_aggregates(
    a: (&AggregateResult, &[(Axis, String)]),
    b: (&AggregateResult, &[(Axis, String)]),
    matching: &[Axis],
    direction: Direction,
) -> Vec<ComparisonRow> {
    compare(&a.0.filter(a.1), &b.0.filter(b.1), matching, direction)
}

/// Plain-text table of comparison rows.
#[must_use]
pub fn render_table(rows: &[ComparisonRow], matching: &[Axis]) -> String {
    let mut out = String::new();
    for axis in matching {
        let _ = write!(out, "{:<16}", axis.name());
    }
    let _ = writeln!(out, "{:>12} {:>12} {:>10}", "a (s)", "b (s)", "delta");

    let secs = |d: Option<f64>| d.map_or_else(|| "N/A".to_string(), |d| format!("{d:.4}"));
    for row in rows {
        for value in &row.key {
            let _ = write!(out, "{:<16}", value.as_deref().unwrap_or("-"));
        }
        let _ = writeln!(
            out,
            "{:>12} {:>12} {:>10}",
            secs(row.duration_a),
            secs(row.duration_b),
            row.metric.to_string()
        );
    }
    out
}
