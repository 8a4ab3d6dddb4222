//! Axes, combinations and cartesian expansion

use std::fmt::{self, Write as _};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::profile::StoreKind;
use crate::{Error, Result};

/// JIT backends the simulator accepts.
pub const JIT_BACKENDS: &[&str] = &["GCC", "TCC", "LLVM"];

/// Value of the fast-JIT axis meaning "no fast JIT".
pub const NO_FAST_JIT: &str = "None";

/// One swept configuration dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Target program
    Program,
    /// Program build profile
    Profile,
    /// Simulator build variant
    Variant,
    /// Primary JIT backend
    Jit,
    /// Fast JIT backend for tiered compilation
    FastJit,
    /// Background optimization thread count
    OptimizationThreads,
    /// Translation block size bound
    BlockSize,
}

impl Axis {
    /// All axes, in the order used for artifact names.
    pub const ALL: [Self; 7] = [
        Self::Program,
        Self::Profile,
        Self::Variant,
        Self::Jit,
        Self::FastJit,
        Self::OptimizationThreads,
        Self::BlockSize,
    ];

    /// Axes every executable combination must carry.
    pub const REQUIRED: [Self; 5] = [
        Self::Program,
        Self::Profile,
        Self::Variant,
        Self::Jit,
        Self::BlockSize,
    ];

    /// Stable axis name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Program => "program",
            Self::Profile => "profile",
            Self::Variant => "variant",
            Self::Jit => "jit",
            Self::FastJit => "fast_jit",
            Self::OptimizationThreads => "optimization_threads",
            Self::BlockSize => "block_size",
        }
    }

    fn validate(self, value: &str) -> Result<()> {
        let ok = match self {
            Self::Program | Self::Profile | Self::Variant => !value.trim().is_empty(),
            Self::Jit => JIT_BACKENDS.contains(&value),
            Self::FastJit => value == NO_FAST_JIT || JIT_BACKENDS.contains(&value),
            Self::OptimizationThreads | Self::BlockSize => value.parse::<u64>().is_ok(),
        };
        if ok {
            Ok(())
        } else {
            Err(Error::InvalidAxisValue {
                axis: self.name().to_string(),
                value: value.to_string(),
            })
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Axis {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|axis| {
                axis.name() == normalized
                    || (normalized == "threads" && *axis == Self::OptimizationThreads)
            })
            .ok_or_else(|| Error::Other(format!("Unknown axis '{s}'")))
    }
}

/// Ordered set of axes with their ordered values.
///
/// Declaration order is iteration order: the first axis declared is the
/// outermost loop of the expansion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisSet {
    axes: Vec<(Axis, Vec<String>)>,
}

impl AxisSet {
    /// Empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self { axes: Vec::new() }
    }

    /// Declare an axis. Re-declaring an axis replaces its values in place.
    #[must_use]
    pub fn with_axis<I, V>(mut self, axis: Axis, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if let Some(slot) = self.axes.iter_mut().find(|(a, _)| *a == axis) {
            slot.1 = values;
        } else {
            self.axes.push((axis, values));
        }
        self
    }

    /// Declared axes in order.
    #[must_use]
    pub fn axes(&self) -> &[(Axis, Vec<String>)] {
        &self.axes
    }

    /// Values of one axis, if declared.
    #[must_use]
    pub fn values(&self, axis: Axis) -> Option<&[String]> {
        self.axes
            .iter()
            .find(|(a, _)| *a == axis)
            .map(|(_, v)| v.as_slice())
    }

    /// Validate and normalize: reject empty axes and bad values, drop
    /// duplicate values (first occurrence wins).
    ///
    /// # Errors
    ///
    /// Returns `Error::EmptyAxis` or `Error::InvalidAxisValue`
    pub fn normalized(&self) -> Result<Self> {
        let mut axes = Vec::with_capacity(self.axes.len());
        for (axis, values) in &self.axes {
            if values.is_empty() {
                return Err(Error::EmptyAxis(axis.name().to_string()));
            }
            let mut unique: Vec<String> = Vec::with_capacity(values.len());
            for value in values {
                axis.validate(value)?;
                if unique.contains(value) {
                    warn!(axis = %axis, value = %value, "dropping duplicate axis value");
                } else {
                    unique.push(value.clone());
                }
            }
            axes.push((*axis, unique));
        }
        Ok(Self { axes })
    }

    /// Require the given axes to be declared.
    ///
    /// # Errors
    ///
    /// Returns `Error::EmptyAxis` naming the first missing axis
    pub fn require(&self, required: &[Axis]) -> Result<()> {
        match required.iter().find(|axis| self.values(**axis).is_none()) {
            Some(missing) => Err(Error::EmptyAxis(missing.name().to_string())),
            None => Ok(()),
        }
    }

    /// Number of combinations `expand` yields (product of cardinalities).
    #[must_use]
    pub fn total(&self) -> usize {
        if self.axes.is_empty() {
            return 0;
        }
        self.axes.iter().map(|(_, v)| v.len()).product()
    }

    /// Cartesian product in declaration order.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`AxisSet::normalized`]
    pub fn expand(&self) -> Result<Vec<Combination>> {
        let axes = self.normalized()?;
        if axes.axes.is_empty() {
            return Ok(Vec::new());
        }

        let mut combinations: Vec<Vec<AxisValue>> = vec![Vec::new()];
        for (axis, values) in &axes.axes {
            combinations = combinations
                .into_iter()
                .flat_map(|prefix| {
                    values.iter().map(move |value| {
                        let mut next = prefix.clone();
                        next.push(AxisValue {
                            axis: *axis,
                            value: value.clone(),
                        });
                        next
                    })
                })
                .collect();
        }

        Ok(combinations
            .into_iter()
            .map(|values| Combination { values })
            .collect())
    }
}

/// One axis assignment inside a combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AxisValue {
    /// Axis
    pub axis: Axis,
    /// Assigned value
    pub value: String,
}

/// One value per declared axis.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Combination {
    values: Vec<AxisValue>,
}

impl Combination {
    /// Build directly from assignments (order preserved).
    #[must_use]
    pub fn from_pairs<I, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (Axis, V)>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(axis, value)| AxisValue {
                    axis,
                    value: value.into(),
                })
                .collect(),
        }
    }

    /// Assignments in declaration order.
    #[must_use]
    pub fn values(&self) -> &[AxisValue] {
        &self.values
    }

    /// Value assigned to `axis`.
    #[must_use]
    pub fn get(&self, axis: Axis) -> Option<&str> {
        self.values
            .iter()
            .find(|v| v.axis == axis)
            .map(|v| v.value.as_str())
    }

    /// Fast JIT backend, `None` when absent or explicitly disabled.
    #[must_use]
    pub fn fast_jit(&self) -> Option<&str> {
        self.get(Axis::FastJit).filter(|v| *v != NO_FAST_JIT)
    }

    /// Values on `axes`, in the order given. Used as a comparison key.
    #[must_use]
    pub fn key(&self, axes: &[Axis]) -> Vec<Option<String>> {
        axes.iter()
            .map(|axis| self.get(*axis).map(|v| display_value(*axis, v)))
            .collect()
    }

    /// Whether every `(axis, value)` filter matches this combination.
    #[must_use]
    pub fn matches(&self, filters: &[(Axis, String)]) -> bool {
        filters.iter().all(|(axis, value)| {
            self.get(*axis)
                .is_some_and(|v| display_value(*axis, v) == display_value(*axis, value))
        })
    }

    /// Deterministic artifact file stem.
    ///
    /// `program_profile-P_variant-V_jit-J[_fast-F][_threads-T]_block-B`,
    /// independent of declaration order and with the variant prefix removed.
    #[must_use]
    pub fn artifact_name(&self) -> String {
        let mut parts = Vec::new();
        for axis in Axis::ALL {
            let Some(value) = self.get(axis) else {
                continue;
            };
            let value = sanitize(&display_value(axis, value));
            let part = match axis {
                Axis::Program => value,
                Axis::Profile => format!("profile-{value}"),
                Axis::Variant => format!("variant-{value}"),
                Axis::Jit => format!("jit-{value}"),
                Axis::FastJit if self.fast_jit().is_some() => format!("fast-{value}"),
                Axis::FastJit => continue,
                Axis::OptimizationThreads => format!("threads-{value}"),
                Axis::BlockSize => format!("block-{value}"),
            };
            parts.push(part);
        }
        parts.join("_")
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for v in &self.values {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{}={}", v.axis, v.value)?;
        }
        Ok(())
    }
}

/// Filename-safe, injective encoding: `[A-Za-z0-9._-]` pass through, every
/// other byte becomes `%XX`.
fn sanitize(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_') {
            out.push(char::from(byte));
        } else {
            let _ = write!(out, "%{byte:02X}");
        }
    }
    out
}

fn display_value(axis: Axis, value: &str) -> String {
    match axis {
        Axis::Variant => StoreKind::Variant.store_key(value).to_string(),
        _ => value.to_string(),
    }
}
