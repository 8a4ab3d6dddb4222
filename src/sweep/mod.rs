//! Sweep Expander and driver
//!
//! ```rust
//! use etiss_sweep::sweep::{Axis, AxisSet};
//!
//! let axes = AxisSet::new()
//!     .with_axis(Axis::Program, ["p1"])
//!     .with_axis(Axis::Variant, ["v1", "v2"])
//!     .with_axis(Axis::Jit, ["TCC"])
//!     .with_axis(Axis::BlockSize, ["100"]);
//!
//! let combinations = axes.expand()?;
//! assert_eq!(combinations.len(), axes.total());
//! assert_eq!(combinations[1].get(Axis::Variant), Some("v2"));
//! # Ok::<(), etiss_sweep::Error>(())
//! ```

mod axis;
mod driver;
mod opt_levels;

pub use axis::{Axis, AxisSet, AxisValue, Combination, JIT_BACKENDS, NO_FAST_JIT};
pub use driver::run_sweep;
pub use opt_levels::{OptLevels, DEFAULT_OPT_LEVEL, GCC_OPT_LEVELS, LLVM_OPT_LEVELS};
