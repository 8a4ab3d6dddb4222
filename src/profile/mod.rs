//! Configuration Resolver
//!
//! Two independent JSON stores map profile names to flat configuration
//! objects:
//!
//! ```text
//! etiss-builds.json    { "builds": { "<variant>": { ... } } }   StoreKind::Variant
//! example-builds.json  { "builds": { "<profile>": { ... } } }   StoreKind::Program
//! ```
//!
//! Lookups return [`Lookup`] (found / not found) and field access returns
//! [`Field`] (present / absent), so a missing profile and a missing field
//! never look the same to the caller.
//!
//! ## Usage
//!
//! ```rust
//! use etiss_sweep::profile::{Field, ProfileStore, Resolver, StoreKind};
//!
//! let variants = ProfileStore::from_json_str(
//!     StoreKind::Variant,
//!     r#"{"builds": {"fast": {"build_dir": "build_fast"}}}"#,
//! )?;
//! let programs = ProfileStore::from_json_str(StoreKind::Program, r#"{"builds": {}}"#)?;
//! let resolver = Resolver::new(variants, programs);
//!
//! let profile = resolver.resolve(StoreKind::Variant, "etiss_fast").found().unwrap();
//! assert_eq!(profile.name(), "fast");
//! assert_eq!(profile.str_field("build_dir"), Field::Present("build_fast"));
//! assert_eq!(profile.u64_field("runs")?, Field::Absent);
//! # Ok::<(), etiss_sweep::Error>(())
//! ```

mod resolver;
mod store;

pub use resolver::Resolver;
pub use store::{Field, Lookup, ProfileStore, ResolvedProfile, StoreKind, VARIANT_PREFIX};
