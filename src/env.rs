//! Sweep environment: paths and toolchain locations
//!
//! Loaded once at startup and passed by reference everywhere else. Nothing
//! below `main` reads the process environment on its own.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{Error, Result};

/// Environment file read when none is given, relative to the base directory
pub const DEFAULT_ENV_CONF: &str = "config/env.conf";

/// Default simulator executable name inside a variant's install tree
pub const DEFAULT_ETISS_BINARY: &str = "bare_etiss_processor";

/// Environment keys understood by [`SweepEnv`]
pub const KEYS: &[&str] = &[
    "ETISS_ROOT",
    "EXAMPLES_ROOT",
    "SWEEP_SCRIPTS_DIR",
    "SWEEP_RESULTS_DIR",
    "ETISS_BUILDS_JSON",
    "EXAMPLE_BUILDS_JSON",
    "ETISS_BINARY",
];

/// Immutable sweep environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepEnv {
    /// ETISS source/build tree
    pub etiss_root: PathBuf,
    /// Target program tree
    pub examples_root: PathBuf,
    /// Directory holding `build-examples.sh` and `build-etiss.sh`
    pub scripts_dir: PathBuf,
    /// Root of persisted sweep output
    pub results_dir: PathBuf,
    /// Variant store (`etiss-builds.json`)
    pub variant_store: PathBuf,
    /// Program-build profile store (`example-builds.json`)
    pub program_store: PathBuf,
    /// Simulator executable name
    pub etiss_binary: String,
}

impl SweepEnv {
    /// Build from a flat key/value map, filling defaults relative to `base`.
    #[must_use]
    pub fn from_vars(vars: &BTreeMap<String, String>, base: &Path) -> Self {
        let path = |key: &str, default: PathBuf| {
            vars.get(key)
                .filter(|v| !v.is_empty())
                .map_or(default, PathBuf::from)
        };

        let config_dir = base.join("config");
        Self {
            etiss_root: path("ETISS_ROOT", base.join("etiss")),
            examples_root: path("EXAMPLES_ROOT", base.join("etiss_riscv_examples")),
            scripts_dir: path("SWEEP_SCRIPTS_DIR", base.join("scripts")),
            results_dir: path("SWEEP_RESULTS_DIR", base.join("results")),
            variant_store: path("ETISS_BUILDS_JSON", config_dir.join("etiss-builds.json")),
            program_store: path("EXAMPLE_BUILDS_JSON", config_dir.join("example-builds.json")),
            etiss_binary: vars
                .get("ETISS_BINARY")
                .filter(|v| !v.is_empty())
                .cloned()
                .unwrap_or_else(|| DEFAULT_ETISS_BINARY.to_string()),
        }
    }

    /// Load from the process environment, overlaid with `env.conf`.
    ///
    /// `env_file` wins; without it `<base>/config/env.conf` is read if present.
    ///
    /// # Errors
    ///
    /// Returns error if `env_file` is given but cannot be read
    pub fn load(env_file: Option<&Path>, base: &Path) -> Result<Self> {
        let mut vars: BTreeMap<String, String> = std::env::vars()
            .filter(|(k, _)| KEYS.contains(&k.as_str()))
            .collect();

        let default_conf = base.join(DEFAULT_ENV_CONF);
        let conf = match env_file {
            Some(file) => Some(file),
            None if default_conf.is_file() => Some(default_conf.as_path()),
            None => None,
        };
        if let Some(file) = conf {
            debug!(path = %file.display(), "reading environment file");
            let text = fs::read_to_string(file).map_err(|e| {
                Error::Other(format!("Failed to read {}: {e}", file.display()))
            })?;
            vars.extend(parse_env_conf(&text));
        }

        Ok(Self::from_vars(&vars, base))
    }
}

/// Parse `KEY=VALUE` lines (with optional `export ` and quotes).
///
/// `$VAR` and `${VAR}` in unquoted or double-quoted values expand against
/// keys defined earlier in the file, then the process environment; unset
/// variables expand to nothing. Single-quoted values are taken literally.
/// Comments, blank lines and anything without `=` are skipped.
#[must_use]
pub fn parse_env_conf(text: &str) -> BTreeMap<String, String> {
    parse_env_conf_with(text, |name| std::env::var(name).ok())
}

/// [`parse_env_conf`] with an explicit fallback lookup for variables the
/// file itself does not define.
pub fn parse_env_conf_with<F>(text: &str, fallback: F) -> BTreeMap<String, String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut vars = BTreeMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line).trim_start();
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim();
        let literal = value
            .strip_prefix('\'')
            .and_then(|v| v.strip_suffix('\''));
        let value = if let Some(literal) = literal {
            literal.to_string()
        } else {
            let raw = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            shellexpand::env_with_context_no_errors(raw, |name: &str| {
                Some(
                    vars.get(name)
                        .cloned()
                        .or_else(|| fallback(name))
                        .unwrap_or_default(),
                )
            })
            .into_owned()
        };
        vars.insert(key.trim().to_string(), value);
    }
    vars
}
