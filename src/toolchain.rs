//! Build passthrough to the external build scripts

use std::path::PathBuf;
use std::process::Command;

use tracing::info;

use crate::env::SweepEnv;
use crate::profile::{StoreKind, VARIANT_PREFIX};
use crate::{Error, Result};

/// Script building target programs.
pub const BUILD_EXAMPLES_SCRIPT: &str = "build-examples.sh";
/// Script building simulator variants.
pub const BUILD_ETISS_SCRIPT: &str = "build-etiss.sh";

/// Invokes the build scripts in `SWEEP_SCRIPTS_DIR`.
#[derive(Debug, Clone, Copy)]
pub struct Toolchain<'a> {
    env: &'a SweepEnv,
}

impl<'a> Toolchain<'a> {
    /// Toolchain for an environment.
    #[must_use]
    pub const fn new(env: &'a SweepEnv) -> Self {
        Self { env }
    }

    /// Arguments for building a program with a profile.
    #[must_use]
    pub fn program_args(profile: &str, program: &str, clean: bool) -> Vec<String> {
        let mut args = vec![
            "--profile".to_string(),
            profile.to_string(),
            "--program".to_string(),
            program.to_string(),
        ];
        if clean {
            args.push("--clean".to_string());
        }
        args
    }

    /// Arguments for building a simulator variant (always prefixed).
    #[must_use]
    pub fn variant_args(variant: &str, clean: bool) -> Vec<String> {
        let key = StoreKind::Variant.store_key(variant);
        let mut args = vec!["--variant".to_string(), format!("{VARIANT_PREFIX}{key}")];
        if clean {
            args.push("--clean".to_string());
        }
        args
    }

    /// Build one program with one profile.
    ///
    /// # Errors
    ///
    /// Returns `Error::BuildFailed` if the script exits unsuccessfully
    pub fn build_program(&self, profile: &str, program: &str, clean: bool) -> Result<()> {
        info!(program, profile, "building program");
        self.run(BUILD_EXAMPLES_SCRIPT, &Self::program_args(profile, program, clean))
    }

    /// Build one simulator variant.
    ///
    /// # Errors
    ///
    /// Returns `Error::BuildFailed` if the script exits unsuccessfully
    pub fn build_variant(&self, variant: &str, clean: bool) -> Result<()> {
        info!(variant, "building ETISS variant");
        self.run(BUILD_ETISS_SCRIPT, &Self::variant_args(variant, clean))
    }

    fn run(&self, script: &str, args: &[String]) -> Result<()> {
        let script: PathBuf = self.env.scripts_dir.join(script);
        let status = Command::new(&script).args(args).status()?;
        if status.success() {
            Ok(())
        } else {
            Err(Error::BuildFailed {
                script,
                code: status.code(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_args_prefixed_once() {
        assert_eq!(Toolchain::variant_args("fast", false), ["--variant", "etiss_fast"]);
        assert_eq!(
            Toolchain::variant_args("etiss_fast", true),
            ["--variant", "etiss_fast", "--clean"]
        );
    }

    #[test]
    fn test_program_args() {
        assert_eq!(
            Toolchain::program_args("default", "dhry", true),
            ["--profile", "default", "--program", "dhry", "--clean"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_missing_script_errors() {
        let env = SweepEnv::from_vars(&std::collections::BTreeMap::new(), std::path::Path::new("/nonexistent"));
        assert!(Toolchain::new(&env).build_variant("x", false).is_err());
    }
}
