//! Resolver over the variant and program stores

use crate::env::SweepEnv;
use crate::Result;

use super::{Lookup, ProfileStore, StoreKind};

/// Holds both stores and routes lookups by [`StoreKind`].
#[derive(Debug, Clone)]
pub struct Resolver {
    variants: ProfileStore,
    programs: ProfileStore,
}

impl Resolver {
    /// Create a resolver from two loaded stores.
    #[must_use]
    pub const fn new(variants: ProfileStore, programs: ProfileStore) -> Self {
        Self { variants, programs }
    }

    /// Load both stores from the paths in `env`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStore` if either store cannot be loaded
    pub fn load(env: &SweepEnv) -> Result<Self> {
        Ok(Self::new(
            ProfileStore::load(StoreKind::Variant, &env.variant_store)?,
            ProfileStore::load(StoreKind::Program, &env.program_store)?,
        ))
    }

    /// Store of the given kind.
    #[must_use]
    pub const fn store(&self, kind: StoreKind) -> &ProfileStore {
        match kind {
            StoreKind::Variant => &self.variants,
            StoreKind::Program => &self.programs,
        }
    }

    /// Resolve a named profile in one store.
    #[must_use]
    pub fn resolve(&self, kind: StoreKind, name: &str) -> Lookup {
        self.store(kind).lookup(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrong_store_fails_distinguishably() {
        let variants = ProfileStore::from_json_str(
            StoreKind::Variant,
            r#"{"builds": {"old_decoder": {}}}"#,
        )
        .unwrap();
        let programs =
            ProfileStore::from_json_str(StoreKind::Program, r#"{"builds": {"default": {}}}"#)
                .unwrap();
        let resolver = Resolver::new(variants, programs);

        assert!(!resolver.resolve(StoreKind::Variant, "old_decoder").is_not_found());
        assert_eq!(
            resolver.resolve(StoreKind::Program, "old_decoder"),
            Lookup::NotFound {
                store: StoreKind::Program,
                name: "old_decoder".to_string()
            }
        );
    }
}
