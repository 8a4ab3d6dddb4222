//! Profile Store - one `builds.<name>` JSON document

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::{Error, Result};

/// Prefix the variant store's names may carry on the command line.
pub const VARIANT_PREFIX: &str = "etiss_";

/// Which store a profile name is looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// Build variants of the simulator executable.
    Variant,
    /// Build profiles of target programs.
    Program,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Variant => f.write_str("ETISS variant"),
            Self::Program => f.write_str("program profile"),
        }
    }
}

impl StoreKind {
    /// Normalize a user-facing name to the key used inside the store.
    ///
    /// Only the variant store strips [`VARIANT_PREFIX`].
    #[must_use]
    pub fn store_key<'a>(&self, name: &'a str) -> &'a str {
        match self {
            Self::Variant => name.strip_prefix(VARIANT_PREFIX).unwrap_or(name),
            Self::Program => name,
        }
    }
}

/// Outcome of a store lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Profile exists.
    Found(ResolvedProfile),
    /// No profile under that name.
    NotFound {
        /// Store searched
        store: StoreKind,
        /// Name as requested
        name: String,
    },
}

impl Lookup {
    /// Convert into a `Result`, mapping `NotFound` to `ConfigurationNotFound`.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigurationNotFound` for `NotFound`
    pub fn into_result(self) -> Result<ResolvedProfile> {
        match self {
            Self::Found(profile) => Ok(profile),
            Self::NotFound { store, name } => Err(Error::ConfigurationNotFound { store, name }),
        }
    }

    /// The profile, if found.
    #[must_use]
    pub fn found(self) -> Option<ResolvedProfile> {
        match self {
            Self::Found(profile) => Some(profile),
            Self::NotFound { .. } => None,
        }
    }

    /// Whether the lookup failed.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Field access result on a resolved profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field<T> {
    /// Field exists with a value of the requested type.
    Present(T),
    /// Field is missing (or `null`, or of another type).
    Absent,
}

impl<T> Field<T> {
    /// Value or the caller's default.
    pub fn unwrap_or(self, default: T) -> T {
        match self {
            Self::Present(v) => v,
            Self::Absent => default,
        }
    }

    /// Value or a lazily computed default.
    pub fn unwrap_or_else(self, f: impl FnOnce() -> T) -> T {
        match self {
            Self::Present(v) => v,
            Self::Absent => f(),
        }
    }

    /// Whether the field is present.
    pub const fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }
}

/// A profile resolved from a store: name plus its flat field mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedProfile {
    name: String,
    store: StoreKind,
    fields: BTreeMap<String, Value>,
}

impl ResolvedProfile {
    /// Create a profile from a field map.
    #[must_use]
    pub fn new(store: StoreKind, name: impl Into<String>, fields: BTreeMap<String, Value>) -> Self {
        Self {
            name: name.into(),
            store,
            fields,
        }
    }

    /// Store key of the profile (prefix stripped for variants).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store the profile came from.
    #[must_use]
    pub const fn store(&self) -> StoreKind {
        self.store
    }

    /// Raw field.
    #[must_use]
    pub fn field(&self, key: &str) -> Field<&Value> {
        match self.fields.get(key) {
            Some(Value::Null) | None => Field::Absent,
            Some(v) => Field::Present(v),
        }
    }

    /// String field. A non-string value is logged and treated as absent.
    #[must_use]
    pub fn str_field(&self, key: &str) -> Field<&str> {
        match self.field(key) {
            Field::Present(Value::String(s)) => Field::Present(s.as_str()),
            Field::Present(other) => {
                warn!(profile = %self.name, key, value = %other, "ignoring non-string profile field");
                Field::Absent
            }
            Field::Absent => Field::Absent,
        }
    }

    /// Unsigned integer field; numeric strings are accepted.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidField` if the field is present but not a
    /// non-negative integer
    pub fn u64_field(&self, key: &str) -> Result<Field<u64>> {
        let value = match self.field(key) {
            Field::Absent => return Ok(Field::Absent),
            Field::Present(value) => value,
        };
        let parsed = match value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        parsed.map(Field::Present).ok_or_else(|| Error::InvalidField {
            profile: self.name.clone(),
            key: key.to_string(),
            value: value.to_string(),
        })
    }

    /// Human-readable description, empty when absent.
    #[must_use]
    pub fn description(&self) -> &str {
        self.str_field("description").unwrap_or("")
    }
}

#[derive(Deserialize)]
struct StoreDocument {
    builds: BTreeMap<String, BTreeMap<String, Value>>,
}

/// One configuration store loaded in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileStore {
    kind: StoreKind,
    builds: BTreeMap<String, BTreeMap<String, Value>>,
}

impl ProfileStore {
    /// Empty store of the given kind.
    #[must_use]
    pub const fn empty(kind: StoreKind) -> Self {
        Self {
            kind,
            builds: BTreeMap::new(),
        }
    }

    /// Parse a store document.
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` if the text is not a `{"builds": {...}}` document
    pub fn from_json_str(kind: StoreKind, json: &str) -> Result<Self> {
        let doc: StoreDocument = serde_json::from_str(json)?;
        Ok(Self {
            kind,
            builds: doc.builds,
        })
    }

    /// Load a store document from disk.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStore` if the file is unreadable or malformed
    pub fn load<P: AsRef<Path>>(kind: StoreKind, path: P) -> Result<Self> {
        let path = path.as_ref();
        let invalid = |reason: String| Error::InvalidStore {
            path: path.to_path_buf(),
            reason,
        };
        let text = fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        Self::from_json_str(kind, &text).map_err(|e| invalid(e.to_string()))
    }

    /// Kind of this store.
    #[must_use]
    pub const fn kind(&self) -> StoreKind {
        self.kind
    }

    /// Profile names in key order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.builds.keys().map(String::as_str)
    }

    /// Look up a profile by user-facing name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Lookup {
        let key = self.kind.store_key(name);
        match self.builds.get(key) {
            Some(fields) => Lookup::Found(ResolvedProfile::new(self.kind, key, fields.clone())),
            None => Lookup::NotFound {
                store: self.kind,
                name: name.to_string(),
            },
        }
    }
}
