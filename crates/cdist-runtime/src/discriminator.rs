//! Type discriminators.
//!
//! A discriminator names the concrete type of a serialized payload as a
//! `(name, version)` pair. On the wire it appears either as a single
//! `type` string (`"ociRegistry/v1"`) or as split `kind` + `version`
//! fields; both normalize to the same value here and the split form never
//! leaks past the parsing boundary.

use regex_lite::Regex;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::OnceLock;

/// Version string assumed when a type name carries no version suffix.
pub const DEFAULT_VERSION: &str = "v1";

fn version_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^v[0-9]+([a-z][a-z0-9]*)?$").unwrap())
}

/// Identifies one member of a type family.
///
/// Two discriminators are equal iff name and version match exactly;
/// comparison is case-sensitive. A missing version is distinct from any
/// explicit version, including `v1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Discriminator {
    name: String,
    version: Option<String>,
}

impl Discriminator {
    /// An unversioned discriminator.
    pub fn new(name: impl Into<String>) -> Self {
        Discriminator {
            name: name.into(),
            version: None,
        }
    }

    /// A discriminator with an explicit version.
    pub fn versioned(name: impl Into<String>, version: impl Into<String>) -> Self {
        Discriminator {
            name: name.into(),
            version: Some(version.into()),
        }
    }

    /// Parses a combined type string.
    ///
    /// The last `/`-separated segment is treated as the version iff it
    /// looks like one (`v1`, `v2alpha1`, ...); everything else belongs to
    /// the name, which may itself contain slashes
    /// (`acme.org/credentials/v1` has name `acme.org/credentials`).
    pub fn parse(s: &str) -> Self {
        if let Some(idx) = s.rfind('/') {
            let (name, tail) = (&s[..idx], &s[idx + 1..]);
            if !name.is_empty() && version_suffix_re().is_match(tail) {
                return Discriminator::versioned(name, tail);
            }
        }
        Discriminator::new(s)
    }

    /// Normalizes the split `kind` + `version` wire representation.
    pub fn from_fields(kind: &str, version: Option<&str>) -> Self {
        match version {
            Some(v) if !v.is_empty() => Discriminator::versioned(kind, v),
            _ => Discriminator::parse(kind),
        }
    }

    /// The type name without any version.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// The effective version, defaulting to [`DEFAULT_VERSION`].
    pub fn version_or_default(&self) -> &str {
        self.version.as_deref().unwrap_or(DEFAULT_VERSION)
    }

    pub fn is_versioned(&self) -> bool {
        self.version.is_some()
    }

    /// The combined `name/version` form (just the name when unversioned).
    pub fn formatted(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Discriminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}/{}", self.name, v),
            None => f.write_str(&self.name),
        }
    }
}

impl Serialize for Discriminator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Discriminator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s.is_empty() {
            return Err(D::Error::custom("empty type discriminator"));
        }
        Ok(Discriminator::parse(&s))
    }
}
