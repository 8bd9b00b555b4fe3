//! Declared module requirements
//!
//! A module lists what it needs in declaration order. An entry either names
//! the module together with a requirement string (`core: ">=1.0"`), or is
//! positional and names only the module (`- i18n`). Positional entries are
//! satisfied by any version from `0.0.1` upward.

use crate::version::{VersionConstraint, DEFAULT_REQUIRED_VERSION};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Manifest value written for positional requirements
pub const ANY_VERSION_WILDCARD: &str = "*.*.*";

/// One declared requirement, as written by the module author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRequirement", into = "RawRequirement")]
pub enum RequirementEntry {
    /// `module: "<op><version>"`
    Named { module: String, requirement: String },
    /// Bare module name
    Positional(String),
}

/// Serialized shape: a bare string or a single-key map
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawRequirement {
    Positional(String),
    Named(BTreeMap<String, String>),
}

impl TryFrom<RawRequirement> for RequirementEntry {
    type Error = String;

    fn try_from(raw: RawRequirement) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawRequirement::Positional(module) => Ok(RequirementEntry::Positional(module)),
            RawRequirement::Named(map) => {
                if map.len() != 1 {
                    return Err(format!(
                        "requirement entry must name exactly one module, got {}",
                        map.len()
                    ));
                }
                let (module, requirement) = map.into_iter().next().unwrap_or_default();
                Ok(RequirementEntry::Named { module, requirement })
            }
        }
    }
}

impl From<RequirementEntry> for RawRequirement {
    fn from(entry: RequirementEntry) -> Self {
        match entry {
            RequirementEntry::Positional(module) => RawRequirement::Positional(module),
            RequirementEntry::Named { module, requirement } => {
                RawRequirement::Named(BTreeMap::from([(module, requirement)]))
            }
        }
    }
}

/// Normalized `(module, operator, version)` triple
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// Module name as declared
    pub module: String,
    pub constraint: VersionConstraint,
    /// Requirement string before parsing
    pub raw: String,
}

impl Requirement {
    /// Case-insensitive registry key of the required module
    pub fn key(&self) -> String {
        self.module.to_lowercase()
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.module, self.constraint)
    }
}

impl RequirementEntry {
    pub fn named(module: impl Into<String>, requirement: impl Into<String>) -> Self {
        RequirementEntry::Named { module: module.into(), requirement: requirement.into() }
    }

    pub fn positional(module: impl Into<String>) -> Self {
        RequirementEntry::Positional(module.into())
    }

    /// Resolve the declared form into a requirement triple.
    ///
    /// A named entry with an empty module name is read as positional, with
    /// the requirement string naming the module.
    pub fn normalize(&self) -> Requirement {
        match self {
            RequirementEntry::Named { module, requirement } if !module.is_empty() => Requirement {
                module: module.clone(),
                constraint: VersionConstraint::parse(requirement),
                raw: requirement.clone(),
            },
            RequirementEntry::Named { requirement: module, .. } | RequirementEntry::Positional(module) => {
                Requirement {
                    module: module.clone(),
                    constraint: VersionConstraint::parse(DEFAULT_REQUIRED_VERSION),
                    raw: DEFAULT_REQUIRED_VERSION.to_string(),
                }
            }
        }
    }

    /// `(module, requirement)` pair as published in the package manifest
    pub fn manifest_pair(&self) -> (String, String) {
        match self {
            RequirementEntry::Named { module, requirement } if !module.is_empty() => {
                (module.clone(), requirement.clone())
            }
            RequirementEntry::Named { requirement: module, .. } | RequirementEntry::Positional(module) => {
                (module.clone(), ANY_VERSION_WILDCARD.to_string())
            }
        }
    }
}
