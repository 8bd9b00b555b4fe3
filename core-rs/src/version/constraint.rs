//! Requirement strings: `<op><version>` parsing and evaluation
//!
//! Parsing is permissive. A leading `>=`, `<=` or `<` is taken as the
//! operator; anything else (including no prefix at all) means `>=` with the
//! whole trimmed string as the version. An empty version is satisfied by any
//! found version.

use crate::version::compare::{canonicalize, compare_versions};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

static REQUIREMENT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(>=|<=|<)?\s*(.*?)\s*$").expect("requirement pattern is valid"));

/// Version given to positional requirements that name no version.
pub const DEFAULT_REQUIRED_VERSION: &str = "0.0.1";

/// Comparison operator of a requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Operator {
    #[default]
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = "<")]
    Less,
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::GreaterOrEqual => ">=",
            Operator::LessOrEqual => "<=",
            Operator::Less => "<",
            Operator::Greater => ">",
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
        }
    }

    /// Whether `found.cmp(required)` satisfies this operator
    pub fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            Operator::GreaterOrEqual => ordering != Ordering::Less,
            Operator::LessOrEqual => ordering != Ordering::Greater,
            Operator::Less => ordering == Ordering::Less,
            Operator::Greater => ordering == Ordering::Greater,
            Operator::Equal => ordering == Ordering::Equal,
            Operator::NotEqual => ordering != Ordering::Equal,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            ">=" => Ok(Operator::GreaterOrEqual),
            "<=" => Ok(Operator::LessOrEqual),
            "<" => Ok(Operator::Less),
            ">" => Ok(Operator::Greater),
            "==" | "=" => Ok(Operator::Equal),
            "!=" | "<>" => Ok(Operator::NotEqual),
            other => Err(format!("unknown version operator: {:?}", other)),
        }
    }
}

/// Parsed `(operator, version)` pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionConstraint {
    pub operator: Operator,
    pub version: String,
}

impl VersionConstraint {
    pub fn new(operator: Operator, version: impl Into<String>) -> Self {
        Self { operator, version: version.into() }
    }

    /// Constraint satisfied by every version
    pub fn any() -> Self {
        Self::new(Operator::GreaterOrEqual, "")
    }

    /// Parse a requirement string. Never fails.
    pub fn parse(requirement: &str) -> Self {
        match REQUIREMENT_PATTERN.captures(requirement) {
            Some(caps) => {
                let operator = caps
                    .get(1)
                    .and_then(|m| m.as_str().parse().ok())
                    .unwrap_or_default();
                let version = caps.get(2).map(|m| m.as_str()).unwrap_or("");
                Self::new(operator, version)
            }
            None => Self::any(),
        }
    }

    /// True when the version token is empty or cannot be canonicalized
    pub fn is_malformed(&self) -> bool {
        self.version.is_empty() || canonicalize(&self.version).is_none()
    }

    pub fn is_satisfied_by(&self, found: &str) -> bool {
        satisfies(found, self.operator, &self.version)
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.operator, self.version)
    }
}

/// Evaluate `found <operator> required`.
///
/// An empty `required` is always satisfied. Otherwise returns `false` when
/// either version cannot be compared.
pub fn satisfies(found: &str, operator: Operator, required: &str) -> bool {
    if required.trim().is_empty() {
        return true;
    }
    compare_versions(found, required)
        .map(|ordering| operator.accepts(ordering))
        .unwrap_or(false)
}
