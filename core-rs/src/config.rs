/**
 * config.rs
 * Registry behavior switches, loaded from YAML
 *
 * Format:
 * ```yaml
 * strictRequirements: false
 * maxDelegationDepth: 32
 * rejectDuplicates: false
 * emitManifests: false
 * ```
 *
 * Every key is optional; missing keys keep their defaults.
 */

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::errors::Result;

/// Default bound on parent hops during delegation
pub const DEFAULT_MAX_DELEGATION_DEPTH: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistryConfig {
    /// Report malformed requirement strings instead of treating them as "any version"
    pub strict_requirements: bool,

    /// Maximum number of parent hops a delegation chain may take
    pub max_delegation_depth: usize,

    /// Refuse to register a second module under an existing id
    pub reject_duplicates: bool,

    /// Write each loaded module's package manifest next to its descriptor
    pub emit_manifests: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            strict_requirements: false,
            max_delegation_depth: DEFAULT_MAX_DELEGATION_DEPTH,
            reject_duplicates: false,
            emit_manifests: false,
        }
    }
}

impl RegistryConfig {
    /// Load configuration from a YAML file
    ///
    /// # Example
    /// ```no_run
    /// use modchain_core::RegistryConfig;
    ///
    /// let config = RegistryConfig::load("modchain.yaml").unwrap();
    /// assert!(config.max_delegation_depth > 0);
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }
}
