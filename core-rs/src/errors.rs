//! Error types for the module registry

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModError {
    #[error("Failed loading module({requiring}) - required module({required}) not found")]
    ModuleNotFound { requiring: String, required: String },

    #[error(
        "Failed loading module({requiring}) - required module({required}) version mismatch: \
         need {operator} {required_version}, found {found_version}"
    )]
    VersionMismatch {
        requiring: String,
        required: String,
        required_version: String,
        operator: String,
        found_version: String,
    },

    #[error("Failed loading module({requiring}) - malformed requirement for module({required}): {requirement:?}")]
    MalformedRequirement {
        requiring: String,
        required: String,
        requirement: String,
    },

    #[error("Delegation cycle: chain starting at {start} revisits {revisited}")]
    DelegationCycle { start: String, revisited: String },

    #[error("Delegation chain starting at {start} exceeds {limit} hops")]
    DelegationDepthExceeded { start: String, limit: usize },

    #[error("Module not registered: {0}")]
    UnknownModule(String),

    #[error("Module already registered: {0}")]
    DuplicateModule(String),

    #[error("Invalid module: {0}")]
    InvalidModule(String),

    #[error("View not found: {}", .0.display())]
    ViewNotFound(PathBuf),

    #[error("Descriptor error: {0}")]
    Descriptor(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ModError {
    /// True for the two fatal dependency-resolution failures
    pub fn is_resolution_failure(&self) -> bool {
        matches!(
            self,
            ModError::ModuleNotFound { .. }
                | ModError::VersionMismatch { .. }
                | ModError::MalformedRequirement { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ModError>;
