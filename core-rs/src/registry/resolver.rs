//! Direct-requirement resolution
//!
//! Walks a module's declared requirements in order and checks each one
//! against the modules already in the registry. The first unmet requirement
//! aborts resolution; nothing is collected or retried, and requirements of
//! the required modules are not followed.

use crate::errors::{ModError, Result};
use crate::module::ModuleRecord;
use crate::registry::ModuleRegistry;
use crate::version::VersionConstraint;
use tracing::{debug, warn};

pub struct DependencyResolver<'a> {
    registry: &'a ModuleRegistry,
    strict: bool,
}

impl<'a> DependencyResolver<'a> {
    /// Resolver using the registry's configured strictness
    pub fn new(registry: &'a ModuleRegistry) -> Self {
        Self { registry, strict: registry.config().strict_requirements }
    }

    /// Report malformed requirement strings instead of accepting any version
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn resolve(&self, record: &ModuleRecord) -> Result<()> {
        for requirement in record.normalized_requirements() {
            let mut constraint = requirement.constraint.clone();

            if constraint.is_malformed() && !constraint.version.is_empty() {
                if self.strict {
                    return Err(ModError::MalformedRequirement {
                        requiring: record.id.clone(),
                        required: requirement.module.clone(),
                        requirement: requirement.raw.clone(),
                    });
                }
                warn!(
                    module = %record.id,
                    required = %requirement.module,
                    requirement = %requirement.raw,
                    "malformed requirement accepted as any version"
                );
                constraint = VersionConstraint::any();
            } else if self.strict && constraint.version.is_empty() && !requirement.raw.trim().is_empty() {
                // An operator with no version, e.g. ">="
                return Err(ModError::MalformedRequirement {
                    requiring: record.id.clone(),
                    required: requirement.module.clone(),
                    requirement: requirement.raw.clone(),
                });
            }

            let key = requirement.key();
            let Some(found) = self.registry.lookup(&key) else {
                return Err(ModError::ModuleNotFound {
                    requiring: record.id.clone(),
                    required: requirement.module.clone(),
                });
            };

            if !constraint.is_satisfied_by(&found.version) {
                return Err(ModError::VersionMismatch {
                    requiring: record.id.clone(),
                    required: key,
                    required_version: constraint.version,
                    operator: constraint.operator.to_string(),
                    found_version: found.version.clone(),
                });
            }

            debug!(
                module = %record.id,
                required = %key,
                constraint = %constraint,
                found = %found.version,
                "requirement satisfied"
            );
        }
        Ok(())
    }
}
