//! Module records and what they declare: requirements, actions, manifest

pub mod action;
pub mod manifest;
pub mod record;
pub mod requirement;

pub use action::{ActionFn, ActionOutcome, ActionTable};
pub use manifest::{ManifestStatus, PackageManifest, RequireMap, MANIFEST_FILE};
pub use record::{registry_key, ModuleBuilder, ModuleRecord, ModuleStatus};
pub use requirement::{Requirement, RequirementEntry, ANY_VERSION_WILDCARD};
