//! Descriptor-directory loader
//!
//! Finds every `module.yaml` below a root directory, registers all of them
//! first, then prepares and initializes each one against the populated
//! registry. Modules are not ordered by their requirements: a module whose
//! requirement is missing simply fails preparation and is reported.
//!
//! Descriptor format:
//! ```yaml
//! name: Vendor\Gallery
//! id: gallery            # optional, defaults to the lowercased name
//! version: 1.2.0
//! author: Jane Roe
//! parent: core           # optional
//! requires:
//!   - i18n               # any version
//!   - core: ">=1.0.0"
//! actions:
//!   index: "gallery index"
//! defaultAction: "fallback response"
//! options:
//!   perPage: 20
//! ```

use crate::config::RegistryConfig;
use crate::errors::{ModError, Result};
use crate::module::{ActionOutcome, ManifestStatus, ModuleRecord, ModuleStatus, RequirementEntry};
use crate::registry::ModuleRegistry;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// File name of a module descriptor
pub const DESCRIPTOR_FILE: &str = "module.yaml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub requires: Vec<RequirementEntry>,
    /// Static responses, keyed by action name
    #[serde(default)]
    pub actions: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_action: Option<Value>,
    /// Applied through `init` after a successful `prepare`
    #[serde(default)]
    pub options: BTreeMap<String, Value>,
}

/// Accept `version: 1.0` as well as `version: "1.0"`
fn scalar_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!("expected a version string, got {}", other))),
    }
}

impl ModuleDescriptor {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        serde_yaml::from_str(&content)
            .map_err(|e| ModError::Descriptor(format!("{}: {}", path.display(), e)))
    }

    /// Build the module record; `dir` becomes the module's base path
    pub fn to_record(&self, dir: &Path) -> Result<ModuleRecord> {
        let mut builder = ModuleRecord::builder(self.name.clone()).path(dir);

        if let Some(id) = &self.id {
            builder = builder.id(id.clone());
        }
        if let Some(version) = &self.version {
            builder = builder.version(version.clone());
        }
        if let Some(author) = &self.author {
            builder = builder.author(author.clone());
        }
        if let Some(parent) = &self.parent {
            builder = builder.parent(parent.clone());
        }
        for entry in &self.requires {
            builder = builder.requirement(entry.clone());
        }
        for (action, response) in &self.actions {
            builder = builder.respond(action, response.clone());
        }
        if let Some(response) = self.default_action.clone() {
            builder = builder.fallback_action(move |_, _| ActionOutcome::Handled(response.clone()));
        }

        builder.build()
    }
}

/// Per-module result of a load
#[derive(Debug)]
pub struct LoadReport {
    pub id: String,
    pub descriptor: PathBuf,
    pub status: ModuleStatus,
    /// Set when preparation failed
    pub error: Option<ModError>,
    pub manifest: Option<ManifestStatus>,
}

impl LoadReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

pub struct ModuleLoader {
    root: PathBuf,
}

impl ModuleLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Descriptor files below the root, sorted by path
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(ModError::Descriptor(format!(
                "module root is not a directory: {}",
                self.root.display()
            )));
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(true) {
            let entry = entry.map_err(|e| ModError::Descriptor(e.to_string()))?;
            if entry.file_type().is_file() && entry.file_name() == DESCRIPTOR_FILE {
                found.push(entry.into_path());
            }
        }
        found.sort();
        debug!(root = %self.root.display(), count = found.len(), "descriptors discovered");
        Ok(found)
    }

    /// Register every descriptor, then prepare and initialize each module.
    ///
    /// A malformed descriptor aborts the load. A failed preparation does not;
    /// it is recorded in that module's report and the module is left `Failed`.
    pub fn load_into(&self, registry: &ModuleRegistry) -> Result<Vec<LoadReport>> {
        let mut staged = Vec::new();

        for path in self.discover()? {
            let descriptor = ModuleDescriptor::load(&path)?;
            let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
            let record = descriptor.to_record(&dir)?;

            let manifest = if registry.config().emit_manifests {
                Some(record.manifest().emit(&dir)?)
            } else {
                None
            };

            let id = record.id.clone();
            registry.register(record)?;
            staged.push((id, path, descriptor.options, manifest));
        }

        let mut reports = Vec::with_capacity(staged.len());
        for (id, descriptor, options, manifest) in staged {
            let error = match registry.prepare(&id) {
                Ok(()) => {
                    registry.init(&id, &options)?;
                    None
                }
                Err(e) => Some(e),
            };
            let status = registry.get(&id)?.status;
            reports.push(LoadReport { id, descriptor, status, error, manifest });
        }

        let failed = reports.iter().filter(|r| !r.is_ok()).count();
        info!(loaded = reports.len(), failed, "modules loaded");
        Ok(reports)
    }

    /// Load into a fresh registry built from `registry_config`
    pub fn load(&self, registry_config: RegistryConfig) -> Result<(ModuleRegistry, Vec<LoadReport>)> {
        let registry = ModuleRegistry::with_config(registry_config);
        let reports = self.load_into(&registry)?;
        Ok((registry, reports))
    }
}
