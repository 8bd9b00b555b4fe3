//! Module record: identity, version, parent link and declared requirements
//!
//! Records are plain data. The registry owns every record; `parent` holds
//! the parent's id and is looked up in the registry when a delegation chain
//! is walked, never dereferenced directly.

use crate::errors::{ModError, Result};
use crate::module::action::{ActionOutcome, ActionTable};
use crate::module::manifest::PackageManifest;
use crate::module::requirement::{Requirement, RequirementEntry};
use crate::version::DEFAULT_REQUIRED_VERSION;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Lifecycle position of a registered module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModuleStatus {
    #[default]
    Registered,
    Prepared,
    Initialized,
    Failed,
}

impl std::fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ModuleStatus::Registered => "registered",
            ModuleStatus::Prepared => "prepared",
            ModuleStatus::Initialized => "initialized",
            ModuleStatus::Failed => "failed",
        };
        f.pad(name)
    }
}

/// Registry key for a module id
pub fn registry_key(id: &str) -> String {
    id.to_lowercase()
}

/// A loaded module
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRecord {
    /// Unique (case-insensitive) registry id
    pub id: String,

    /// Package name, e.g. `vendor/gallery`
    pub name: String,

    #[serde(default)]
    pub author: String,

    pub version: String,

    /// Id of the module this one falls back to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    #[serde(default)]
    pub requirements: Vec<RequirementEntry>,

    /// Base directory for the module's views and manifest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Options applied by `init` that match no record field
    #[serde(default)]
    pub configuration: BTreeMap<String, Value>,

    #[serde(default)]
    pub status: ModuleStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registered_at: Option<DateTime<Utc>>,

    /// Output accumulated so far for the current view
    #[serde(skip)]
    pub view_buffer: String,

    #[serde(skip)]
    pub actions: ActionTable,
}

impl ModuleRecord {
    pub fn builder(name: impl Into<String>) -> ModuleBuilder {
        ModuleBuilder::new(name)
    }

    pub fn key(&self) -> String {
        registry_key(&self.id)
    }

    pub fn has_parent(&self) -> bool {
        self.parent.as_deref().is_some_and(|p| !p.is_empty())
    }

    /// Requirements as `(module, operator, version)` triples, in declaration order
    pub fn normalized_requirements(&self) -> Vec<Requirement> {
        self.requirements.iter().map(RequirementEntry::normalize).collect()
    }

    /// Run an action on this module only
    pub fn local_action(&self, action: &str) -> ActionOutcome {
        self.actions.invoke(self, action)
    }

    /// Location of `view` relative to this module's base path
    pub fn view_path(&self, view: &str) -> PathBuf {
        let relative = view.trim_start_matches(['/', '\\']);
        match &self.path {
            Some(base) => base.join(relative),
            None => PathBuf::from(relative),
        }
    }

    /// Copy this record under a new identity.
    ///
    /// The copy keeps this record's parent link (it is a sibling, not a
    /// child) and starts over in the `Registered` state with no buffered view
    /// output.
    pub fn duplicate(&self, new_id: impl Into<String>) -> ModuleRecord {
        let mut copy = self.clone();
        copy.id = new_id.into();
        copy.parent = self.parent.clone();
        copy.status = ModuleStatus::Registered;
        copy.registered_at = None;
        copy.view_buffer.clear();
        copy
    }

    /// Apply `init` options.
    ///
    /// Keys naming a record field (`name`, `author`, `version`, `path`,
    /// `parent`) overwrite that field; everything else is kept in
    /// `configuration`. Unknown keys are never rejected.
    pub fn apply_options(&mut self, options: &BTreeMap<String, Value>) {
        for (key, value) in options {
            let text = value_as_string(value);
            match (key.as_str(), text) {
                ("name", Some(text)) => self.name = text,
                ("author", Some(text)) => self.author = text,
                ("version", Some(text)) => self.version = text,
                ("path", Some(text)) => self.path = Some(PathBuf::from(text)),
                ("parent", Some(text)) => self.parent = Some(text).filter(|p| !p.is_empty()),
                ("parent", None) if value.is_null() => self.parent = None,
                _ => {
                    self.configuration.insert(key.clone(), value.clone());
                }
            }
        }
    }

    pub fn option(&self, key: &str) -> Option<&Value> {
        self.configuration.get(key)
    }

    pub fn manifest(&self) -> PackageManifest {
        PackageManifest::from_record(self)
    }
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Builder for [`ModuleRecord`]
pub struct ModuleBuilder {
    id: Option<String>,
    record: ModuleRecord,
}

impl ModuleBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            record: ModuleRecord {
                id: String::new(),
                name: name.into(),
                author: String::new(),
                version: DEFAULT_REQUIRED_VERSION.to_string(),
                parent: None,
                requirements: Vec::new(),
                path: None,
                configuration: BTreeMap::new(),
                status: ModuleStatus::Registered,
                registered_at: None,
                view_buffer: String::new(),
                actions: ActionTable::new(),
            },
        }
    }

    /// Explicit id; defaults to the lowercased name
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.record.version = version.into();
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.record.author = author.into();
        self
    }

    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.record.parent = Some(parent.into()).filter(|p| !p.is_empty());
        self
    }

    pub fn requires(mut self, module: impl Into<String>, requirement: impl Into<String>) -> Self {
        self.record.requirements.push(RequirementEntry::named(module, requirement));
        self
    }

    /// Require a module at any version
    pub fn requires_any(mut self, module: impl Into<String>) -> Self {
        self.record.requirements.push(RequirementEntry::positional(module));
        self
    }

    pub fn requirement(mut self, entry: RequirementEntry) -> Self {
        self.record.requirements.push(entry);
        self
    }

    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.record.path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn action<F>(mut self, name: &str, handler: F) -> Self
    where
        F: Fn(&ModuleRecord, &str) -> ActionOutcome + Send + Sync + 'static,
    {
        self.record.actions.insert(name, handler);
        self
    }

    pub fn respond(mut self, name: &str, response: Value) -> Self {
        self.record.actions.respond(name, response);
        self
    }

    pub fn fallback_action<F>(mut self, handler: F) -> Self
    where
        F: Fn(&ModuleRecord, &str) -> ActionOutcome + Send + Sync + 'static,
    {
        self.record.actions.set_fallback(handler);
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.record.configuration.insert(key.into(), value);
        self
    }

    pub fn build(self) -> Result<ModuleRecord> {
        let mut record = self.record;
        record.id = self.id.unwrap_or_else(|| record.name.to_lowercase());

        if record.id.trim().is_empty() {
            return Err(ModError::InvalidModule(
                "module id is empty and cannot be derived from its name".to_string(),
            ));
        }
        Ok(record)
    }
}
