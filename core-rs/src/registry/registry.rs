//! Registry of loaded modules
//!
//! Maps the lowercased module id to the module record. Records are shared
//! as `Arc`s; every mutation (`init`, `write_view`, status changes) builds a
//! new record and swaps it in, so readers never observe a half-updated one.
//! A single `RwLock` guards the map.

use crate::config::RegistryConfig;
use crate::delegation::{ActionDispatch, DelegationChain, ViewOutput};
use crate::drivers::ViewStore;
use crate::errors::{ModError, Result};
use crate::module::{registry_key, ActionOutcome, ModuleRecord, ModuleStatus};
use crate::registry::resolver::DependencyResolver;
use chrono::Utc;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: RwLock<HashMap<String, Arc<ModuleRecord>>>,
    config: RegistryConfig,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self { modules: RwLock::new(HashMap::new()), config }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<ModuleRecord>>> {
        self.modules.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<ModuleRecord>>> {
        self.modules.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a module under its lowercased id.
    ///
    /// An existing module with the same id is replaced and returned, unless
    /// `reject_duplicates` is configured, in which case nothing changes and
    /// `DuplicateModule` is returned.
    pub fn register(&self, mut record: ModuleRecord) -> Result<Option<Arc<ModuleRecord>>> {
        let key = record.key();
        if key.trim().is_empty() {
            return Err(ModError::InvalidModule("cannot register a module with an empty id".to_string()));
        }
        record.registered_at = Some(Utc::now());

        let mut modules = self.write();
        if self.config.reject_duplicates && modules.contains_key(&key) {
            return Err(ModError::DuplicateModule(record.id));
        }

        let id = record.id.clone();
        let version = record.version.clone();
        let previous = modules.insert(key, Arc::new(record));
        drop(modules);

        match &previous {
            Some(old) => warn!(module = %id, replaced_version = %old.version, version = %version, "module id re-registered; previous module replaced"),
            None => info!(module = %id, version = %version, "module registered"),
        }
        Ok(previous)
    }

    /// Case-insensitive lookup
    pub fn lookup(&self, id: &str) -> Option<Arc<ModuleRecord>> {
        self.read().get(&registry_key(id)).cloned()
    }

    /// Like `lookup`, but a missing module is an error
    pub fn get(&self, id: &str) -> Result<Arc<ModuleRecord>> {
        self.lookup(id).ok_or_else(|| ModError::UnknownModule(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.read().contains_key(&registry_key(id))
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// All modules, ordered by registry key
    pub fn list(&self) -> Vec<Arc<ModuleRecord>> {
        let mut modules: Vec<_> = self.read().values().cloned().collect();
        modules.sort_by_key(|m| m.key());
        modules
    }

    /// Replace a module with a modified copy and return the new record.
    ///
    /// `change` runs on a private copy with no lock held, so it may read the
    /// registry. If the module is replaced while `change` runs, the copy is
    /// discarded and `change` runs again on the newer record.
    pub fn update<F>(&self, id: &str, mut change: F) -> Result<Arc<ModuleRecord>>
    where
        F: FnMut(&mut ModuleRecord),
    {
        let key = registry_key(id);
        loop {
            let current = self.lookup(id).ok_or_else(|| ModError::UnknownModule(id.to_string()))?;

            let mut next = ModuleRecord::clone(&current);
            change(&mut next);
            next.id = current.id.clone();
            let next = Arc::new(next);

            let mut modules = self.write();
            let stale = match modules.get(&key) {
                Some(stored) => !Arc::ptr_eq(stored, &current),
                None => return Err(ModError::UnknownModule(id.to_string())),
            };
            if stale {
                debug!(module = %current.id, "module changed during update, retrying");
                continue;
            }
            modules.insert(key, Arc::clone(&next));
            return Ok(next);
        }
    }

    /// Check the module's requirements against the registry.
    ///
    /// Marks the module `Prepared` on success and `Failed` on the first
    /// unmet requirement, which is returned.
    pub fn prepare(&self, id: &str) -> Result<()> {
        let record = self.get(id)?;
        let outcome = DependencyResolver::new(self).resolve(&record);

        let status = if outcome.is_ok() { ModuleStatus::Prepared } else { ModuleStatus::Failed };
        self.update(id, |m| m.status = status)?;

        match &outcome {
            Ok(()) => info!(module = %record.id, "module prepared"),
            Err(e) => warn!(module = %record.id, error = %e, "module preparation failed"),
        }
        outcome
    }

    /// Apply configuration options to a module and mark it `Initialized`
    pub fn init(&self, id: &str, options: &BTreeMap<String, Value>) -> Result<Arc<ModuleRecord>> {
        let record = self.update(id, |m| {
            m.apply_options(options);
            m.status = ModuleStatus::Initialized;
        })?;
        debug!(module = %record.id, options = options.len(), "module initialized");
        Ok(record)
    }

    /// Register a copy of `source_id` under `new_id`, sharing the source's parent
    pub fn duplicate(&self, source_id: &str, new_id: &str) -> Result<Arc<ModuleRecord>> {
        let source = self.get(source_id)?;
        let copy = source.duplicate(new_id);
        self.register(copy)?;
        self.get(new_id)
    }

    /// Append partial output to the module's view buffer
    pub fn write_view(&self, id: &str, content: &str) -> Result<()> {
        self.update(id, |m| m.view_buffer.push_str(content))?;
        Ok(())
    }

    pub fn clear_view(&self, id: &str) -> Result<()> {
        self.update(id, |m| m.view_buffer.clear())?;
        Ok(())
    }

    /// Run an action, falling back along the parent chain while modules
    /// answer `NotHandled`
    pub fn dispatch(&self, id: &str, action: &str) -> Result<ActionOutcome> {
        DelegationChain::new(self).walk(id, &mut ActionDispatch::new(action))
    }

    /// Render a view, falling back to the parent for views the module lacks
    pub fn output<S: ViewStore + ?Sized>(&self, id: &str, view: &str, store: &S) -> Result<String> {
        DelegationChain::new(self).walk(id, &mut ViewOutput::new(view, store))
    }
}
