//! Controller actions owned by a module
//!
//! Each module carries a table of named action handlers plus an optional
//! fallback used for names it has no entry for. Local dispatch yields
//! [`ActionOutcome::NotHandled`] when neither applies; that sentinel is what
//! sends a delegation chain on to the parent module.

use crate::module::record::ModuleRecord;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Result of running an action at one module
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Handled(Value),
    /// Sentinel: this module cannot serve the action
    NotHandled,
}

impl ActionOutcome {
    pub fn is_handled(&self) -> bool {
        matches!(self, ActionOutcome::Handled(_))
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            ActionOutcome::Handled(value) => Some(value),
            ActionOutcome::NotHandled => None,
        }
    }
}

/// Handler signature: receives the module being asked and the action name
pub type ActionFn = Arc<dyn Fn(&ModuleRecord, &str) -> ActionOutcome + Send + Sync>;

/// Action names are matched case-insensitively
#[derive(Clone, Default)]
pub struct ActionTable {
    handlers: BTreeMap<String, ActionFn>,
    fallback: Option<ActionFn>,
}

impl ActionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<F>(&mut self, name: &str, handler: F)
    where
        F: Fn(&ModuleRecord, &str) -> ActionOutcome + Send + Sync + 'static,
    {
        self.handlers.insert(name.to_lowercase(), Arc::new(handler));
    }

    /// Register an action that always answers with `response`
    pub fn respond(&mut self, name: &str, response: Value) {
        self.insert(name, move |_, _| ActionOutcome::Handled(response.clone()));
    }

    pub fn set_fallback<F>(&mut self, handler: F)
    where
        F: Fn(&ModuleRecord, &str) -> ActionOutcome + Send + Sync + 'static,
    {
        self.fallback = Some(Arc::new(handler));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(&name.to_lowercase())
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    pub fn names(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty() && self.fallback.is_none()
    }

    /// Run `name` locally on `module`, without consulting any parent
    pub fn invoke(&self, module: &ModuleRecord, name: &str) -> ActionOutcome {
        match self.handlers.get(&name.to_lowercase()).or(self.fallback.as_ref()) {
            Some(handler) => handler(module, name),
            None => ActionOutcome::NotHandled,
        }
    }
}

impl fmt::Debug for ActionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionTable")
            .field("handlers", &self.names())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}
