//! Single-parent fallback walk
//!
//! A chain walk starts at one module and runs an operation locally. The
//! operation either resolves there or asks to delegate, handing over
//! whatever it has produced so far. Delegation moves to the parent module
//! (looked up in the registry by id) and repeats. When the walk ends, the
//! carried partial results are combined with the final result from the
//! outermost hop inwards, so a child's contribution always precedes its
//! parent's.
//!
//! The walk ends when:
//! - a module resolves the operation,
//! - a module delegates but has no parent, or its parent is not registered
//!   (the carried value becomes the result),
//! - the next parent was already visited (`DelegationCycle`),
//! - the hop count would exceed `max_delegation_depth`
//!   (`DelegationDepthExceeded`).

use crate::errors::{ModError, Result};
use crate::module::ModuleRecord;
use crate::registry::ModuleRegistry;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, trace};

/// Outcome of running an operation at one module
#[derive(Debug, Clone, PartialEq)]
pub enum Step<T> {
    /// Final answer; the parent is not consulted
    Resolved(T),
    /// Ask the parent, carrying this partial result along
    Delegate(T),
}

/// An operation that can be delegated along a parent chain
pub trait ChainOperation {
    type Output;

    /// Run at `module` only. `can_delegate` is false when the module has no
    /// reachable parent; a `Delegate` returned then ends the walk with the
    /// carried value.
    fn local(&mut self, module: &ModuleRecord, can_delegate: bool) -> Result<Step<Self::Output>>;

    /// Merge a child's carried value with what its parent produced
    fn combine(&mut self, carried: Self::Output, inherited: Self::Output) -> Self::Output;
}

pub struct DelegationChain<'a> {
    registry: &'a ModuleRegistry,
    max_depth: usize,
}

impl<'a> DelegationChain<'a> {
    pub fn new(registry: &'a ModuleRegistry) -> Self {
        Self { registry, max_depth: registry.config().max_delegation_depth }
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Parent record of `module`, if it names one that is registered
    fn parent_of(&self, module: &ModuleRecord) -> Option<Arc<ModuleRecord>> {
        let parent_id = module.parent.as_deref().filter(|p| !p.is_empty())?;
        let parent = self.registry.lookup(parent_id);
        if parent.is_none() {
            debug!(module = %module.id, parent = %parent_id, "parent not registered; chain ends here");
        }
        parent
    }

    /// Ids visited when walking up from `start`, `start` included.
    ///
    /// Stops at a missing parent or at the first repeated id.
    pub fn lineage(&self, start: &str) -> Result<Vec<String>> {
        let mut current = self.registry.get(start)?;
        let mut seen = HashSet::from([current.key()]);
        let mut ids = vec![current.id.clone()];

        while let Some(parent) = self.parent_of(&current) {
            if !seen.insert(parent.key()) {
                break;
            }
            ids.push(parent.id.clone());
            current = parent;
        }
        Ok(ids)
    }

    pub fn walk<O: ChainOperation>(&self, start: &str, operation: &mut O) -> Result<O::Output> {
        let mut current = self.registry.get(start)?;
        let mut visited = HashSet::from([current.key()]);
        let mut carried: Vec<O::Output> = Vec::new();

        let terminal = loop {
            let parent = self.parent_of(&current);

            match operation.local(&current, parent.is_some())? {
                Step::Resolved(value) => {
                    trace!(module = %current.id, "resolved locally");
                    break value;
                }
                Step::Delegate(value) => {
                    let Some(parent) = parent else {
                        trace!(module = %current.id, "no parent to delegate to");
                        break value;
                    };

                    if !visited.insert(parent.key()) {
                        return Err(ModError::DelegationCycle {
                            start: start.to_string(),
                            revisited: parent.id.clone(),
                        });
                    }
                    if carried.len() >= self.max_depth {
                        return Err(ModError::DelegationDepthExceeded {
                            start: start.to_string(),
                            limit: self.max_depth,
                        });
                    }

                    debug!(from = %current.id, to = %parent.id, "delegating to parent");
                    carried.push(value);
                    current = parent;
                }
            }
        };

        Ok(carried
            .into_iter()
            .rev()
            .fold(terminal, |inherited, value| operation.combine(value, inherited)))
    }
}
