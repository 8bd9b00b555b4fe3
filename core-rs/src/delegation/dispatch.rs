//! Action dispatch along the parent chain
//!
//! The first module whose local handling is not `NotHandled` answers. If
//! the whole chain declines, `NotHandled` is returned as a normal value.

use crate::delegation::chain::{ChainOperation, Step};
use crate::errors::Result;
use crate::module::{ActionOutcome, ModuleRecord};
use tracing::debug;

pub struct ActionDispatch<'a> {
    action: &'a str,
}

impl<'a> ActionDispatch<'a> {
    pub fn new(action: &'a str) -> Self {
        Self { action }
    }
}

impl ChainOperation for ActionDispatch<'_> {
    type Output = ActionOutcome;

    fn local(&mut self, module: &ModuleRecord, _can_delegate: bool) -> Result<Step<ActionOutcome>> {
        match module.local_action(self.action) {
            ActionOutcome::NotHandled => Ok(Step::Delegate(ActionOutcome::NotHandled)),
            handled => {
                debug!(module = %module.id, action = %self.action, "action handled");
                Ok(Step::Resolved(handled))
            }
        }
    }

    fn combine(&mut self, _carried: ActionOutcome, inherited: ActionOutcome) -> ActionOutcome {
        inherited
    }
}
