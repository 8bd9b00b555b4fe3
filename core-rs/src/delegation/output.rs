//! View output along the parent chain
//!
//! A module renders the view itself when it has its own copy. If not, its
//! buffered output is kept and the parent's full rendering is appended.
//! When the chain runs out without finding the view, the buffers collected
//! along the way are the result; a missing view is not an error here.

use crate::delegation::chain::{ChainOperation, Step};
use crate::drivers::ViewStore;
use crate::errors::Result;
use crate::module::ModuleRecord;
use tracing::debug;

pub struct ViewOutput<'a, S: ViewStore + ?Sized> {
    view: &'a str,
    store: &'a S,
}

impl<'a, S: ViewStore + ?Sized> ViewOutput<'a, S> {
    pub fn new(view: &'a str, store: &'a S) -> Self {
        Self { view, store }
    }
}

/// Buffered output of `module` followed by its own copy of `view`
pub fn render_local<S: ViewStore + ?Sized>(module: &ModuleRecord, view: &str, store: &S) -> Result<String> {
    let content = store.read(&module.view_path(view))?;
    Ok(format!("{}{}", module.view_buffer, content))
}

impl<S: ViewStore + ?Sized> ChainOperation for ViewOutput<'_, S> {
    type Output = String;

    fn local(&mut self, module: &ModuleRecord, can_delegate: bool) -> Result<Step<String>> {
        let path = module.view_path(self.view);
        if self.store.exists(&path) {
            return render_local(module, self.view, self.store).map(Step::Resolved);
        }

        if can_delegate {
            debug!(module = %module.id, path = %path.display(), "view missing locally");
            Ok(Step::Delegate(module.view_buffer.clone()))
        } else {
            debug!(module = %module.id, view = %self.view, "view not found anywhere in the chain");
            Ok(Step::Resolved(module.view_buffer.clone()))
        }
    }

    fn combine(&mut self, carried: String, inherited: String) -> String {
        carried + &inherited
    }
}
