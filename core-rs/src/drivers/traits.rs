//! View storage driver trait
//!
//! The registry decides *where* a view should come from; a `ViewStore`
//! answers whether it is there and produces its content.

use crate::errors::Result;
use std::path::Path;

/// View/content storage backend
pub trait ViewStore: Send + Sync {
    /// Whether a view exists at `path`
    ///
    /// Delegation relies on this answer: a missing view sends output on to
    /// the parent module.
    fn exists(&self, path: &Path) -> bool;

    /// Read the view at `path`
    ///
    /// # Errors
    ///
    /// `ModError::ViewNotFound` when nothing is stored at `path`, or an I/O
    /// error from the backend.
    fn read(&self, path: &Path) -> Result<String>;
}
