//! Filesystem-backed view store
//!
//! Views are read from disk. Bundled views registered up front (for example
//! templates compiled into a single distribution file) shadow the disk and
//! count as present even when no file exists.

use crate::drivers::traits::ViewStore;
use crate::errors::{ModError, Result};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Clone)]
pub struct FsViewStore {
    bundled: HashMap<PathBuf, String>,
}

impl FsViewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an in-memory view at `path`
    pub fn bundle(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.bundled.insert(path.into(), content.into());
    }

    pub fn is_bundled(&self, path: &Path) -> bool {
        self.bundled.contains_key(path)
    }
}

impl ViewStore for FsViewStore {
    fn exists(&self, path: &Path) -> bool {
        self.is_bundled(path) || path.is_file()
    }

    fn read(&self, path: &Path) -> Result<String> {
        if let Some(content) = self.bundled.get(path) {
            return Ok(content.clone());
        }
        match fs::read_to_string(path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(ModError::ViewNotFound(path.to_path_buf())),
            Err(e) => Err(ModError::Io(e)),
        }
    }
}
