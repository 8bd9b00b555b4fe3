//! In-memory view store

use crate::drivers::traits::ViewStore;
use crate::errors::{ModError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Clone)]
pub struct MemoryViewStore {
    views: HashMap<PathBuf, String>,
}

impl MemoryViewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.views.insert(path.into(), content.into());
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

impl ViewStore for MemoryViewStore {
    fn exists(&self, path: &Path) -> bool {
        self.views.contains_key(path)
    }

    fn read(&self, path: &Path) -> Result<String> {
        self.views
            .get(path)
            .cloned()
            .ok_or_else(|| ModError::ViewNotFound(path.to_path_buf()))
    }
}
