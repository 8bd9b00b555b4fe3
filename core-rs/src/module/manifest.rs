//! Package manifest emission
//!
//! Each module can publish a `composer.json`-style manifest describing its
//! name, author, version and requirements. The file is rewritten only when
//! it is missing or its content changed.

use crate::errors::Result;
use crate::module::record::ModuleRecord;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

/// File name of the emitted manifest
pub const MANIFEST_FILE: &str = "composer.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManifest {
    pub name: String,
    pub author: String,
    pub version: String,
    pub require: RequireMap,
}

/// `module -> requirement` pairs in declaration order.
///
/// Serialized as a JSON object whose keys keep that order. Inserting a
/// module again replaces its requirement in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequireMap(Vec<(String, String)>);

impl RequireMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, module: String, requirement: String) {
        match self.0.iter_mut().find(|(m, _)| *m == module) {
            Some(entry) => entry.1 = requirement,
            None => self.0.push((module, requirement)),
        }
    }

    pub fn get(&self, module: &str) -> Option<&str> {
        self.0.iter().find(|(m, _)| m == module).map(|(_, r)| r.as_str())
    }

    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(m, _)| m.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for RequireMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut map = RequireMap::new();
        for (module, requirement) in iter {
            map.insert(module, requirement);
        }
        map
    }
}

impl Serialize for RequireMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(m, r)| (m, r)))
    }
}

struct RequireMapVisitor;

impl<'de> Visitor<'de> for RequireMapVisitor {
    type Value = RequireMap;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of module names to requirement strings")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<RequireMap, A::Error> {
        let mut map = RequireMap::new();
        while let Some((module, requirement)) = access.next_entry::<String, String>()? {
            map.insert(module, requirement);
        }
        Ok(map)
    }
}

impl<'de> Deserialize<'de> for RequireMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(RequireMapVisitor)
    }
}

/// What `emit` did on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestStatus {
    Written,
    Unchanged,
}

impl PackageManifest {
    pub fn from_record(record: &ModuleRecord) -> Self {
        Self {
            name: record.name.replace('\\', "/"),
            author: record.author.clone(),
            version: record.version.clone(),
            require: record
                .requirements
                .iter()
                .map(|entry| entry.manifest_pair())
                .collect(),
        }
    }

    /// Compact JSON; forward slashes are left unescaped
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Write the manifest into `dir` unless an identical one is already there
    pub fn emit(&self, dir: &Path) -> Result<ManifestStatus> {
        let content = self.to_json()?;
        let target = dir.join(MANIFEST_FILE);

        if let Ok(existing) = fs::read(&target) {
            if content_hash(&existing) == content_hash(content.as_bytes()) {
                debug!(path = %target.display(), "manifest unchanged");
                return Ok(ManifestStatus::Unchanged);
            }
        }

        fs::create_dir_all(dir)?;
        fs::write(&target, content)?;
        debug!(path = %target.display(), "manifest written");
        Ok(ManifestStatus::Written)
    }
}

/// Content hash used to detect manifest changes
pub fn content_hash(bytes: &[u8]) -> u32 {
    crc32fast::hash(bytes)
}
