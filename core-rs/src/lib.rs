//! # Modchain Core - Module Registry Runtime
//!
//! A registry of loaded modules where each module declares which other
//! modules it needs (optionally pinned to a version range) and may name a
//! single parent module to fall back to.
//!
//! ## Core Principle
//!
//! **Check direct requirements, delegate to one parent**: preparing a module
//! checks only its own requirements against modules that are already
//! registered. At run time, actions and views a module cannot serve are
//! passed on to its parent, then the parent's parent, and so on.
//!
//! ## Lifecycle
//!
//! ```text
//!   build ──► register ──► prepare ──► init ──► dispatch / output
//!                            │                      │
//!                            ▼                      ▼
//!                    ModuleNotFound /         child ─► parent ─► ...
//!                    VersionMismatch          (first handler wins,
//!                    (fail fast)               partial views concatenate)
//! ```
//!
//! ## Example
//!
//! ```
//! use modchain_core::{ActionOutcome, ModuleRecord, ModuleRegistry};
//! use serde_json::json;
//!
//! let registry = ModuleRegistry::new();
//! registry.register(
//!     ModuleRecord::builder("core")
//!         .version("1.0.0")
//!         .respond("about", json!("core about"))
//!         .build()?,
//! )?;
//! registry.register(
//!     ModuleRecord::builder("gallery")
//!         .parent("core")
//!         .requires("core", ">=1.0.0")
//!         .build()?,
//! )?;
//!
//! registry.prepare("gallery")?;
//! assert_eq!(
//!     registry.dispatch("gallery", "about")?,
//!     ActionOutcome::Handled(json!("core about"))
//! );
//! # Ok::<(), modchain_core::ModError>(())
//! ```

pub mod config;
pub mod delegation;
pub mod drivers;
pub mod errors;
pub mod loader;
pub mod module;
pub mod registry;
pub mod version;

pub use config::RegistryConfig;
pub use delegation::{ActionDispatch, ChainOperation, DelegationChain, Step, ViewOutput};
pub use drivers::{FsViewStore, MemoryViewStore, ViewStore};
pub use errors::{ModError, Result};
pub use loader::{LoadReport, ModuleDescriptor, ModuleLoader, DESCRIPTOR_FILE};
pub use module::{
    ActionOutcome, ActionTable, ManifestStatus, ModuleBuilder, ModuleRecord, ModuleStatus, PackageManifest,
    RequireMap, Requirement, RequirementEntry,
};
pub use registry::{DependencyResolver, ModuleRegistry};
pub use version::{compare_versions, satisfies, Operator, VersionConstraint};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
