//! Module registry and dependency resolution against it

#[allow(clippy::module_inception)]
pub mod registry;
pub mod resolver;

pub use registry::ModuleRegistry;
pub use resolver::DependencyResolver;
