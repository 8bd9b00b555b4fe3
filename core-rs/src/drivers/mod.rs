//! Drivers module for view storage
//!
//! Provides the abstract view interface (ViewStore trait) and implementations:
//! - FsViewStore: local filesystem, with bundled in-memory views
//! - MemoryViewStore: map-backed store

mod filesystem;
mod memory;
mod traits;

pub use filesystem::FsViewStore;
pub use memory::MemoryViewStore;
pub use traits::ViewStore;
