//! Version grammar: dotted-version comparison and requirement constraints

pub mod compare;
pub mod constraint;

pub use compare::{canonicalize, compare_versions, Segment};
pub use constraint::{satisfies, Operator, VersionConstraint, DEFAULT_REQUIRED_VERSION};
