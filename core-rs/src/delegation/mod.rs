//! Parent-chain fallback for action dispatch and view output

pub mod chain;
pub mod dispatch;
pub mod output;

pub use chain::{ChainOperation, DelegationChain, Step};
pub use dispatch::ActionDispatch;
pub use output::{render_local, ViewOutput};
