//! Control nodes
//!
//! Nodes that route or combine values.

mod conditional;
mod merge;

pub use conditional::ConditionalNode;
pub use merge::MergeNode;
