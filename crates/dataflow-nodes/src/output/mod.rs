//! Output nodes
//!
//! Terminal nodes that expose results to whoever reads the evaluation.

mod text_output;

pub use text_output::TextOutputNode;
