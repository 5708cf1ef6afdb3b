//! Input nodes
//!
//! Nodes that emit a value taken from a connection or, when unconnected,
//! from their own settings.

mod boolean_input;
mod text_input;

pub use boolean_input::BooleanInputNode;
pub use text_input::TextInputNode;
