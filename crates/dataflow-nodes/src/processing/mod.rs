//! Processing nodes
//!
//! Nodes that transform their inputs.

mod delay;
mod json_filter;
mod regex_match;

pub use delay::DelayNode;
pub use json_filter::JsonFilterNode;
pub use regex_match::RegexMatchNode;
