//! Graph validation for editing tools
//!
//! Unlike evaluation, which stops at the first problem, these checks collect
//! every problem so an editor can highlight all of them at once.

use std::collections::HashSet;

use crate::graph::Graph;
use crate::node::NodeId;
use crate::record::GraphRecord;
use crate::registry::NodeTypeRegistry;

/// Validation error with location context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The graph contains a cycle through this node
    CycleDetected { node_id: NodeId },
    /// An input has no incoming connection and no usable setting
    UnconnectedInput { node_id: NodeId, name: String },
    /// A stored node names a type the registry does not know
    UnknownNodeType { node_id: NodeId, node_type: String },
    /// A stored connection references a node that is not in the record
    UnknownNode { node_id: NodeId },
    /// Two stored nodes share an id
    DuplicateNode { node_id: NodeId },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CycleDetected { node_id } => {
                write!(f, "Cycle detected through node '{}'", node_id)
            }
            Self::UnconnectedInput { node_id, name } => {
                write!(f, "Input '{}' on node '{}' is not connected", name, node_id)
            }
            Self::UnknownNodeType { node_id, node_type } => {
                write!(f, "Unknown node type '{}' for node '{}'", node_type, node_id)
            }
            Self::UnknownNode { node_id } => {
                write!(f, "Connection references unknown node '{}'", node_id)
            }
            Self::DuplicateNode { node_id } => {
                write!(f, "Node '{}' appears more than once", node_id)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a live graph
///
/// Returns all problems found (not just the first).
pub fn validate_graph(graph: &Graph) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(node_id) = graph.find_cycle() {
        errors.push(ValidationError::CycleDetected { node_id });
    }

    for node in graph.nodes() {
        for input in node.inputs() {
            if graph.connection_into(node.id(), input.name()).is_some() {
                continue;
            }
            let from_setting = input.is_settable()
                && node
                    .setting(input.name())
                    .is_some_and(|value| value.data_type() == input.data_type());
            if !from_setting {
                errors.push(ValidationError::UnconnectedInput {
                    node_id: node.id(),
                    name: input.name().to_string(),
                });
            }
        }
    }

    errors
}

/// Validate a stored graph without building it
pub fn validate_record(record: &GraphRecord, registry: &NodeTypeRegistry) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for node in &record.nodes {
        if !seen.insert(node.node_id) {
            errors.push(ValidationError::DuplicateNode {
                node_id: node.node_id,
            });
        }
        if !registry.has_node_type(&node.type_identifier) {
            errors.push(ValidationError::UnknownNodeType {
                node_id: node.node_id,
                node_type: node.type_identifier.clone(),
            });
        }
    }

    for connection in &record.connections {
        for node_id in [connection.from_node_id, connection.to_node_id] {
            if !seen.contains(&node_id) {
                errors.push(ValidationError::UnknownNode { node_id });
            }
        }
    }

    errors
}
