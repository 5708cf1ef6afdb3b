//! Validated edges between node connectors

use std::fmt;

use crate::connector::{Input, Output};
use crate::error::{EngineError, Result};
use crate::node::{Node, NodeId};
use crate::types::{DataKind, DataType};

/// An edge from one node's output to another node's input of the same kind
///
/// Only constructible through validation, so every value of this type joins
/// two existing connectors of identical kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeConnection {
    from: Output,
    to: Input,
}

impl NodeConnection {
    /// Validate and build a connection, reporting why it is invalid
    ///
    /// Both connectors must exist and both must carry exactly `expected`.
    pub fn try_create(
        from_node: &Node,
        from_name: &str,
        to_node: &Node,
        to_name: &str,
        expected: DataKind,
    ) -> Result<Self> {
        let from = from_node
            .output(from_name)
            .ok_or_else(|| EngineError::ConnectorNotFound {
                node_id: from_node.id(),
                name: from_name.to_string(),
            })?;
        let to = to_node
            .input(to_name)
            .ok_or_else(|| EngineError::ConnectorNotFound {
                node_id: to_node.id(),
                name: to_name.to_string(),
            })?;

        for kind in [from.data_type(), to.data_type()] {
            if kind != expected {
                return Err(EngineError::TypeMismatch {
                    expected,
                    found: kind.to_string(),
                });
            }
        }

        Ok(Self {
            from: from.clone(),
            to: to.clone(),
        })
    }

    /// Validate and build a connection; `None` if it would be invalid
    pub fn create(
        from_node: &Node,
        from_name: &str,
        to_node: &Node,
        to_name: &str,
        expected: DataKind,
    ) -> Option<Self> {
        Self::try_create(from_node, from_name, to_node, to_name, expected).ok()
    }

    /// [`NodeConnection::create`] with the expected kind taken from `T`
    pub fn create_typed<T: DataType>(
        from_node: &Node,
        from_name: &str,
        to_node: &Node,
        to_name: &str,
    ) -> Option<Self> {
        Self::create(from_node, from_name, to_node, to_name, T::KIND)
    }

    /// Producing side
    pub fn from(&self) -> &Output {
        &self.from
    }

    /// Consuming side
    pub fn to(&self) -> &Input {
        &self.to
    }

    /// Kind carried by this connection
    pub fn data_type(&self) -> DataKind {
        self.from.data_type()
    }

    /// Whether either end belongs to the given node
    pub fn touches(&self, node: NodeId) -> bool {
        self.from.node_id() == node || self.to.node_id() == node
    }
}

impl fmt::Display for NodeConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} -> {}.{}",
            self.from.node_id(),
            self.from.name(),
            self.to.node_id(),
            self.to.name()
        )
    }
}
