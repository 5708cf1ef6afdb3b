//! Typed, named sockets on a node
//!
//! Connectors are derived from a node type and the node's settings every time
//! a node is built; they are never persisted on their own. The direction is a
//! type parameter so that a connection can only ever run from an [`Output`] to
//! an [`Input`].

use std::fmt;
use std::marker::PhantomData;

use crate::node::NodeId;
use crate::types::{DataKind, DataType};

/// Direction marker for input connectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct In;

/// Direction marker for output connectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Out;

/// A named socket of a given data kind, identified by `(node_id, name)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Connector<D> {
    node_id: NodeId,
    name: String,
    data_type: DataKind,
    settable: bool,
    _direction: PhantomData<D>,
}

/// An input socket
pub type Input = Connector<In>;

/// An output socket
pub type Output = Connector<Out>;

impl<D> Connector<D> {
    /// Create a connector
    pub fn new(node_id: NodeId, name: impl Into<String>, data_type: DataKind) -> Self {
        Self {
            node_id,
            name: name.into(),
            data_type,
            settable: false,
            _direction: PhantomData,
        }
    }

    /// Create a connector whose kind comes from a [`DataType`]
    pub fn typed<T: DataType>(node_id: NodeId, name: impl Into<String>) -> Self {
        Self::new(node_id, name, T::KIND)
    }

    /// Owning node
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// Connector name, unique per node and direction
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Data kind carried by this connector
    pub fn data_type(&self) -> DataKind {
        self.data_type
    }
}

impl Connector<In> {
    /// Create an input that falls back to the node setting of the same name
    /// when nothing is connected to it
    pub fn settable(node_id: NodeId, name: impl Into<String>, data_type: DataKind) -> Self {
        Self {
            settable: true,
            ..Self::new(node_id, name, data_type)
        }
    }

    /// Whether an unconnected input may be fed from the node's settings
    pub fn is_settable(&self) -> bool {
        self.settable
    }
}

impl<D> fmt::Display for Connector<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}: {}", self.node_id, self.name, self.data_type)
    }
}
