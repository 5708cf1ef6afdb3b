//! The node type contract
//!
//! A [`NodeType`] is a stateless definition of a kind of node. Given a node id
//! and the node's settings it declares the node's connectors, and its
//! [`NodeType::compute`] maps resolved inputs to one future per output.
//!
//! Node types are published to the registry through [`NodeTypeFn`], collected
//! at link time with `inventory`:
//!
//! ```ignore
//! impl MyNode {
//!     fn shared() -> Arc<dyn NodeType> {
//!         Arc::new(MyNode)
//!     }
//! }
//!
//! inventory::submit!(dataflow_engine::NodeTypeFn(MyNode::shared));
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use futures_util::future::{self, BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};

use crate::connector::{Input, Output};
use crate::error::{EngineError, Result};
use crate::node::NodeId;
use crate::types::{DataBox, DataMap, DataType, Settings};

/// A pending output value
pub type OutputFuture = BoxFuture<'static, Result<DataBox>>;

/// One pending value per output name
pub type ComputeOutputs = BTreeMap<String, OutputFuture>;

/// Category of a node type, for palette grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeCategory {
    /// Nodes that introduce values into a graph
    Input,
    /// Terminal nodes that expose results
    Output,
    /// Nodes that transform values
    Processing,
    /// Nodes that select or route values
    Control,
}

/// Descriptive metadata for a node type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTypeMetadata {
    /// Registry identifier (e.g. "regex-match")
    pub identifier: String,
    /// Category for grouping
    pub category: NodeCategory,
    /// Human-readable label
    pub label: String,
    /// What the node does
    pub description: String,
}

impl NodeTypeMetadata {
    pub fn new(
        identifier: impl Into<String>,
        category: NodeCategory,
        label: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            category,
            label: label.into(),
            description: description.into(),
        }
    }
}

/// A computable kind of node
///
/// Implementations hold no per-node state; everything a node needs arrives
/// through its settings and inputs.
pub trait NodeType: Send + Sync {
    /// Identifier and display metadata
    fn metadata(&self) -> NodeTypeMetadata;

    /// Default settings. Node instances may override values but not kinds.
    fn settings(&self) -> Settings {
        Settings::new()
    }

    /// Input connectors for a node with these settings
    fn inputs(&self, node_id: NodeId, settings: &Settings) -> Vec<Input>;

    /// Output connectors for a node with these settings
    fn outputs(&self, node_id: NodeId, settings: &Settings) -> Vec<Output>;

    /// Start computing every output
    ///
    /// Inputs that are unconnected and have no fallback value are absent from
    /// `inputs`; a node that needs them must fail rather than invent a default.
    fn compute(&self, inputs: DataMap, settings: &Settings) -> Result<ComputeOutputs>;
}

/// Link-time registration of a node type
pub struct NodeTypeFn(pub fn() -> Arc<dyn NodeType>);

inventory::collect!(NodeTypeFn);

/// An output that is already complete
pub fn ready(value: DataBox) -> OutputFuture {
    future::ready(Ok(value)).boxed()
}

/// Read a required input, failing with `MissingRequiredInput` when it is
/// absent or of the wrong kind
pub fn require<T: DataType>(inputs: &DataMap, name: &str) -> Result<T::Value> {
    DataBox::get_input::<T>(inputs, name).ok_or_else(|| EngineError::missing_input(name))
}

/// Read a setting as `T`
pub fn setting<T: DataType>(settings: &Settings, name: &str) -> Result<T::Value> {
    settings
        .get(name)
        .ok_or_else(|| EngineError::UnknownSetting {
            name: name.to_string(),
        })?
        .get::<T>()
        .ok_or_else(|| EngineError::TypeMismatch {
            expected: T::KIND,
            found: settings
                .get(name)
                .map(|b| b.data_type().to_string())
                .unwrap_or_default(),
        })
}
