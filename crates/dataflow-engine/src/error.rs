//! Error types for the dataflow engine

use thiserror::Error;

use crate::node::NodeId;
use crate::types::DataKind;

/// Result type alias using EngineError
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur while building or evaluating a graph
#[derive(Debug, Error)]
pub enum EngineError {
    /// A value was boxed or requested against an incompatible data type
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: DataKind, found: String },

    /// A connection referenced a connector the node does not declare
    #[error("Connector '{name}' not found on node {node_id}")]
    ConnectorNotFound { node_id: NodeId, name: String },

    /// The connection set contains a cycle
    #[error("Graph contains a cycle through node {node_id}")]
    CyclicGraph { node_id: NodeId },

    /// A node's compute, one of its output futures, or its output check failed
    #[error("Node {node_id} failed: {cause}")]
    NodeComputeFailure {
        node_id: NodeId,
        #[source]
        cause: Box<EngineError>,
    },

    /// A required input resolved to absent
    #[error("Missing required input: {0}")]
    MissingRequiredInput(String),

    /// A node completed without producing one of its declared outputs
    #[error("Node {node_id} did not produce output '{name}'")]
    MissingOutput { node_id: NodeId, name: String },

    /// No node type is registered under this identifier
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    /// The graph has no node with this id
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    /// A setting override names a key the node type does not declare
    #[error("Unknown setting: {name}")]
    UnknownSetting { name: String },

    /// A node with this id already exists in the graph
    #[error("Duplicate node: {0}")]
    DuplicateNode(NodeId),

    /// A node type declared two connectors with the same name and direction
    #[error("Duplicate connector '{name}' on node {node_id}")]
    DuplicateConnector { node_id: NodeId, name: String },

    /// The input is already the target of another connection
    #[error("Input '{name}' on node {node_id} is already connected")]
    InputAlreadyConnected { node_id: NodeId, name: String },

    /// A regular expression failed to compile
    #[error("Invalid regex: {0}")]
    InvalidRegex(String),

    /// Generic compute failure
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// A builder step referenced an alias that was never declared
    #[error("Unknown node alias: {0}")]
    UnknownAlias(String),

    /// A builder declared the same alias twice
    #[error("Duplicate node alias: {0}")]
    DuplicateAlias(String),

    /// The process-wide registry was initialized twice
    #[error("Node type registry already initialized")]
    RegistryAlreadyInitialized,

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    /// Create an execution failed error with a message
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::ExecutionFailed(msg.into())
    }

    /// Attribute a failure to the node that raised it
    ///
    /// Errors already attributed to a node are returned unchanged.
    pub fn compute_failure(node_id: NodeId, cause: EngineError) -> Self {
        match cause {
            attributed @ Self::NodeComputeFailure { .. } => attributed,
            cause => Self::NodeComputeFailure {
                node_id,
                cause: Box::new(cause),
            },
        }
    }

    /// The underlying error, looking through node attribution
    pub fn root_cause(&self) -> &EngineError {
        match self {
            Self::NodeComputeFailure { cause, .. } => cause.root_cause(),
            other => other,
        }
    }

    /// Create a missing-input error for the named connector
    pub fn missing_input(name: impl Into<String>) -> Self {
        Self::MissingRequiredInput(name.into())
    }

    /// Create a type mismatch error describing the offending raw value
    pub fn type_mismatch(expected: DataKind, found: &serde_json::Value) -> Self {
        Self::TypeMismatch {
            expected,
            found: describe_value(found).to_string(),
        }
    }
}

fn describe_value(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
