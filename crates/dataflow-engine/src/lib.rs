//! Dataflow Engine - typed node graph evaluation
//!
//! A graph is a set of nodes joined by typed connections. Each node is an
//! instance of a [`NodeType`] looked up in a [`NodeTypeRegistry`]; the node
//! type declares the node's input and output connectors and computes its
//! outputs from its inputs. Evaluation resolves every node in dependency
//! order, running independent nodes concurrently.
//!
//! # Architecture
//!
//! - `types`: [`DataKind`], the [`DataType`] markers and the [`DataBox`] value
//! - `connector` / `connection`: typed endpoints and validated edges
//! - `node_type` / `registry`: the node type contract and its catalog
//! - `node` / `graph`: instances and the graph aggregate
//! - `engine`: evaluation with per-node failure tracking
//! - `record`, `validation`, `builder`: storage form, graph checks and construction
//!
//! # Example
//!
//! ```ignore
//! use dataflow_engine::{evaluate, GraphBuilder, DataBox};
//!
//! let built = GraphBuilder::new(&registry)
//!     .node("pattern", "text-input")
//!     .with_setting("text", DataBox::string("a.c"))
//!     .node("word", "text-input")
//!     .with_setting("text", DataBox::string("abc"))
//!     .node("match", "regex-match")
//!     .connect("pattern", "text", "match", "regex")
//!     .connect("word", "text", "match", "word")
//!     .build()?;
//!
//! let outputs = evaluate(built.graph()).await.into_result()?;
//! ```

pub mod builder;
pub mod connection;
pub mod connector;
pub mod engine;
pub mod error;
pub mod events;
pub mod graph;
pub mod node;
pub mod node_type;
pub mod record;
pub mod registry;
pub mod types;
pub mod validation;

#[cfg(test)]
mod testing;

// Re-export key types
pub use builder::{BuiltGraph, GraphBuilder};
pub use connection::NodeConnection;
pub use connector::{Connector, In, Input, Out, Output};
pub use engine::{
    evaluate, EvaluationResult, Evaluator, EvaluatorConfig, FailureReport, NodeFailure,
    NodeState, ResolvedOutputs,
};
pub use error::{EngineError, Result};
pub use events::{EvaluationEvent, EventError, EventSink, NullEventSink, VecEventSink};
pub use graph::Graph;
pub use node::{Node, NodeId};
pub use node_type::{
    ready, require, setting, ComputeOutputs, NodeCategory, NodeType, NodeTypeFn,
    NodeTypeMetadata, OutputFuture,
};
pub use record::{ConnectionRecord, GraphRecord, NodeRecord};
pub use registry::NodeTypeRegistry;
pub use types::{
    BooleanType, DataBox, DataKind, DataMap, DataType, JsonType, NumberType, Settings,
    StringType,
};
pub use validation::{validate_graph, validate_record, ValidationError};
