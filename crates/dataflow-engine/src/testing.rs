//! Small node types shared by the unit tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;

use crate::connector::{Input, Output};
use crate::error::{EngineError, Result};
use crate::node::{Node, NodeId};
use crate::node_type::{
    ready, require, setting, ComputeOutputs, NodeCategory, NodeType, NodeTypeMetadata,
};
use crate::registry::NodeTypeRegistry;
use crate::types::{BooleanType, DataBox, DataKind, DataMap, NumberType, Settings, StringType};

fn settings_of(entries: &[(&str, DataBox)]) -> Settings {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// Emits its `value` setting as a string
pub struct Source;

impl NodeType for Source {
    fn metadata(&self) -> NodeTypeMetadata {
        NodeTypeMetadata::new("source", NodeCategory::Input, "Source", "Emits a string setting")
    }

    fn settings(&self) -> Settings {
        settings_of(&[("value", DataBox::string(""))])
    }

    fn inputs(&self, _node_id: NodeId, _settings: &Settings) -> Vec<Input> {
        Vec::new()
    }

    fn outputs(&self, node_id: NodeId, _settings: &Settings) -> Vec<Output> {
        vec![Output::typed::<StringType>(node_id, "value")]
    }

    fn compute(&self, _inputs: DataMap, settings: &Settings) -> Result<ComputeOutputs> {
        let value = setting::<StringType>(settings, "value")?;
        let mut outputs = ComputeOutputs::new();
        outputs.insert("value".to_string(), ready(DataBox::string(value)));
        Ok(outputs)
    }
}

/// Emits its `value` setting as a boolean
pub struct Flag;

impl NodeType for Flag {
    fn metadata(&self) -> NodeTypeMetadata {
        NodeTypeMetadata::new("flag", NodeCategory::Input, "Flag", "Emits a boolean setting")
    }

    fn settings(&self) -> Settings {
        settings_of(&[("value", DataBox::boolean(false))])
    }

    fn inputs(&self, _node_id: NodeId, _settings: &Settings) -> Vec<Input> {
        Vec::new()
    }

    fn outputs(&self, node_id: NodeId, _settings: &Settings) -> Vec<Output> {
        vec![Output::typed::<BooleanType>(node_id, "value")]
    }

    fn compute(&self, _inputs: DataMap, settings: &Settings) -> Result<ComputeOutputs> {
        let value = setting::<BooleanType>(settings, "value")?;
        let mut outputs = ComputeOutputs::new();
        outputs.insert("value".to_string(), ready(DataBox::boolean(value)));
        Ok(outputs)
    }
}

/// Copies a required string input to its output
pub struct Relay;

impl NodeType for Relay {
    fn metadata(&self) -> NodeTypeMetadata {
        NodeTypeMetadata::new("relay", NodeCategory::Processing, "Relay", "Copies its input")
    }

    fn inputs(&self, node_id: NodeId, _settings: &Settings) -> Vec<Input> {
        vec![Input::typed::<StringType>(node_id, "value")]
    }

    fn outputs(&self, node_id: NodeId, _settings: &Settings) -> Vec<Output> {
        vec![Output::typed::<StringType>(node_id, "value")]
    }

    fn compute(&self, inputs: DataMap, _settings: &Settings) -> Result<ComputeOutputs> {
        let value = require::<StringType>(&inputs, "value")?;
        let mut outputs = ComputeOutputs::new();
        outputs.insert("value".to_string(), ready(DataBox::string(value)));
        Ok(outputs)
    }
}

/// Like [`Relay`], but an unconnected input falls back to the `value` setting
pub struct Fallback;

impl NodeType for Fallback {
    fn metadata(&self) -> NodeTypeMetadata {
        NodeTypeMetadata::new("fallback", NodeCategory::Processing, "Fallback", "Relay with default")
    }

    fn settings(&self) -> Settings {
        settings_of(&[("value", DataBox::string("default"))])
    }

    fn inputs(&self, node_id: NodeId, _settings: &Settings) -> Vec<Input> {
        vec![Input::settable(node_id, "value", DataKind::String)]
    }

    fn outputs(&self, node_id: NodeId, _settings: &Settings) -> Vec<Output> {
        vec![Output::typed::<StringType>(node_id, "value")]
    }

    fn compute(&self, inputs: DataMap, _settings: &Settings) -> Result<ComputeOutputs> {
        let value = require::<StringType>(&inputs, "value")?;
        let mut outputs = ComputeOutputs::new();
        outputs.insert("value".to_string(), ready(DataBox::string(value)));
        Ok(outputs)
    }
}

/// Concatenates `left` and `right`
pub struct Join;

impl NodeType for Join {
    fn metadata(&self) -> NodeTypeMetadata {
        NodeTypeMetadata::new("join", NodeCategory::Processing, "Join", "Concatenates two strings")
    }

    fn inputs(&self, node_id: NodeId, _settings: &Settings) -> Vec<Input> {
        vec![
            Input::typed::<StringType>(node_id, "left"),
            Input::typed::<StringType>(node_id, "right"),
        ]
    }

    fn outputs(&self, node_id: NodeId, _settings: &Settings) -> Vec<Output> {
        vec![Output::typed::<StringType>(node_id, "joined")]
    }

    fn compute(&self, inputs: DataMap, _settings: &Settings) -> Result<ComputeOutputs> {
        let left = require::<StringType>(&inputs, "left")?;
        let right = require::<StringType>(&inputs, "right")?;
        let mut outputs = ComputeOutputs::new();
        outputs.insert("joined".to_string(), ready(DataBox::string(left + &right)));
        Ok(outputs)
    }
}

/// How a [`Broken`] node misbehaves
#[derive(Debug, Clone, Copy)]
pub enum Breakage {
    /// compute itself returns an error
    Compute,
    /// the output future resolves to an error
    Future,
    /// the declared output is never produced
    MissingOutput,
    /// the output has the wrong kind
    WrongKind,
}

/// A source-shaped node that fails in a configurable way
pub struct Broken(pub Breakage);

impl NodeType for Broken {
    fn metadata(&self) -> NodeTypeMetadata {
        NodeTypeMetadata::new("broken", NodeCategory::Input, "Broken", "Always fails")
    }

    fn inputs(&self, _node_id: NodeId, _settings: &Settings) -> Vec<Input> {
        Vec::new()
    }

    fn outputs(&self, node_id: NodeId, _settings: &Settings) -> Vec<Output> {
        vec![Output::typed::<StringType>(node_id, "value")]
    }

    fn compute(&self, _inputs: DataMap, _settings: &Settings) -> Result<ComputeOutputs> {
        let mut outputs = ComputeOutputs::new();
        match self.0 {
            Breakage::Compute => return Err(EngineError::failed("boom")),
            Breakage::Future => {
                outputs.insert(
                    "value".to_string(),
                    async { Err::<DataBox, _>(EngineError::failed("late boom")) }.boxed(),
                );
            }
            Breakage::MissingOutput => {}
            Breakage::WrongKind => {
                outputs.insert("value".to_string(), ready(DataBox::boolean(true)));
            }
        }
        Ok(outputs)
    }
}

/// Emits a string after sleeping `millis`, counting how often it computed
pub struct Slow {
    pub computes: Arc<AtomicUsize>,
}

impl Slow {
    pub fn new() -> (Self, Arc<AtomicUsize>) {
        let computes = Arc::new(AtomicUsize::new(0));
        (
            Self {
                computes: computes.clone(),
            },
            computes,
        )
    }
}

impl NodeType for Slow {
    fn metadata(&self) -> NodeTypeMetadata {
        NodeTypeMetadata::new("slow", NodeCategory::Input, "Slow", "Sleeps, then emits")
    }

    fn settings(&self) -> Settings {
        settings_of(&[
            ("millis", DataBox::number(0.0).unwrap()),
            ("value", DataBox::string("")),
        ])
    }

    fn inputs(&self, _node_id: NodeId, _settings: &Settings) -> Vec<Input> {
        Vec::new()
    }

    fn outputs(&self, node_id: NodeId, _settings: &Settings) -> Vec<Output> {
        vec![Output::typed::<StringType>(node_id, "value")]
    }

    fn compute(&self, _inputs: DataMap, settings: &Settings) -> Result<ComputeOutputs> {
        self.computes.fetch_add(1, Ordering::SeqCst);
        let millis = setting::<NumberType>(settings, "millis")?;
        let value = setting::<StringType>(settings, "value")?;

        let mut outputs = ComputeOutputs::new();
        outputs.insert(
            "value".to_string(),
            async move {
                tokio::time::sleep(Duration::from_millis(millis as u64)).await;
                Ok::<_, EngineError>(DataBox::string(value))
            }
            .boxed(),
        );
        Ok(outputs)
    }
}

/// A source node with the given string value
pub fn source(value: &str) -> Node {
    Node::new("source", Arc::new(Source), settings_of(&[("value", DataBox::string(value))]))
        .unwrap()
}

/// A flag node with the given boolean value
pub fn flag(value: bool) -> Node {
    Node::new("flag", Arc::new(Flag), settings_of(&[("value", DataBox::boolean(value))])).unwrap()
}

/// A relay node
pub fn relay() -> Node {
    Node::new("relay", Arc::new(Relay), Settings::new()).unwrap()
}

/// Registry with every well-behaved test node type
pub fn test_registry() -> NodeTypeRegistry {
    let mut registry = NodeTypeRegistry::new();
    registry.register_type(Arc::new(Source));
    registry.register_type(Arc::new(Flag));
    registry.register_type(Arc::new(Relay));
    registry.register_type(Arc::new(Fallback));
    registry.register_type(Arc::new(Join));
    registry
}

/// Setting map helper for tests
pub fn settings(entries: &[(&str, DataBox)]) -> Settings {
    settings_of(entries)
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
