//! Text Output Node
//!
//! Terminal node that exposes a text result. It passes its input through so
//! callers can read the value from the node's outputs after evaluation.

use std::sync::Arc;

use dataflow_engine::{
    ready, require, ComputeOutputs, DataBox, DataMap, Input, NodeCategory, NodeId, NodeType,
    NodeTypeMetadata, Output, Result, Settings, StringType,
};

/// Text Output Node
///
/// # Inputs
/// - `text` (required) - The text to display
///
/// # Outputs
/// - `text` - The same text
pub struct TextOutputNode;

impl TextOutputNode {
    pub const IDENTIFIER: &'static str = "text-output";
    /// Port ID for text input and output
    pub const PORT_TEXT: &'static str = "text";

    fn shared() -> Arc<dyn NodeType> {
        Arc::new(Self)
    }
}

inventory::submit!(dataflow_engine::NodeTypeFn(TextOutputNode::shared));

impl NodeType for TextOutputNode {
    fn metadata(&self) -> NodeTypeMetadata {
        NodeTypeMetadata::new(
            Self::IDENTIFIER,
            NodeCategory::Output,
            "Text Output",
            "Displays text output",
        )
    }

    fn inputs(&self, node_id: NodeId, _settings: &Settings) -> Vec<Input> {
        vec![Input::typed::<StringType>(node_id, Self::PORT_TEXT)]
    }

    fn outputs(&self, node_id: NodeId, _settings: &Settings) -> Vec<Output> {
        vec![Output::typed::<StringType>(node_id, Self::PORT_TEXT)]
    }

    fn compute(&self, inputs: DataMap, _settings: &Settings) -> Result<ComputeOutputs> {
        let text = require::<StringType>(&inputs, Self::PORT_TEXT)?;
        log::debug!("TextOutputNode: received {} chars", text.len());

        let mut outputs = ComputeOutputs::new();
        outputs.insert(Self::PORT_TEXT.to_string(), ready(DataBox::string(text)));
        Ok(outputs)
    }
}
