//! Text Input Node
//!
//! Provides a text value to the graph. The `text` input is settable: when
//! nothing is connected, the node emits its `text` setting instead.

use std::sync::Arc;

use dataflow_engine::{
    ready, setting, ComputeOutputs, DataBox, DataKind, DataMap, Input, NodeCategory, NodeId, NodeType,
    NodeTypeMetadata, Output, Result, Settings, StringType,
};

/// Text Input Node
///
/// # Inputs
/// - `text` (settable) - The text value to pass through
///
/// # Outputs
/// - `text` - The connected value, or the `text` setting
///
/// # Settings
/// - `text` - Fallback value (default: empty string)
pub struct TextInputNode;

impl TextInputNode {
    pub const IDENTIFIER: &'static str = "text-input";
    /// Port ID for text input and output
    pub const PORT_TEXT: &'static str = "text";

    fn shared() -> Arc<dyn NodeType> {
        Arc::new(Self)
    }
}

inventory::submit!(dataflow_engine::NodeTypeFn(TextInputNode::shared));

impl NodeType for TextInputNode {
    fn metadata(&self) -> NodeTypeMetadata {
        NodeTypeMetadata::new(
            Self::IDENTIFIER,
            NodeCategory::Input,
            "Text Input",
            "Provides text input to the graph",
        )
    }

    fn settings(&self) -> Settings {
        Settings::from([(Self::PORT_TEXT.to_string(), DataBox::string(""))])
    }

    fn inputs(&self, node_id: NodeId, _settings: &Settings) -> Vec<Input> {
        vec![Input::settable(node_id, Self::PORT_TEXT, DataKind::String)]
    }

    fn outputs(&self, node_id: NodeId, _settings: &Settings) -> Vec<Output> {
        vec![Output::typed::<StringType>(node_id, Self::PORT_TEXT)]
    }

    fn compute(&self, inputs: DataMap, settings: &Settings) -> Result<ComputeOutputs> {
        let text = match DataBox::get_input::<StringType>(&inputs, Self::PORT_TEXT) {
            Some(text) => text,
            None => setting::<StringType>(settings, Self::PORT_TEXT)?,
        };
        log::debug!("TextInputNode: passing through {} chars", text.len());

        let mut outputs = ComputeOutputs::new();
        outputs.insert(Self::PORT_TEXT.to_string(), ready(DataBox::string(text)));
        Ok(outputs)
    }
}
