//! Boolean Input Node

use std::sync::Arc;

use dataflow_engine::{
    ready, setting, BooleanType, ComputeOutputs, DataBox, DataKind, DataMap, Input, NodeCategory,
    NodeId, NodeType, NodeTypeMetadata, Output, Result, Settings,
};

/// Boolean Input Node
///
/// Emits the connected `value`, or its `value` setting (default: false)
/// when nothing is connected.
pub struct BooleanInputNode;

impl BooleanInputNode {
    pub const IDENTIFIER: &'static str = "boolean-input";
    /// Port ID for value input and output
    pub const PORT_VALUE: &'static str = "value";

    fn shared() -> Arc<dyn NodeType> {
        Arc::new(Self)
    }
}

inventory::submit!(dataflow_engine::NodeTypeFn(BooleanInputNode::shared));

impl NodeType for BooleanInputNode {
    fn metadata(&self) -> NodeTypeMetadata {
        NodeTypeMetadata::new(
            Self::IDENTIFIER,
            NodeCategory::Input,
            "Boolean Input",
            "Provides a true/false value to the graph",
        )
    }

    fn settings(&self) -> Settings {
        Settings::from([(Self::PORT_VALUE.to_string(), DataBox::boolean(false))])
    }

    fn inputs(&self, node_id: NodeId, _settings: &Settings) -> Vec<Input> {
        vec![Input::settable(node_id, Self::PORT_VALUE, DataKind::Boolean)]
    }

    fn outputs(&self, node_id: NodeId, _settings: &Settings) -> Vec<Output> {
        vec![Output::typed::<BooleanType>(node_id, Self::PORT_VALUE)]
    }

    fn compute(&self, inputs: DataMap, settings: &Settings) -> Result<ComputeOutputs> {
        let value = match DataBox::get_input::<BooleanType>(&inputs, Self::PORT_VALUE) {
            Some(value) => value,
            None => setting::<BooleanType>(settings, Self::PORT_VALUE)?,
        };

        let mut outputs = ComputeOutputs::new();
        outputs.insert(Self::PORT_VALUE.to_string(), ready(DataBox::boolean(value)));
        Ok(outputs)
    }
}
