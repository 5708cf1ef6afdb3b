//! Conditional Node
//!
//! Selects one of two values based on a boolean condition. The branch kind
//! is configurable, so the same node type routes strings, numbers, booleans
//! or JSON.

use std::sync::Arc;

use dataflow_engine::{
    ready, require, setting, BooleanType, ComputeOutputs, DataBox, DataKind, DataMap, EngineError, Input,
    NodeCategory, NodeId, NodeType, NodeTypeMetadata, Output, Result, Settings, StringType,
};

/// Conditional Node
///
/// # Inputs
/// - `condition` (required) - Which branch to take
/// - `if_true` - Value used when the condition holds
/// - `if_false` - Value used otherwise
///
/// Only the selected branch must be present.
///
/// # Outputs
/// - `value` - The selected branch
///
/// # Settings
/// - `kind` - Kind of the branches and output: `string`, `boolean`,
///   `number` or `json` (default: `string`)
pub struct ConditionalNode;

impl ConditionalNode {
    pub const IDENTIFIER: &'static str = "conditional";
    /// Port ID for condition input
    pub const PORT_CONDITION: &'static str = "condition";
    /// Port ID for the value taken when true
    pub const PORT_IF_TRUE: &'static str = "if_true";
    /// Port ID for the value taken when false
    pub const PORT_IF_FALSE: &'static str = "if_false";
    /// Port ID for the selected value
    pub const PORT_VALUE: &'static str = "value";
    pub const SETTING_KIND: &'static str = "kind";

    fn shared() -> Arc<dyn NodeType> {
        Arc::new(Self)
    }

    fn branch_kind(settings: &Settings) -> Result<DataKind> {
        setting::<StringType>(settings, Self::SETTING_KIND)?.parse()
    }
}

inventory::submit!(dataflow_engine::NodeTypeFn(ConditionalNode::shared));

impl NodeType for ConditionalNode {
    fn metadata(&self) -> NodeTypeMetadata {
        NodeTypeMetadata::new(
            Self::IDENTIFIER,
            NodeCategory::Control,
            "Conditional",
            "Selects a value based on a boolean condition",
        )
    }

    fn settings(&self) -> Settings {
        Settings::from([(
            Self::SETTING_KIND.to_string(),
            DataBox::string(DataKind::String.as_str()),
        )])
    }

    fn inputs(&self, node_id: NodeId, settings: &Settings) -> Vec<Input> {
        // An unparseable kind still yields connectors; compute reports the error
        let kind = Self::branch_kind(settings).unwrap_or(DataKind::String);
        vec![
            Input::typed::<BooleanType>(node_id, Self::PORT_CONDITION),
            Input::new(node_id, Self::PORT_IF_TRUE, kind),
            Input::new(node_id, Self::PORT_IF_FALSE, kind),
        ]
    }

    fn outputs(&self, node_id: NodeId, settings: &Settings) -> Vec<Output> {
        let kind = Self::branch_kind(settings).unwrap_or(DataKind::String);
        vec![Output::new(node_id, Self::PORT_VALUE, kind)]
    }

    fn compute(&self, inputs: DataMap, settings: &Settings) -> Result<ComputeOutputs> {
        let kind = Self::branch_kind(settings)?;
        let condition = require::<BooleanType>(&inputs, Self::PORT_CONDITION)?;

        let branch = if condition {
            Self::PORT_IF_TRUE
        } else {
            Self::PORT_IF_FALSE
        };
        let value = inputs
            .get(branch)
            .filter(|value| value.data_type() == kind)
            .cloned()
            .ok_or_else(|| EngineError::missing_input(branch))?;
        log::debug!("ConditionalNode: condition={}, took {}", condition, branch);

        let mut outputs = ComputeOutputs::new();
        outputs.insert(Self::PORT_VALUE.to_string(), ready(value));
        Ok(outputs)
    }
}
