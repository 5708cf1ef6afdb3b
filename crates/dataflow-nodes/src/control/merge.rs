//! Merge Node
//!
//! Combines several string inputs into a single output. Useful for
//! aggregating results from parallel branches.

use std::sync::Arc;

use dataflow_engine::{
    ready, setting, ComputeOutputs, DataBox, DataMap, Input, NodeCategory, NodeId, NodeType,
    NodeTypeMetadata, NumberType, Output, Result, Settings, StringType,
};

/// Upper bound on declared inputs
const MAX_INPUTS: usize = 64;

/// Merge Node
///
/// Declares `input_0` .. `input_{n-1}` where `n` comes from the `inputs`
/// setting. All inputs are optional; missing and blank ones are skipped.
///
/// # Outputs
/// - `merged` - Present inputs joined with `separator`, in port order
/// - `count` - Number of inputs merged
///
/// # Settings
/// - `inputs` - Number of input ports (default: 2)
/// - `separator` - Join string (default: newline)
pub struct MergeNode;

impl MergeNode {
    pub const IDENTIFIER: &'static str = "merge";
    /// Port ID for merged output
    pub const PORT_MERGED: &'static str = "merged";
    /// Port ID for count output
    pub const PORT_COUNT: &'static str = "count";
    pub const SETTING_INPUTS: &'static str = "inputs";
    pub const SETTING_SEPARATOR: &'static str = "separator";

    fn shared() -> Arc<dyn NodeType> {
        Arc::new(Self)
    }

    /// Port ID of the `index`th input
    pub fn input_port(index: usize) -> String {
        format!("input_{}", index)
    }

    fn input_count(settings: &Settings) -> usize {
        setting::<NumberType>(settings, Self::SETTING_INPUTS)
            .map(|n| n.clamp(0.0, MAX_INPUTS as f64) as usize)
            .unwrap_or(0)
    }
}

inventory::submit!(dataflow_engine::NodeTypeFn(MergeNode::shared));

impl NodeType for MergeNode {
    fn metadata(&self) -> NodeTypeMetadata {
        NodeTypeMetadata::new(
            Self::IDENTIFIER,
            NodeCategory::Control,
            "Merge",
            "Combines multiple string inputs into one",
        )
    }

    fn settings(&self) -> Settings {
        Settings::from([
            (Self::SETTING_INPUTS.to_string(), DataBox::integer(2)),
            (Self::SETTING_SEPARATOR.to_string(), DataBox::string("\n")),
        ])
    }

    fn inputs(&self, node_id: NodeId, settings: &Settings) -> Vec<Input> {
        (0..Self::input_count(settings))
            .map(|i| Input::typed::<StringType>(node_id, Self::input_port(i)))
            .collect()
    }

    fn outputs(&self, node_id: NodeId, _settings: &Settings) -> Vec<Output> {
        vec![
            Output::typed::<StringType>(node_id, Self::PORT_MERGED),
            Output::typed::<NumberType>(node_id, Self::PORT_COUNT),
        ]
    }

    fn compute(&self, inputs: DataMap, settings: &Settings) -> Result<ComputeOutputs> {
        let separator = setting::<StringType>(settings, Self::SETTING_SEPARATOR)?;

        let parts: Vec<String> = (0..Self::input_count(settings))
            .filter_map(|i| DataBox::get_input::<StringType>(&inputs, &Self::input_port(i)))
            .filter(|s| !s.trim().is_empty())
            .collect();
        let merged = parts.join(&separator);
        log::debug!(
            "MergeNode: merged {} inputs into {} chars",
            parts.len(),
            merged.len()
        );

        let mut outputs = ComputeOutputs::new();
        outputs.insert(Self::PORT_MERGED.to_string(), ready(DataBox::string(merged)));
        outputs.insert(
            Self::PORT_COUNT.to_string(),
            ready(DataBox::integer(parts.len() as i64)),
        );
        Ok(outputs)
    }
}
