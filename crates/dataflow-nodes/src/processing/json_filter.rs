//! JSON Filter Node
//!
//! Extracts values from JSON data using path expressions.
//! Supports simple dot notation and array indexing.

use std::sync::Arc;

use dataflow_engine::{
    ready, require, setting, BooleanType, ComputeOutputs, DataBox, DataMap, Input, JsonType,
    NodeCategory, NodeId, NodeType, NodeTypeMetadata, Output, Result, Settings, StringType,
};

/// JSON Filter Node
///
/// # Path Syntax Examples
/// - `""` - The whole document
/// - `"name"` - The "name" field
/// - `"data.items"` - A nested field
/// - `"[0]"` - The first array element
/// - `"items[0].name"` - Combined access
///
/// # Inputs
/// - `json` (required) - JSON data to filter
///
/// # Outputs
/// - `value` - Extracted value (`null` when the path does not resolve)
/// - `found` - Whether the path resolved
///
/// # Settings
/// - `path` - Path expression (default: empty)
pub struct JsonFilterNode;

impl JsonFilterNode {
    pub const IDENTIFIER: &'static str = "json-filter";
    /// Port ID for json input
    pub const PORT_JSON: &'static str = "json";
    /// Port ID for value output
    pub const PORT_VALUE: &'static str = "value";
    /// Port ID for found output
    pub const PORT_FOUND: &'static str = "found";
    pub const SETTING_PATH: &'static str = "path";

    fn shared() -> Arc<dyn NodeType> {
        Arc::new(Self)
    }

    /// Extract a value from JSON using a path expression
    fn extract_path<'a>(json: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
        let mut current = json;
        let mut remaining = path;

        while !remaining.is_empty() {
            if let Some(rest) = remaining.strip_prefix('[') {
                let end = rest.find(']')?;
                let index: usize = rest[..end].parse().ok()?;
                current = current.get(index)?;
                remaining = &rest[end + 1..];
                remaining = remaining.strip_prefix('.').unwrap_or(remaining);
                continue;
            }

            let split = remaining.find(['.', '[']).unwrap_or(remaining.len());
            let (field, rest) = remaining.split_at(split);
            if !field.is_empty() {
                current = current.get(field)?;
            }
            remaining = rest.strip_prefix('.').unwrap_or(rest);
        }

        Some(current)
    }
}

inventory::submit!(dataflow_engine::NodeTypeFn(JsonFilterNode::shared));

impl NodeType for JsonFilterNode {
    fn metadata(&self) -> NodeTypeMetadata {
        NodeTypeMetadata::new(
            Self::IDENTIFIER,
            NodeCategory::Processing,
            "JSON Filter",
            "Extracts values from JSON using path expressions",
        )
    }

    fn settings(&self) -> Settings {
        Settings::from([(Self::SETTING_PATH.to_string(), DataBox::string(""))])
    }

    fn inputs(&self, node_id: NodeId, _settings: &Settings) -> Vec<Input> {
        vec![Input::typed::<JsonType>(node_id, Self::PORT_JSON)]
    }

    fn outputs(&self, node_id: NodeId, _settings: &Settings) -> Vec<Output> {
        vec![
            Output::typed::<JsonType>(node_id, Self::PORT_VALUE),
            Output::typed::<BooleanType>(node_id, Self::PORT_FOUND),
        ]
    }

    fn compute(&self, inputs: DataMap, settings: &Settings) -> Result<ComputeOutputs> {
        let json = require::<JsonType>(&inputs, Self::PORT_JSON)?;
        let path = setting::<StringType>(settings, Self::SETTING_PATH)?;

        let extracted = Self::extract_path(&json, &path).cloned();
        let found = extracted.is_some();
        log::debug!("JsonFilterNode: path '{}' found={}", path, found);

        let mut outputs = ComputeOutputs::new();
        outputs.insert(
            Self::PORT_VALUE.to_string(),
            ready(DataBox::json(extracted.unwrap_or(serde_json::Value::Null))),
        );
        outputs.insert(Self::PORT_FOUND.to_string(), ready(DataBox::boolean(found)));
        Ok(outputs)
    }
}
