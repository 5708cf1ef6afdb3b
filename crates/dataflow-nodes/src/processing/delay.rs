//! Delay Node
//!
//! Passes a string through after waiting. The wait happens inside the output
//! future, so other nodes keep resolving while this one sleeps.

use std::sync::Arc;
use std::time::Duration;

use dataflow_engine::{
    require, setting, ComputeOutputs, DataBox, DataMap, EngineError, Input, NodeCategory, NodeId,
    NodeType, NodeTypeMetadata, NumberType, Output, Result, Settings, StringType,
};
use futures_util::FutureExt;

/// Delay Node
///
/// # Inputs
/// - `value` (required) - String to forward
///
/// # Outputs
/// - `value` - The same string, after `millis` milliseconds
///
/// # Settings
/// - `millis` - Wait time; negative values count as zero (default: 0)
pub struct DelayNode;

impl DelayNode {
    pub const IDENTIFIER: &'static str = "delay";
    /// Port ID for value input and output
    pub const PORT_VALUE: &'static str = "value";
    pub const SETTING_MILLIS: &'static str = "millis";

    fn shared() -> Arc<dyn NodeType> {
        Arc::new(Self)
    }
}

inventory::submit!(dataflow_engine::NodeTypeFn(DelayNode::shared));

impl NodeType for DelayNode {
    fn metadata(&self) -> NodeTypeMetadata {
        NodeTypeMetadata::new(
            Self::IDENTIFIER,
            NodeCategory::Processing,
            "Delay",
            "Forwards a value after a fixed wait",
        )
    }

    fn settings(&self) -> Settings {
        Settings::from([(Self::SETTING_MILLIS.to_string(), DataBox::integer(0))])
    }

    fn inputs(&self, node_id: NodeId, _settings: &Settings) -> Vec<Input> {
        vec![Input::typed::<StringType>(node_id, Self::PORT_VALUE)]
    }

    fn outputs(&self, node_id: NodeId, _settings: &Settings) -> Vec<Output> {
        vec![Output::typed::<StringType>(node_id, Self::PORT_VALUE)]
    }

    fn compute(&self, inputs: DataMap, settings: &Settings) -> Result<ComputeOutputs> {
        let value = require::<StringType>(&inputs, Self::PORT_VALUE)?;
        let millis = setting::<NumberType>(settings, Self::SETTING_MILLIS)?.max(0.0) as u64;

        let mut outputs = ComputeOutputs::new();
        outputs.insert(
            Self::PORT_VALUE.to_string(),
            async move {
                tokio::time::sleep(Duration::from_millis(millis)).await;
                log::debug!("DelayNode: released after {}ms", millis);
                Ok::<_, EngineError>(DataBox::string(value))
            }
            .boxed(),
        );
        Ok(outputs)
    }
}
