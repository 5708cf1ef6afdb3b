//! Regex Match Node
//!
//! Tests whether a word matches a regular expression in full.

use std::sync::Arc;

use dataflow_engine::{
    ready, require, BooleanType, ComputeOutputs, DataBox, DataMap, EngineError, Input,
    NodeCategory, NodeId, NodeType, NodeTypeMetadata, Output, Result, Settings, StringType,
};
use regex::Regex;

/// Regex Match Node
///
/// The pattern must match the whole word: `a.c` matches `abc` but not
/// `abcd`.
///
/// # Inputs
/// - `regex` (required) - Pattern to compile
/// - `word` (required) - Text to test
///
/// # Outputs
/// - `output` - Whether the entire word matches
///
/// # Settings
/// - `template` - Declared for editors (default: `"{}"`); not used when matching
pub struct RegexMatchNode;

impl RegexMatchNode {
    pub const IDENTIFIER: &'static str = "regex-match";
    /// Port ID for the pattern input
    pub const PORT_REGEX: &'static str = "regex";
    /// Port ID for the tested text
    pub const PORT_WORD: &'static str = "word";
    /// Port ID for the match result
    pub const PORT_OUTPUT: &'static str = "output";
    pub const SETTING_TEMPLATE: &'static str = "template";

    fn shared() -> Arc<dyn NodeType> {
        Arc::new(Self)
    }

    /// Compile `pattern` so it only matches a complete string
    ///
    /// The bare pattern must compile too: an unbalanced pattern can become
    /// valid once wrapped.
    fn compile_anchored(pattern: &str) -> Result<Regex> {
        let invalid = |e: regex::Error| EngineError::InvalidRegex(e.to_string());
        Regex::new(pattern).map_err(invalid)?;
        Regex::new(&format!("^(?:{})$", pattern)).map_err(invalid)
    }
}

inventory::submit!(dataflow_engine::NodeTypeFn(RegexMatchNode::shared));

impl NodeType for RegexMatchNode {
    fn metadata(&self) -> NodeTypeMetadata {
        NodeTypeMetadata::new(
            Self::IDENTIFIER,
            NodeCategory::Processing,
            "Regex Match",
            "Checks whether a word fully matches a regular expression",
        )
    }

    fn settings(&self) -> Settings {
        Settings::from([(Self::SETTING_TEMPLATE.to_string(), DataBox::string("{}"))])
    }

    fn inputs(&self, node_id: NodeId, _settings: &Settings) -> Vec<Input> {
        vec![
            Input::typed::<StringType>(node_id, Self::PORT_REGEX),
            Input::typed::<StringType>(node_id, Self::PORT_WORD),
        ]
    }

    fn outputs(&self, node_id: NodeId, _settings: &Settings) -> Vec<Output> {
        vec![Output::typed::<BooleanType>(node_id, Self::PORT_OUTPUT)]
    }

    fn compute(&self, inputs: DataMap, _settings: &Settings) -> Result<ComputeOutputs> {
        let pattern = require::<StringType>(&inputs, Self::PORT_REGEX)?;
        let word = require::<StringType>(&inputs, Self::PORT_WORD)?;

        let regex = Self::compile_anchored(&pattern)?;
        let matched = regex.is_match(&word);
        log::debug!("RegexMatchNode: '{}' against '{}' -> {}", pattern, word, matched);

        let mut outputs = ComputeOutputs::new();
        outputs.insert(Self::PORT_OUTPUT.to_string(), ready(DataBox::boolean(matched)));
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::run;

    async fn is_full_match(pattern: &str, word: &str) -> Result<bool> {
        let outputs = run(
            &RegexMatchNode,
            &[
                ("regex", DataBox::string(pattern)),
                ("word", DataBox::string(word)),
            ],
            &[],
        )
        .await?;
        Ok(outputs["output"].get::<BooleanType>().unwrap())
    }

    #[test]
    fn test_metadata_and_connectors() {
        let meta = RegexMatchNode.metadata();
        assert_eq!(meta.identifier, "regex-match");
        assert_eq!(meta.category, NodeCategory::Processing);

        let settings = RegexMatchNode.settings();
        assert_eq!(settings["template"], DataBox::string("{}"));
        assert_eq!(RegexMatchNode.inputs(NodeId::new(), &settings).len(), 2);
        assert_eq!(RegexMatchNode.outputs(NodeId::new(), &settings).len(), 1);
    }

    #[tokio::test]
    async fn test_full_match() {
        assert!(is_full_match("a.c", "abc").await.unwrap());
        assert!(is_full_match("[0-9]+", "2024").await.unwrap());
    }

    #[tokio::test]
    async fn test_partial_match_is_false() {
        assert!(!is_full_match("a.c", "abcd").await.unwrap());
        assert!(!is_full_match("a.c", "xabc").await.unwrap());
        // Alternation is anchored as a whole
        assert!(!is_full_match("a|b", "ab").await.unwrap());
        assert!(is_full_match("a|b", "b").await.unwrap());
    }

    #[tokio::test]
    async fn test_invalid_pattern() {
        assert!(matches!(
            is_full_match("(unclosed", "x").await,
            Err(EngineError::InvalidRegex(_))
        ));
    }

    #[tokio::test]
    async fn test_unbalanced_group_is_invalid() {
        // Wrapped naively this would read as `^(?:a)|(b)$` and match "axyz"
        for pattern in ["a)|(b", "a)(b", ")"] {
            assert!(matches!(
                is_full_match(pattern, "axyz").await,
                Err(EngineError::InvalidRegex(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_missing_word() {
        let result = run(&RegexMatchNode, &[("regex", DataBox::string("a.c"))], &[]).await;
        assert!(matches!(result, Err(EngineError::MissingRequiredInput(name)) if name == "word"));
    }

    #[tokio::test]
    async fn test_template_does_not_affect_matching() {
        let outputs = run(
            &RegexMatchNode,
            &[
                ("regex", DataBox::string("a.c")),
                ("word", DataBox::string("abc")),
            ],
            &[("template", DataBox::string("prefix {} suffix"))],
        )
        .await
        .unwrap();
        assert_eq!(outputs["output"], DataBox::boolean(true));
    }
}
