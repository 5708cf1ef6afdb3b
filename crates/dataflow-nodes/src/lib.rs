//! Dataflow Nodes
//!
//! Built-in node types for the dataflow engine. Each node type registers
//! itself at link time, so linking this crate is enough for
//! [`NodeTypeRegistry::with_builtins`] to find them.
//!
//! # Categories
//!
//! - **Input**: nodes that emit a value from their settings or a connection
//! - **Output**: terminal nodes that expose results
//! - **Processing**: nodes that transform data (regex matching, JSON paths)
//! - **Control**: nodes that route or combine values

use std::sync::Arc;

use dataflow_engine::{registry, NodeTypeRegistry};

pub mod control;
pub mod input;
pub mod output;
pub mod processing;

pub use control::*;
pub use input::*;
pub use output::*;
pub use processing::*;

/// Install the process-wide registry with every linked node type
///
/// Safe to call more than once; later calls return the registry installed
/// by the first.
pub fn init() -> Arc<NodeTypeRegistry> {
    registry::get_or_init(NodeTypeRegistry::with_builtins)
}


#[cfg(test)]
mod tests {
    use dataflow_engine::{
        evaluate, DataBox, EngineError, EvaluationResult, GraphBuilder, NodeCategory, NodeState,
    };

    use super::testing::init_logging;
    use super::*;

    #[test]
    fn test_inventory_collects_all_builtins() {
        let registry = NodeTypeRegistry::with_builtins();
        assert_eq!(
            registry.node_types(),
            vec![
                "boolean-input",
                "conditional",
                "delay",
                "json-filter",
                "merge",
                "regex-match",
                "text-input",
                "text-output",
            ]
        );

        let grouped = registry.metadata_by_category();
        assert_eq!(grouped[&NodeCategory::Input].len(), 2);
        assert_eq!(grouped[&NodeCategory::Output].len(), 1);
        assert_eq!(grouped[&NodeCategory::Processing].len(), 3);
        assert_eq!(grouped[&NodeCategory::Control].len(), 2);
    }

    #[test]
    fn test_init_is_idempotent() {
        let first = init();
        let second = init();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.has_node_type("regex-match"));
        assert!(registry::global().is_some());
    }

    async fn regex_graph(pattern: &str, word: Option<&str>) -> (EvaluationResult, Vec<dataflow_engine::NodeId>) {
        let registry = init();
        let mut builder = GraphBuilder::new(&registry)
            .node("pattern", "text-input")
            .with_setting("text", DataBox::string(pattern))
            .node("match", "regex-match")
            .node("flag", "boolean-input")
            .connect("pattern", "text", "match", "regex")
            .connect("match", "output", "flag", "value");
        if let Some(word) = word {
            builder = builder
                .node("word", "text-input")
                .with_setting("text", DataBox::string(word))
                .connect("word", "text", "match", "word");
        }
        let built = builder.build().unwrap();
        let ids = vec![built.id("match").unwrap(), built.id("flag").unwrap()];
        (evaluate(built.graph()).await, ids)
    }

    #[tokio::test]
    async fn test_regex_full_match_end_to_end() {
        init_logging();
        let (result, ids) = regex_graph("a.c", Some("abc")).await;
        let outputs = result.into_result().unwrap();
        assert_eq!(outputs.output(ids[0], "output"), Some(&DataBox::boolean(true)));
        assert_eq!(outputs.output(ids[1], "value"), Some(&DataBox::boolean(true)));
    }

    #[tokio::test]
    async fn test_regex_partial_match_is_false() {
        let (result, ids) = regex_graph("a.c", Some("abcd")).await;
        let outputs = result.into_result().unwrap();
        assert_eq!(outputs.output(ids[0], "output"), Some(&DataBox::boolean(false)));
    }

    #[tokio::test]
    async fn test_regex_missing_word_fails_downstream() {
        let (result, ids) = regex_graph("a.c", None).await;
        let report = match result {
            EvaluationResult::Failed(report) => report,
            EvaluationResult::Resolved(_) => panic!("expected failure"),
        };

        assert_eq!(report.node_id, ids[0]);
        assert!(matches!(
            report.error,
            EngineError::NodeComputeFailure { node_id, .. } if node_id == ids[0]
        ));
        assert!(matches!(
            report.error.root_cause(),
            EngineError::MissingRequiredInput(name) if name == "word"
        ));
        assert_eq!(report.state(ids[1]), Some(NodeState::Failed));
        assert_eq!(report.failure(ids[1]).unwrap().origin, ids[0]);
    }

    #[tokio::test]
    async fn test_record_round_trip_evaluates() {
        let registry = init();
        let built = GraphBuilder::new(&registry)
            .node("a", "text-input")
            .with_setting("text", DataBox::string("one"))
            .node("b", "text-input")
            .with_setting("text", DataBox::string("two"))
            .node("merge", "merge")
            .with_setting("separator", DataBox::string(", "))
            .node("out", "text-output")
            .connect("a", "text", "merge", "input_0")
            .connect("b", "text", "merge", "input_1")
            .connect("merge", "merged", "out", "text")
            .build()
            .unwrap();

        let json = built.graph().to_record().to_json().unwrap();
        let record = dataflow_engine::GraphRecord::from_json(&json).unwrap();
        let graph = dataflow_engine::Graph::from_record(&record, &registry).unwrap();

        let outputs = evaluate(&graph).await.into_result().unwrap();
        let out = built.id("out").unwrap();
        assert_eq!(outputs.output(out, "text"), Some(&DataBox::string("one, two")));
    }
}
