//! Graph evaluation
//!
//! Evaluation takes a snapshot of a [`Graph`] and resolves every node's
//! outputs:
//!
//! 1. Dependencies are derived from the connections and the graph is
//!    ordered topologically (ties broken by node id). A cycle fails the whole
//!    run before any node computes.
//! 2. Each node's inputs are assembled from its upstream outputs, falling
//!    back to the node's setting for unconnected settable inputs.
//! 3. Nodes whose dependencies are resolved run concurrently inside one task
//!    group per run, optionally bounded by `max_concurrency`.
//! 4. A node fails if its compute fails, any output future fails, or a
//!    declared output is missing or of the wrong kind. Dependents of a
//!    failed node are never started; independent siblings keep running.
//!
//! ```ignore
//! let result = Evaluator::default()
//!     .with_max_concurrency(4)
//!     .evaluate(&graph)
//!     .await;
//! let outputs = result.into_result()?;
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use futures_util::future::try_join_all;
use futures_util::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::events::{EvaluationEvent, EventSink, NullEventSink};
use crate::graph::Graph;
use crate::node::{Node, NodeId};
use crate::types::{DataBox, DataMap};

/// Evaluation settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluatorConfig {
    /// Maximum number of nodes resolving at once (`None` = unbounded)
    #[serde(default)]
    pub max_concurrency: Option<usize>,
    /// Identifier attached to emitted events (`None` = fresh per run)
    #[serde(default)]
    pub execution_id: Option<String>,
}

/// Lifecycle of a node within one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeState {
    Pending,
    Resolving,
    Resolved,
    Failed,
}

/// Why a node ended up failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeFailure {
    /// The node whose own compute failed; equals the node itself unless the
    /// failure was inherited from upstream
    pub origin: NodeId,
    pub cause: String,
}

/// Outputs of every node after a successful run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResolvedOutputs {
    outputs: BTreeMap<NodeId, DataMap>,
}

impl ResolvedOutputs {
    /// All outputs of one node
    pub fn get(&self, node_id: NodeId) -> Option<&DataMap> {
        self.outputs.get(&node_id)
    }

    /// One named output of one node
    pub fn output(&self, node_id: NodeId, name: &str) -> Option<&DataBox> {
        self.outputs.get(&node_id)?.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &DataMap)> {
        self.outputs.iter()
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    pub fn into_inner(self) -> BTreeMap<NodeId, DataMap> {
        self.outputs
    }
}

/// What went wrong in a failed run
#[derive(Debug)]
pub struct FailureReport {
    /// First failing node: for a cycle, a node on the cycle; otherwise the
    /// earliest node in topological order whose own compute failed
    pub node_id: NodeId,
    /// The failing node's error
    pub error: EngineError,
    /// Final state of every node (empty when the graph was rejected up front)
    pub states: BTreeMap<NodeId, NodeState>,
    /// Every failed node, including those failed because of upstream
    pub failures: BTreeMap<NodeId, NodeFailure>,
}

impl FailureReport {
    pub fn state(&self, node_id: NodeId) -> Option<NodeState> {
        self.states.get(&node_id).copied()
    }

    pub fn failure(&self, node_id: NodeId) -> Option<&NodeFailure> {
        self.failures.get(&node_id)
    }
}

/// Outcome of evaluating a graph
#[derive(Debug)]
pub enum EvaluationResult {
    Resolved(ResolvedOutputs),
    Failed(FailureReport),
}

impl EvaluationResult {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// Convert into a plain `Result`, keeping the first failing node's error
    pub fn into_result(self) -> Result<ResolvedOutputs> {
        match self {
            Self::Resolved(outputs) => Ok(outputs),
            Self::Failed(report) => Err(report.error),
        }
    }
}

/// Evaluate a graph with the default evaluator
pub async fn evaluate(graph: &Graph) -> EvaluationResult {
    Evaluator::default().evaluate(graph).await
}

/// Graph evaluator
///
/// Holds configuration only; every call to [`Evaluator::evaluate`] is an
/// independent run over a read-only graph.
#[derive(Clone)]
pub struct Evaluator {
    config: EvaluatorConfig,
    event_sink: Arc<dyn EventSink>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self {
            config: EvaluatorConfig::default(),
            event_sink: Arc::new(NullEventSink),
        }
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: EvaluatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Bound the number of nodes resolving at once (0 is treated as 1)
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.config.max_concurrency = Some(max);
        self
    }

    /// Use a fixed execution id for emitted events
    pub fn with_execution_id(mut self, execution_id: impl Into<String>) -> Self {
        self.config.execution_id = Some(execution_id.into());
        self
    }

    /// Send progress events to the given sink
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Evaluate every node of the graph
    pub async fn evaluate(&self, graph: &Graph) -> EvaluationResult {
        let execution_id = self
            .config
            .execution_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        log::info!(
            "Evaluating graph with {} nodes (execution {})",
            graph.len(),
            execution_id
        );
        self.emit(EvaluationEvent::EvaluationStarted {
            execution_id: execution_id.clone(),
            node_count: graph.len(),
        });

        let order = match graph.sort_or_cycle() {
            Ok(order) => order,
            Err(node_id) => {
                let error = EngineError::CyclicGraph { node_id };
                log::warn!("Rejecting graph: {}", error);
                self.emit(EvaluationEvent::EvaluationFailed {
                    execution_id,
                    error: error.to_string(),
                });
                return EvaluationResult::Failed(FailureReport {
                    node_id,
                    error,
                    states: BTreeMap::new(),
                    failures: BTreeMap::new(),
                });
            }
        };

        let mut run = Run::new(graph, &order);
        let limit = self
            .config
            .max_concurrency
            .map(|max| max.max(1))
            .unwrap_or(usize::MAX);
        let mut running = FuturesUnordered::new();

        loop {
            while running.len() < limit {
                let Some((_, node_id)) = run.ready.pop_first() else {
                    break;
                };
                let Some(node) = graph.node(node_id) else {
                    continue;
                };
                let inputs = run.assemble_inputs(graph, node);
                run.states.insert(node_id, NodeState::Resolving);
                log::debug!("Starting node {} ({})", node_id, node.type_identifier());
                self.emit(EvaluationEvent::NodeStarted {
                    execution_id: execution_id.clone(),
                    node_id: node_id.to_string(),
                });
                running.push(resolve_node(node, inputs));
            }

            let Some((node_id, result)) = running.next().await else {
                break;
            };

            match result {
                Ok(outputs) => {
                    log::debug!("Node {} resolved", node_id);
                    self.emit(EvaluationEvent::NodeResolved {
                        execution_id: execution_id.clone(),
                        node_id: node_id.to_string(),
                        outputs: serde_json::to_value(&outputs).unwrap_or_default(),
                    });
                    run.resolve(graph, node_id, outputs);
                }
                Err(error) => {
                    log::warn!("Node {} failed: {}", node_id, error);
                    self.emit(EvaluationEvent::NodeFailed {
                        execution_id: execution_id.clone(),
                        node_id: node_id.to_string(),
                        error: error.to_string(),
                    });
                    for (skipped, origin) in run.fail(graph, node_id, error) {
                        log::debug!("Skipping node {} (upstream {} failed)", skipped, origin);
                        self.emit(EvaluationEvent::NodeSkipped {
                            execution_id: execution_id.clone(),
                            node_id: skipped.to_string(),
                            origin: origin.to_string(),
                        });
                    }
                }
            }
        }

        match run.own_failures.pop_first() {
            None => {
                log::info!("Evaluation {} completed", execution_id);
                self.emit(EvaluationEvent::EvaluationCompleted { execution_id });
                EvaluationResult::Resolved(ResolvedOutputs {
                    outputs: run.outputs,
                })
            }
            Some((_, (node_id, error))) => {
                log::warn!("Evaluation {} failed at node {}", execution_id, node_id);
                self.emit(EvaluationEvent::EvaluationFailed {
                    execution_id,
                    error: error.to_string(),
                });
                EvaluationResult::Failed(FailureReport {
                    node_id,
                    error,
                    states: run.states,
                    failures: run.failures,
                })
            }
        }
    }

    fn emit(&self, event: EvaluationEvent) {
        if let Err(e) = self.event_sink.send(event) {
            log::warn!("Failed to send evaluation event: {}", e);
        }
    }
}

/// Bookkeeping for one evaluation
struct Run {
    /// Position of each node in the topological order
    position: HashMap<NodeId, usize>,
    /// Unresolved upstream nodes per node
    waiting_on: HashMap<NodeId, usize>,
    /// Nodes ready to start, keyed by topological position
    ready: BTreeSet<(usize, NodeId)>,
    states: BTreeMap<NodeId, NodeState>,
    outputs: BTreeMap<NodeId, DataMap>,
    failures: BTreeMap<NodeId, NodeFailure>,
    /// Nodes whose own compute failed, keyed by topological position
    own_failures: BTreeMap<usize, (NodeId, EngineError)>,
}

impl Run {
    fn new(graph: &Graph, order: &[NodeId]) -> Self {
        let position: HashMap<NodeId, usize> =
            order.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        let waiting_on: HashMap<NodeId, usize> = order
            .iter()
            .map(|id| (*id, graph.dependencies(*id).len()))
            .collect();
        let ready = order
            .iter()
            .enumerate()
            .filter(|(_, id)| waiting_on.get(*id) == Some(&0))
            .map(|(i, id)| (i, *id))
            .collect();

        Self {
            position,
            waiting_on,
            ready,
            states: order.iter().map(|id| (*id, NodeState::Pending)).collect(),
            outputs: BTreeMap::new(),
            failures: BTreeMap::new(),
            own_failures: BTreeMap::new(),
        }
    }

    /// Connected upstream output, else the setting for a settable input, else absent
    fn assemble_inputs(&self, graph: &Graph, node: &Node) -> DataMap {
        let mut inputs = DataMap::new();
        for input in node.inputs() {
            let value = match graph.connection_into(node.id(), input.name()) {
                Some(connection) => self
                    .outputs
                    .get(&connection.from().node_id())
                    .and_then(|outputs| outputs.get(connection.from().name())),
                None if input.is_settable() => node
                    .setting(input.name())
                    .filter(|value| value.data_type() == input.data_type()),
                None => None,
            };
            if let Some(value) = value {
                inputs.insert(input.name().to_string(), value.clone());
            }
        }
        inputs
    }

    fn resolve(&mut self, graph: &Graph, node_id: NodeId, outputs: DataMap) {
        self.states.insert(node_id, NodeState::Resolved);
        self.outputs.insert(node_id, outputs);

        for dependent in graph.dependents(node_id) {
            let Some(waiting) = self.waiting_on.get_mut(&dependent) else {
                continue;
            };
            *waiting = waiting.saturating_sub(1);
            if *waiting == 0 && self.states.get(&dependent) == Some(&NodeState::Pending) {
                if let Some(&position) = self.position.get(&dependent) {
                    self.ready.insert((position, dependent));
                }
            }
        }
    }

    /// Record a failure and fail every transitive dependent that has not started
    ///
    /// Returns the newly skipped nodes with the failure they inherited.
    fn fail(&mut self, graph: &Graph, node_id: NodeId, error: EngineError) -> Vec<(NodeId, NodeId)> {
        self.states.insert(node_id, NodeState::Failed);
        self.failures.insert(
            node_id,
            NodeFailure {
                origin: node_id,
                cause: error.root_cause().to_string(),
            },
        );
        let position = self.position.get(&node_id).copied().unwrap_or(usize::MAX);
        self.own_failures.insert(position, (node_id, error));

        let mut skipped = Vec::new();
        let mut frontier: Vec<NodeId> = graph.dependents(node_id).into_iter().collect();
        while let Some(dependent) = frontier.pop() {
            if self.states.get(&dependent) != Some(&NodeState::Pending) {
                continue;
            }
            self.states.insert(dependent, NodeState::Failed);
            self.failures.insert(
                dependent,
                NodeFailure {
                    origin: node_id,
                    cause: format!("upstream node {} failed", node_id),
                },
            );
            skipped.push((dependent, node_id));
            frontier.extend(graph.dependents(dependent));
        }
        skipped.sort();
        skipped
    }
}

/// Compute one node, attributing any failure to it
async fn resolve_node(node: &Node, inputs: DataMap) -> (NodeId, Result<DataMap>) {
    let node_id = node.id();
    let result = compute_outputs(node, inputs)
        .await
        .map_err(|cause| EngineError::compute_failure(node_id, cause));
    (node_id, result)
}

/// Run a node's compute and check its outputs against its declared connectors
async fn compute_outputs(node: &Node, inputs: DataMap) -> Result<DataMap> {
    let node_id = node.id();
    let pending = node.node_type().compute(inputs, node.settings())?;
    let (names, futures): (Vec<String>, Vec<_>) = pending.into_iter().unzip();
    let values = try_join_all(futures).await?;
    let mut produced: DataMap = names.into_iter().zip(values).collect();

    let mut outputs = DataMap::new();
    for output in node.outputs() {
        let value = produced
            .remove(output.name())
            .ok_or_else(|| EngineError::MissingOutput {
                node_id,
                name: output.name().to_string(),
            })?;
        if value.data_type() != output.data_type() {
            return Err(EngineError::TypeMismatch {
                expected: output.data_type(),
                found: value.data_type().to_string(),
            });
        }
        outputs.insert(output.name().to_string(), value);
    }
    if !produced.is_empty() {
        log::debug!(
            "Node {} produced undeclared outputs: {:?}",
            node_id,
            produced.keys().collect::<Vec<_>>()
        );
    }
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::time::{Duration, Instant};

    use super::*;
    use crate::events::VecEventSink;
    use crate::testing::{
        flag, init_logging, relay, settings, source, Breakage, Broken, Fallback, Join, Slow,
    };
    use crate::types::{DataKind, Settings};

    fn broken(breakage: Breakage) -> Node {
        Node::new("broken", Arc::new(Broken(breakage)), Settings::new()).unwrap()
    }

    fn slow(millis: f64, value: &str) -> (Node, Arc<std::sync::atomic::AtomicUsize>) {
        let (node_type, computes) = Slow::new();
        let node = Node::new(
            "slow",
            Arc::new(node_type),
            settings(&[
                ("millis", DataBox::number(millis).unwrap()),
                ("value", DataBox::string(value)),
            ]),
        )
        .unwrap();
        (node, computes)
    }

    fn failed(result: EvaluationResult) -> FailureReport {
        match result {
            EvaluationResult::Failed(report) => report,
            EvaluationResult::Resolved(_) => panic!("expected evaluation to fail"),
        }
    }

    #[tokio::test]
    async fn test_empty_graph_resolves() {
        let outputs = evaluate(&Graph::new()).await.into_result().unwrap();
        assert!(outputs.is_empty());
    }

    #[tokio::test]
    async fn test_graph_without_connections() {
        init_logging();
        let mut graph = Graph::new();
        let a = graph.add_node(source("a")).unwrap();
        let b = graph.add_node(flag(true)).unwrap();

        let outputs = evaluate(&graph).await.into_result().unwrap();
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs.output(a, "value"), Some(&DataBox::string("a")));
        assert_eq!(outputs.output(b, "value"), Some(&DataBox::boolean(true)));
    }

    #[tokio::test]
    async fn test_chain_resolves() {
        let mut graph = Graph::new();
        let a = graph.add_node(source("hello")).unwrap();
        let b = graph.add_node(relay()).unwrap();
        let c = graph.add_node(relay()).unwrap();
        graph.connect(a, "value", b, "value", DataKind::String).unwrap();
        graph.connect(b, "value", c, "value", DataKind::String).unwrap();

        let outputs = evaluate(&graph).await.into_result().unwrap();
        assert_eq!(outputs.output(c, "value"), Some(&DataBox::string("hello")));
    }

    #[tokio::test]
    async fn test_fan_out_and_join() {
        let mut graph = Graph::new();
        let a = graph.add_node(source("ab")).unwrap();
        let join = graph
            .add_node(Node::new("join", Arc::new(Join), Settings::new()).unwrap())
            .unwrap();
        graph.connect(a, "value", join, "left", DataKind::String).unwrap();
        graph.connect(a, "value", join, "right", DataKind::String).unwrap();

        let outputs = evaluate(&graph).await.into_result().unwrap();
        assert_eq!(outputs.output(join, "joined"), Some(&DataBox::string("abab")));
    }

    #[tokio::test]
    async fn test_cycle_fails_even_with_acyclic_nodes() {
        let mut graph = Graph::new();
        let (lonely, computes) = slow(0.0, "x");
        let lonely = graph.add_node(lonely).unwrap();
        let a = graph.add_node(relay()).unwrap();
        let b = graph.add_node(relay()).unwrap();
        graph.connect(a, "value", b, "value", DataKind::String).unwrap();
        graph.connect(b, "value", a, "value", DataKind::String).unwrap();

        let report = failed(evaluate(&graph).await);
        assert!(matches!(report.error, EngineError::CyclicGraph { node_id } if node_id == a || node_id == b));
        assert!(report.node_id == a || report.node_id == b);
        assert!(graph.contains_node(report.node_id));
        assert!(report.states.is_empty());
        assert!(report.state(lonely).is_none());
        assert_eq!(computes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_independent_nodes_compute_once() {
        let mut graph = Graph::new();
        let (fast, fast_computes) = slow(0.0, "fast");
        let (slower, slow_computes) = slow(50.0, "slow");
        let fast = graph.add_node(fast).unwrap();
        let slower = graph.add_node(slower).unwrap();

        let outputs = evaluate(&graph).await.into_result().unwrap();
        assert_eq!(outputs.output(fast, "value"), Some(&DataBox::string("fast")));
        assert_eq!(outputs.output(slower, "value"), Some(&DataBox::string("slow")));
        assert_eq!(fast_computes.load(Ordering::SeqCst), 1);
        assert_eq!(slow_computes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_independent_nodes_run_concurrently() {
        let mut graph = Graph::new();
        for _ in 0..3 {
            graph.add_node(slow(200.0, "x").0).unwrap();
        }

        let start = Instant::now();
        evaluate(&graph).await.into_result().unwrap();
        assert!(start.elapsed() < Duration::from_millis(550));
    }

    #[tokio::test]
    async fn test_max_concurrency_serializes() {
        let mut graph = Graph::new();
        for _ in 0..3 {
            graph.add_node(slow(50.0, "x").0).unwrap();
        }

        let start = Instant::now();
        let outputs = Evaluator::new()
            .with_max_concurrency(0)
            .evaluate(&graph)
            .await
            .into_result()
            .unwrap();
        assert_eq!(outputs.len(), 3);
        assert!(start.elapsed() >= Duration::from_millis(150));
    }

    #[tokio::test]
    async fn test_dependents_of_failed_node_never_start() {
        let sink = Arc::new(VecEventSink::new());
        let mut graph = Graph::new();
        let bad = graph.add_node(broken(Breakage::Compute)).unwrap();
        let mid = graph.add_node(relay()).unwrap();
        let end = graph.add_node(relay()).unwrap();
        graph.connect(bad, "value", mid, "value", DataKind::String).unwrap();
        graph.connect(mid, "value", end, "value", DataKind::String).unwrap();

        let report = failed(
            Evaluator::new()
                .with_execution_id("run-1")
                .with_event_sink(sink.clone())
                .evaluate(&graph)
                .await,
        );

        assert_eq!(report.node_id, bad);
        assert!(matches!(
            report.error,
            EngineError::NodeComputeFailure { node_id, .. } if node_id == bad
        ));
        assert!(matches!(report.error.root_cause(), EngineError::ExecutionFailed(_)));
        for id in [bad, mid, end] {
            assert_eq!(report.state(id), Some(NodeState::Failed));
        }
        assert_eq!(report.failure(end).unwrap().origin, bad);
        assert_eq!(report.failure(bad).unwrap().origin, bad);

        let started: Vec<String> = sink
            .events()
            .into_iter()
            .filter_map(|e| match e {
                EvaluationEvent::NodeStarted { node_id, .. } => Some(node_id),
                _ => None,
            })
            .collect();
        assert_eq!(started, vec![bad.to_string()]);
        assert!(sink.events().iter().all(|e| e.execution_id() == "run-1"));
    }

    #[tokio::test]
    async fn test_siblings_continue_after_failure() {
        let mut graph = Graph::new();
        let bad = graph.add_node(broken(Breakage::Future)).unwrap();
        let (sibling, computes) = slow(20.0, "ok");
        let sibling = graph.add_node(sibling).unwrap();
        let downstream = graph.add_node(relay()).unwrap();
        graph
            .connect(sibling, "value", downstream, "value", DataKind::String)
            .unwrap();

        let report = failed(evaluate(&graph).await);
        assert_eq!(report.node_id, bad);
        assert_eq!(report.state(sibling), Some(NodeState::Resolved));
        assert_eq!(report.state(downstream), Some(NodeState::Resolved));
        assert_eq!(computes.load(Ordering::SeqCst), 1);
        assert!(report.failure(sibling).is_none());
    }

    #[tokio::test]
    async fn test_first_failure_is_earliest_in_order() {
        let mut graph = Graph::new();
        let first = graph.add_node(broken(Breakage::Compute)).unwrap();
        let second = graph.add_node(broken(Breakage::Compute)).unwrap();
        let expected = first.min(second);

        let report = failed(evaluate(&graph).await);
        assert_eq!(report.node_id, expected);
        assert_eq!(report.failures.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_output_fails_node() {
        let mut graph = Graph::new();
        let bad = graph.add_node(broken(Breakage::MissingOutput)).unwrap();

        let report = failed(evaluate(&graph).await);
        assert!(matches!(
            report.error.root_cause(),
            EngineError::MissingOutput { node_id, name } if *node_id == bad && name == "value"
        ));
    }

    #[tokio::test]
    async fn test_wrong_output_kind_fails_node() {
        let mut graph = Graph::new();
        graph.add_node(broken(Breakage::WrongKind)).unwrap();

        let report = failed(evaluate(&graph).await);
        assert!(matches!(
            report.error.root_cause(),
            EngineError::TypeMismatch { expected: DataKind::String, .. }
        ));
    }

    #[tokio::test]
    async fn test_missing_required_input_fails_node() {
        let mut graph = Graph::new();
        let r = graph.add_node(relay()).unwrap();

        let report = failed(evaluate(&graph).await);
        assert_eq!(report.node_id, r);
        assert!(matches!(
            report.error,
            EngineError::NodeComputeFailure { node_id, .. } if node_id == r
        ));
        assert!(matches!(
            report.error.root_cause(),
            EngineError::MissingRequiredInput(name) if name == "value"
        ));
        assert_eq!(report.failure(r).unwrap().cause, "Missing required input: value");

        // The attributed error is what callers of into_result see
        let err = evaluate(&graph).await.into_result().unwrap_err();
        assert!(err.to_string().starts_with(&format!("Node {} failed", r)));
    }

    #[tokio::test]
    async fn test_settable_input_falls_back_to_setting() {
        let mut graph = Graph::new();
        let unconnected = graph
            .add_node(Node::new("fallback", Arc::new(Fallback), Settings::new()).unwrap())
            .unwrap();
        let connected = graph
            .add_node(Node::new("fallback", Arc::new(Fallback), Settings::new()).unwrap())
            .unwrap();
        let a = graph.add_node(source("wired")).unwrap();
        graph.connect(a, "value", connected, "value", DataKind::String).unwrap();

        let outputs = evaluate(&graph).await.into_result().unwrap();
        assert_eq!(outputs.output(unconnected, "value"), Some(&DataBox::string("default")));
        assert_eq!(outputs.output(connected, "value"), Some(&DataBox::string("wired")));
    }

    #[tokio::test]
    async fn test_outputs_without_consumers_are_computed() {
        let mut graph = Graph::new();
        let (node, computes) = slow(0.0, "unused");
        let id = graph.add_node(node).unwrap();

        let outputs = evaluate(&graph).await.into_result().unwrap();
        assert_eq!(computes.load(Ordering::SeqCst), 1);
        assert_eq!(outputs.output(id, "value"), Some(&DataBox::string("unused")));
    }

    #[tokio::test]
    async fn test_start_order_is_deterministic() {
        let sink = Arc::new(VecEventSink::new());
        let mut graph = Graph::new();
        let mut ids: Vec<NodeId> = (0..4)
            .map(|i| graph.add_node(source(&i.to_string())).unwrap())
            .collect();
        ids.sort();

        Evaluator::new()
            .with_max_concurrency(1)
            .with_event_sink(sink.clone())
            .evaluate(&graph)
            .await
            .into_result()
            .unwrap();

        let started: Vec<String> = sink
            .events()
            .into_iter()
            .filter_map(|e| match e {
                EvaluationEvent::NodeStarted { node_id, .. } => Some(node_id),
                _ => None,
            })
            .collect();
        let expected: Vec<String> = ids.iter().map(NodeId::to_string).collect();
        assert_eq!(started, expected);
    }

    #[tokio::test]
    async fn test_events_bracket_the_run() {
        let sink = Arc::new(VecEventSink::new());
        let mut graph = Graph::new();
        graph.add_node(source("x")).unwrap();

        Evaluator::new()
            .with_event_sink(sink.clone())
            .evaluate(&graph)
            .await;

        let events = sink.events();
        assert!(matches!(
            events.first(),
            Some(EvaluationEvent::EvaluationStarted { node_count: 1, .. })
        ));
        assert!(matches!(
            events.last(),
            Some(EvaluationEvent::EvaluationCompleted { .. })
        ));
        assert_eq!(events.len(), 4);
    }

    struct RejectingSink;

    impl EventSink for RejectingSink {
        fn send(&self, _event: EvaluationEvent) -> std::result::Result<(), crate::events::EventError> {
            Err(crate::events::EventError {
                message: "listener gone".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_undeliverable_events_do_not_fail_run() {
        init_logging();
        let mut graph = Graph::new();
        let s = graph.add_node(source("x")).unwrap();

        let outputs = Evaluator::new()
            .with_event_sink(Arc::new(RejectingSink))
            .evaluate(&graph)
            .await
            .into_result()
            .unwrap();
        assert_eq!(outputs.output(s, "value"), Some(&DataBox::string("x")));
    }

    #[test]
    fn test_config_deserializes_camel_case() {
        let config: EvaluatorConfig =
            serde_json::from_str(r#"{"maxConcurrency": 2, "executionId": "abc"}"#).unwrap();
        assert_eq!(config.max_concurrency, Some(2));
        assert_eq!(config.execution_id.as_deref(), Some("abc"));

        let config: EvaluatorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EvaluatorConfig::default());
    }
}
