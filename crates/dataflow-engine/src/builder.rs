//! Fluent builder for graphs
//!
//! Refers to nodes by caller-chosen aliases instead of generated ids, which
//! keeps programmatic graph construction and tests readable.
//!
//! ```ignore
//! let built = GraphBuilder::new(&registry)
//!     .node("pattern", "text-input")
//!     .with_setting("text", DataBox::string("a.c"))
//!     .node("word", "text-input")
//!     .with_setting("text", DataBox::string("abc"))
//!     .node("match", "regex-match")
//!     .connect("pattern", "text", "match", "regex")
//!     .connect("word", "text", "match", "word")
//!     .build()?;
//! let match_id = built.id("match").unwrap();
//! ```

use std::collections::HashMap;

use crate::error::{EngineError, Result};
use crate::graph::Graph;
use crate::node::NodeId;
use crate::registry::NodeTypeRegistry;
use crate::types::{DataBox, Settings};

struct PendingNode {
    alias: String,
    identifier: String,
    settings: Settings,
}

struct PendingConnection {
    from: String,
    from_name: String,
    to: String,
    to_name: String,
}

/// Fluent builder that resolves node types through a registry
///
/// Steps are recorded as given; all problems surface from [`GraphBuilder::build`].
pub struct GraphBuilder<'a> {
    registry: &'a NodeTypeRegistry,
    nodes: Vec<PendingNode>,
    connections: Vec<PendingConnection>,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(registry: &'a NodeTypeRegistry) -> Self {
        Self {
            registry,
            nodes: Vec::new(),
            connections: Vec::new(),
        }
    }

    /// Add a node of the given registered type under an alias
    pub fn node(mut self, alias: impl Into<String>, identifier: impl Into<String>) -> Self {
        self.nodes.push(PendingNode {
            alias: alias.into(),
            identifier: identifier.into(),
            settings: Settings::new(),
        });
        self
    }

    /// Override a setting on the most recently added node
    ///
    /// Must be called after `node`; ignored otherwise.
    pub fn with_setting(mut self, name: impl Into<String>, value: DataBox) -> Self {
        if let Some(node) = self.nodes.last_mut() {
            node.settings.insert(name.into(), value);
        }
        self
    }

    /// Connect two aliased nodes
    ///
    /// The expected kind is taken from the source connector.
    pub fn connect(
        mut self,
        from: impl Into<String>,
        from_name: impl Into<String>,
        to: impl Into<String>,
        to_name: impl Into<String>,
    ) -> Self {
        self.connections.push(PendingConnection {
            from: from.into(),
            from_name: from_name.into(),
            to: to.into(),
            to_name: to_name.into(),
        });
        self
    }

    /// Create every node and connection, stopping at the first error
    pub fn build(self) -> Result<BuiltGraph> {
        let mut graph = Graph::new();
        let mut aliases = HashMap::new();

        for pending in self.nodes {
            if aliases.contains_key(&pending.alias) {
                return Err(EngineError::DuplicateAlias(pending.alias));
            }
            let id = graph.create_node(self.registry, &pending.identifier, pending.settings)?;
            aliases.insert(pending.alias, id);
        }

        let lookup = |alias: &str| {
            aliases
                .get(alias)
                .copied()
                .ok_or_else(|| EngineError::UnknownAlias(alias.to_string()))
        };

        for pending in &self.connections {
            let from = lookup(&pending.from)?;
            let to = lookup(&pending.to)?;
            let expected = graph
                .node(from)
                .and_then(|node| node.output(&pending.from_name))
                .map(|output| output.data_type())
                .ok_or_else(|| EngineError::ConnectorNotFound {
                    node_id: from,
                    name: pending.from_name.clone(),
                })?;
            graph.connect(from, &pending.from_name, to, &pending.to_name, expected)?;
        }

        Ok(BuiltGraph { graph, aliases })
    }
}

/// A graph produced by [`GraphBuilder`], with its alias table
#[derive(Debug)]
pub struct BuiltGraph {
    graph: Graph,
    aliases: HashMap<String, NodeId>,
}

impl BuiltGraph {
    /// Node id assigned to an alias
    pub fn id(&self, alias: &str) -> Option<NodeId> {
        self.aliases.get(alias).copied()
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    pub fn into_graph(self) -> Graph {
        self.graph
    }
}
