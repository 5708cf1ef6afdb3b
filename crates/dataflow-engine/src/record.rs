//! Plain serializable graph form
//!
//! Storage layers persist a [`GraphRecord`] instead of a live [`Graph`].
//! Records carry only identifiers, names and setting values; loading one
//! resolves node types through a [`NodeTypeRegistry`] and re-validates every
//! connection.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::graph::Graph;
use crate::node::{Node, NodeId};
use crate::registry::NodeTypeRegistry;
use crate::types::Settings;

/// A stored node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub node_id: NodeId,
    pub type_identifier: String,
    /// Effective settings (stored in full, not just overrides)
    #[serde(default)]
    pub settings: Settings,
}

/// A stored connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRecord {
    pub from_node_id: NodeId,
    pub from_connector_name: String,
    pub to_node_id: NodeId,
    pub to_connector_name: String,
}

/// A stored graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphRecord {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub connections: Vec<ConnectionRecord>,
}

impl GraphRecord {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Graph {
    /// Flatten into the storable form
    ///
    /// Nodes come out in id order, connections in insertion order.
    pub fn to_record(&self) -> GraphRecord {
        let nodes = self
            .nodes()
            .map(|node| NodeRecord {
                node_id: node.id(),
                type_identifier: node.type_identifier().to_string(),
                settings: node.settings().clone(),
            })
            .collect();

        let connections = self
            .connections()
            .iter()
            .map(|c| ConnectionRecord {
                from_node_id: c.from().node_id(),
                from_connector_name: c.from().name().to_string(),
                to_node_id: c.to().node_id(),
                to_connector_name: c.to().name().to_string(),
            })
            .collect();

        GraphRecord { nodes, connections }
    }

    /// Rebuild a graph from its stored form
    ///
    /// Each connection is validated against the kind of its source connector.
    /// The first invalid node or connection aborts the load.
    pub fn from_record(record: &GraphRecord, registry: &NodeTypeRegistry) -> Result<Self> {
        let mut graph = Graph::new();

        for node_record in &record.nodes {
            let node_type = registry.require(&node_record.type_identifier)?;
            let node = Node::with_id(
                node_record.node_id,
                node_record.type_identifier.as_str(),
                node_type,
                node_record.settings.clone(),
            )?;
            graph.add_node(node)?;
        }

        for c in &record.connections {
            let from_node = graph
                .node(c.from_node_id)
                .ok_or(EngineError::UnknownNode(c.from_node_id))?;
            let expected = from_node
                .output(&c.from_connector_name)
                .ok_or_else(|| EngineError::ConnectorNotFound {
                    node_id: c.from_node_id,
                    name: c.from_connector_name.clone(),
                })?
                .data_type();
            graph.connect(
                c.from_node_id,
                &c.from_connector_name,
                c.to_node_id,
                &c.to_connector_name,
                expected,
            )?;
        }

        log::debug!(
            "Loaded graph with {} nodes and {} connections",
            graph.len(),
            graph.connections().len()
        );
        Ok(graph)
    }
}
