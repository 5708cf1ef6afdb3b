//! The graph aggregate: nodes plus validated connections
//!
//! A [`Graph`] owns its nodes and the connections between them. Every
//! connection it holds joins two nodes it currently owns; removing a node
//! removes every connection touching it. Cycles may be stored (editors build
//! graphs incrementally) but are rejected when the graph is evaluated.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::connection::NodeConnection;
use crate::error::{EngineError, Result};
use crate::node::{Node, NodeId};
use crate::registry::NodeTypeRegistry;
use crate::types::{DataBox, DataKind, Settings};

/// A set of nodes and the connections between them
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: BTreeMap<NodeId, Node>,
    connections: Vec<NodeConnection>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, failing if its id is already taken
    pub fn add_node(&mut self, node: Node) -> Result<NodeId> {
        let id = node.id();
        if self.nodes.contains_key(&id) {
            return Err(EngineError::DuplicateNode(id));
        }
        log::debug!("Adding node {} ({})", id, node.type_identifier());
        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Instantiate a registered node type and add it
    pub fn create_node(
        &mut self,
        registry: &NodeTypeRegistry,
        identifier: &str,
        overrides: Settings,
    ) -> Result<NodeId> {
        let node_type = registry.require(identifier)?;
        let node = Node::new(identifier, node_type, overrides)?;
        self.add_node(node)
    }

    /// Remove a node together with every connection touching it
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        let node = self.nodes.remove(&id)?;
        let before = self.connections.len();
        self.connections.retain(|c| !c.touches(id));
        log::debug!(
            "Removed node {} and {} connection(s)",
            id,
            before - self.connections.len()
        );
        Some(node)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Nodes in id order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Connections in insertion order
    pub fn connections(&self) -> &[NodeConnection] {
        &self.connections
    }

    /// Validate a prospective connection between two nodes of this graph
    ///
    /// Probing never changes the graph; `None` means the connection would be invalid.
    pub fn connection(
        &self,
        from: NodeId,
        from_name: &str,
        to: NodeId,
        to_name: &str,
        expected: DataKind,
    ) -> Option<NodeConnection> {
        let from_node = self.nodes.get(&from)?;
        let to_node = self.nodes.get(&to)?;
        NodeConnection::create(from_node, from_name, to_node, to_name, expected)
    }

    /// Insert a connection built by [`NodeConnection::create`]
    ///
    /// Fails if either endpoint is not in this graph, if the connection no
    /// longer matches the nodes' current connectors, or if the input already
    /// has a different incoming connection. Re-adding an identical connection
    /// is a no-op.
    pub fn add_connection(&mut self, connection: NodeConnection) -> Result<()> {
        for id in [connection.from().node_id(), connection.to().node_id()] {
            if !self.nodes.contains_key(&id) {
                return Err(EngineError::UnknownNode(id));
            }
        }
        self.revalidate(&connection)?;

        let to = connection.to();
        if let Some(existing) = self.connection_into(to.node_id(), to.name()) {
            if *existing == connection {
                return Ok(());
            }
            return Err(EngineError::InputAlreadyConnected {
                node_id: to.node_id(),
                name: to.name().to_string(),
            });
        }

        log::debug!("Connecting {}", connection);
        self.connections.push(connection);
        Ok(())
    }

    /// Validate and insert a connection in one step
    pub fn connect(
        &mut self,
        from: NodeId,
        from_name: &str,
        to: NodeId,
        to_name: &str,
        expected: DataKind,
    ) -> Result<()> {
        let from_node = self.nodes.get(&from).ok_or(EngineError::UnknownNode(from))?;
        let to_node = self.nodes.get(&to).ok_or(EngineError::UnknownNode(to))?;
        let connection = NodeConnection::try_create(from_node, from_name, to_node, to_name, expected)?;
        self.add_connection(connection)
    }

    /// Remove the connection feeding an input, if any
    pub fn disconnect(&mut self, to: NodeId, to_name: &str) -> Option<NodeConnection> {
        let index = self
            .connections
            .iter()
            .position(|c| c.to().node_id() == to && c.to().name() == to_name)?;
        Some(self.connections.remove(index))
    }

    /// The connection feeding an input, if any
    pub fn connection_into(&self, to: NodeId, to_name: &str) -> Option<&NodeConnection> {
        self.connections
            .iter()
            .find(|c| c.to().node_id() == to && c.to().name() == to_name)
    }

    /// Connections leaving a node
    pub fn connections_from(&self, from: NodeId) -> impl Iterator<Item = &NodeConnection> + '_ {
        self.connections
            .iter()
            .filter(move |c| c.from().node_id() == from)
    }

    /// Connections entering a node
    pub fn connections_into(&self, to: NodeId) -> impl Iterator<Item = &NodeConnection> + '_ {
        self.connections
            .iter()
            .filter(move |c| c.to().node_id() == to)
    }

    /// Nodes this node reads from (upstream)
    pub fn dependencies(&self, id: NodeId) -> BTreeSet<NodeId> {
        self.connections_into(id).map(|c| c.from().node_id()).collect()
    }

    /// Nodes reading from this node (downstream)
    pub fn dependents(&self, id: NodeId) -> BTreeSet<NodeId> {
        self.connections_from(id).map(|c| c.to().node_id()).collect()
    }

    /// Change one setting of a node
    ///
    /// Connectors are re-derived from the new settings. Connections touching
    /// the node that no longer validate are removed and returned.
    pub fn update_setting(
        &mut self,
        id: NodeId,
        name: &str,
        value: DataBox,
    ) -> Result<Vec<NodeConnection>> {
        self.nodes
            .get_mut(&id)
            .ok_or(EngineError::UnknownNode(id))?
            .apply_setting(name, value)?;

        let mut dropped = Vec::new();
        for connection in std::mem::take(&mut self.connections) {
            if connection.touches(id) && self.revalidate(&connection).is_err() {
                log::debug!("Dropping stale connection {}", connection);
                dropped.push(connection);
            } else {
                self.connections.push(connection);
            }
        }
        Ok(dropped)
    }

    /// Order nodes so every node comes after the nodes it depends on
    ///
    /// Ties are broken by node id, so the order is reproducible. Fails with
    /// `CyclicGraph` naming a node that lies on a cycle.
    pub fn topological_order(&self) -> Result<Vec<NodeId>> {
        self.sort_or_cycle()
            .map_err(|node_id| EngineError::CyclicGraph { node_id })
    }

    /// A node lying on a cycle, if the graph has one
    pub fn find_cycle(&self) -> Option<NodeId> {
        self.sort_or_cycle().err()
    }

    /// Kahn sort; the error is a node on a cycle
    pub(crate) fn sort_or_cycle(&self) -> std::result::Result<Vec<NodeId>, NodeId> {
        let edges: BTreeSet<(NodeId, NodeId)> = self
            .connections
            .iter()
            .map(|c| (c.from().node_id(), c.to().node_id()))
            .collect();

        let mut in_degree: BTreeMap<NodeId, usize> =
            self.nodes.keys().map(|id| (*id, 0)).collect();
        let mut downstream: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
        for (from, to) in &edges {
            *in_degree.entry(*to).or_insert(0) += 1;
            downstream.entry(*from).or_default().push(*to);
        }

        let mut ready: BTreeSet<NodeId> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| *id)
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(id) = ready.pop_first() {
            order.push(id);
            for next in downstream.get(&id).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(next) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(*next);
                    }
                }
            }
        }

        let placed: HashSet<NodeId> = order.iter().copied().collect();
        let remaining: BTreeSet<NodeId> = self
            .nodes
            .keys()
            .filter(|id| !placed.contains(id))
            .copied()
            .collect();
        match remaining.first() {
            Some(&start) => Err(self.node_on_cycle(start, &remaining)),
            None => Ok(order),
        }
    }

    /// Walk upstream inside the unsorted remainder until a node repeats.
    ///
    /// Every node left over by the sort has an upstream node that is also
    /// left over, so the walk always closes a loop.
    fn node_on_cycle(&self, start: NodeId, remaining: &BTreeSet<NodeId>) -> NodeId {
        let mut seen = HashSet::new();
        let mut current = start;
        while seen.insert(current) {
            match self
                .dependencies(current)
                .into_iter()
                .find(|id| remaining.contains(id))
            {
                Some(next) => current = next,
                None => break,
            }
        }
        current
    }

    /// Check that a connection still matches the current connectors
    fn revalidate(&self, connection: &NodeConnection) -> Result<()> {
        let from = connection.from();
        let to = connection.to();
        let from_node = self
            .nodes
            .get(&from.node_id())
            .ok_or(EngineError::UnknownNode(from.node_id()))?;
        let to_node = self
            .nodes
            .get(&to.node_id())
            .ok_or(EngineError::UnknownNode(to.node_id()))?;

        let current = NodeConnection::try_create(
            from_node,
            from.name(),
            to_node,
            to.name(),
            connection.data_type(),
        )?;
        if current != *connection {
            return Err(EngineError::TypeMismatch {
                expected: connection.data_type(),
                found: current.data_type().to_string(),
            });
        }
        Ok(())
    }
}
