//! Graph-resident node instances

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::connector::{Input, Output};
use crate::error::{EngineError, Result};
use crate::node_type::NodeType;
use crate::types::{DataBox, Settings};

/// Unique identifier for a node
///
/// Ordered, so that evaluation can break scheduling ties deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Generate a fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for NodeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// An instance of a node type inside a graph
///
/// Connectors are derived from the node type and the current settings, and
/// are recomputed whenever a setting changes.
#[derive(Clone)]
pub struct Node {
    id: NodeId,
    type_identifier: String,
    node_type: Arc<dyn NodeType>,
    settings: Settings,
    inputs: BTreeMap<String, Input>,
    outputs: BTreeMap<String, Output>,
}

impl Node {
    /// Create a node with a fresh id
    ///
    /// `overrides` replace the node type's default settings key by key.
    pub fn new(
        type_identifier: impl Into<String>,
        node_type: Arc<dyn NodeType>,
        overrides: Settings,
    ) -> Result<Self> {
        Self::with_id(NodeId::new(), type_identifier, node_type, overrides)
    }

    /// Create a node with a known id (e.g. when loading a stored graph)
    pub fn with_id(
        id: NodeId,
        type_identifier: impl Into<String>,
        node_type: Arc<dyn NodeType>,
        overrides: Settings,
    ) -> Result<Self> {
        let mut settings = node_type.settings();
        for (name, value) in overrides {
            check_setting(&settings, &name, &value)?;
            settings.insert(name, value);
        }

        let (inputs, outputs) = derive_connectors(id, node_type.as_ref(), &settings)?;

        Ok(Self {
            id,
            type_identifier: type_identifier.into(),
            node_type,
            settings,
            inputs,
            outputs,
        })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Registry identifier of this node's type
    pub fn type_identifier(&self) -> &str {
        &self.type_identifier
    }

    pub fn node_type(&self) -> &Arc<dyn NodeType> {
        &self.node_type
    }

    /// Effective settings (defaults overlaid with overrides)
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn setting(&self, name: &str) -> Option<&DataBox> {
        self.settings.get(name)
    }

    pub fn input(&self, name: &str) -> Option<&Input> {
        self.inputs.get(name)
    }

    pub fn output(&self, name: &str) -> Option<&Output> {
        self.outputs.get(name)
    }

    pub fn inputs(&self) -> impl Iterator<Item = &Input> {
        self.inputs.values()
    }

    pub fn outputs(&self) -> impl Iterator<Item = &Output> {
        self.outputs.values()
    }

    /// Replace one setting and re-derive connectors
    ///
    /// Leaves the node untouched if the value is rejected.
    pub(crate) fn apply_setting(&mut self, name: &str, value: DataBox) -> Result<()> {
        check_setting(&self.settings, name, &value)?;

        let mut settings = self.settings.clone();
        settings.insert(name.to_string(), value);
        let (inputs, outputs) = derive_connectors(self.id, self.node_type.as_ref(), &settings)?;

        self.settings = settings;
        self.inputs = inputs;
        self.outputs = outputs;
        Ok(())
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("type_identifier", &self.type_identifier)
            .field("settings", &self.settings)
            .field("inputs", &self.inputs.keys().collect::<Vec<_>>())
            .field("outputs", &self.outputs.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn check_setting(defaults: &Settings, name: &str, value: &DataBox) -> Result<()> {
    let default = defaults.get(name).ok_or_else(|| EngineError::UnknownSetting {
        name: name.to_string(),
    })?;
    if default.data_type() != value.data_type() {
        return Err(EngineError::TypeMismatch {
            expected: default.data_type(),
            found: value.data_type().to_string(),
        });
    }
    Ok(())
}

type Connectors = (BTreeMap<String, Input>, BTreeMap<String, Output>);

fn derive_connectors(id: NodeId, node_type: &dyn NodeType, settings: &Settings) -> Result<Connectors> {
    let mut inputs = BTreeMap::new();
    for input in node_type.inputs(id, settings) {
        let name = input.name().to_string();
        if inputs.insert(name.clone(), input).is_some() {
            return Err(EngineError::DuplicateConnector { node_id: id, name });
        }
    }

    let mut outputs = BTreeMap::new();
    for output in node_type.outputs(id, settings) {
        let name = output.name().to_string();
        if outputs.insert(name.clone(), output).is_some() {
            return Err(EngineError::DuplicateConnector { node_id: id, name });
        }
    }

    Ok((inputs, outputs))
}
