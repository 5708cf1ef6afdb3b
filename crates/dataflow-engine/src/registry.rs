//! Node type registry
//!
//! Maps registry identifiers (e.g. `"regex-match"`) to [`NodeType`]
//! implementations. Graph construction and loading look node types up here
//! instead of dispatching on hardcoded names.
//!
//! # Usage
//!
//! ```ignore
//! use dataflow_engine::NodeTypeRegistry;
//!
//! let mut registry = NodeTypeRegistry::new();
//! registry.register_type(Arc::new(MyNode));
//!
//! // or collect every package linked into the binary
//! let registry = NodeTypeRegistry::with_builtins();
//! ```
//!
//! A process keeps one shared registry, installed explicitly with [`init`]
//! before any graph is built and read-only afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::{EngineError, Result};
use crate::node_type::{NodeCategory, NodeType, NodeTypeFn, NodeTypeMetadata};

/// Catalog of node types keyed by identifier
///
/// # Composability
///
/// Registries can be composed by merging:
/// ```ignore
/// let mut registry = NodeTypeRegistry::with_builtins();
/// registry.merge(plugin_registry); // plugin types override built-ins
/// ```
#[derive(Clone, Default)]
pub struct NodeTypeRegistry {
    entries: HashMap<String, Arc<dyn NodeType>>,
}

impl NodeTypeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Create a registry holding every node type submitted with `inventory`
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for NodeTypeFn(factory) in inventory::iter::<NodeTypeFn> {
            registry.register_type(factory());
        }
        registry
    }

    /// Register a node type under an explicit identifier
    ///
    /// Replaces any type previously registered under the same identifier.
    pub fn register(&mut self, identifier: impl Into<String>, node_type: Arc<dyn NodeType>) {
        let identifier = identifier.into();
        log::debug!("Registering node type '{}'", identifier);
        if self.entries.insert(identifier.clone(), node_type).is_some() {
            log::warn!("Node type '{}' was already registered; replaced", identifier);
        }
    }

    /// Register a node type under the identifier from its metadata
    pub fn register_type(&mut self, node_type: Arc<dyn NodeType>) {
        let identifier = node_type.metadata().identifier;
        self.register(identifier, node_type);
    }

    /// Look up a node type
    pub fn get(&self, identifier: &str) -> Option<Arc<dyn NodeType>> {
        self.entries.get(identifier).cloned()
    }

    /// Look up a node type, failing with `UnknownNodeType`
    pub fn require(&self, identifier: &str) -> Result<Arc<dyn NodeType>> {
        self.get(identifier)
            .ok_or_else(|| EngineError::UnknownNodeType(identifier.to_string()))
    }

    /// Check if a node type is registered
    pub fn has_node_type(&self, identifier: &str) -> bool {
        self.entries.contains_key(identifier)
    }

    /// All registered identifiers, sorted
    pub fn node_types(&self) -> Vec<&str> {
        let mut identifiers: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        identifiers.sort_unstable();
        identifiers
    }

    /// Metadata for every registered type, sorted by identifier
    ///
    /// Entries registered under an alias report the alias as identifier.
    pub fn all_metadata(&self) -> Vec<NodeTypeMetadata> {
        let mut all: Vec<NodeTypeMetadata> = self
            .entries
            .iter()
            .map(|(identifier, node_type)| NodeTypeMetadata {
                identifier: identifier.clone(),
                ..node_type.metadata()
            })
            .collect();
        all.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        all
    }

    /// Metadata grouped by category
    pub fn metadata_by_category(&self) -> HashMap<NodeCategory, Vec<NodeTypeMetadata>> {
        let mut grouped: HashMap<NodeCategory, Vec<NodeTypeMetadata>> = HashMap::new();
        for metadata in self.all_metadata() {
            grouped.entry(metadata.category).or_default().push(metadata);
        }
        grouped
    }

    /// Merge another registry into this one
    ///
    /// Entries from `other` override entries in `self` if they share an identifier.
    pub fn merge(&mut self, other: NodeTypeRegistry) {
        self.entries.extend(other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

static GLOBAL: OnceCell<Arc<NodeTypeRegistry>> = OnceCell::new();

/// Install the process-wide registry
///
/// Must happen once, before graphs are built from the global registry.
pub fn init(registry: NodeTypeRegistry) -> Result<Arc<NodeTypeRegistry>> {
    let registry = Arc::new(registry);
    GLOBAL
        .set(registry.clone())
        .map_err(|_| EngineError::RegistryAlreadyInitialized)?;
    log::info!("Node type registry initialized with {} types", registry.len());
    Ok(registry)
}

/// Install the process-wide registry unless one is already installed
pub fn get_or_init(f: impl FnOnce() -> NodeTypeRegistry) -> Arc<NodeTypeRegistry> {
    GLOBAL
        .get_or_init(|| {
            let registry = f();
            log::info!("Node type registry initialized with {} types", registry.len());
            Arc::new(registry)
        })
        .clone()
}

/// The process-wide registry, if [`init`] has run
pub fn global() -> Option<Arc<NodeTypeRegistry>> {
    GLOBAL.get().cloned()
}
