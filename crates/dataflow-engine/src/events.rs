//! Event types for streaming evaluation progress
//!
//! Events are sent from the evaluator to any consumer (editor, log
//! collector, test) to report node state changes while a graph runs.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Trait for sending evaluation events
///
/// Abstracts over the transport (channel, websocket, in-memory buffer) so the
/// evaluator can be used in different contexts.
pub trait EventSink: Send + Sync {
    /// Send an event
    ///
    /// Returns an error if the event could not be delivered
    fn send(&self, event: EvaluationEvent) -> Result<(), EventError>;
}

/// Error when sending events fails
#[derive(Debug, Clone, thiserror::Error)]
#[error("Event error: {message}")]
pub struct EventError {
    pub message: String,
}

/// Events emitted during evaluation
///
/// Node ids are carried as strings so events serialize the same way for any
/// consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EvaluationEvent {
    #[serde(rename_all = "camelCase")]
    EvaluationStarted { execution_id: String, node_count: usize },

    #[serde(rename_all = "camelCase")]
    NodeStarted { execution_id: String, node_id: String },

    #[serde(rename_all = "camelCase")]
    NodeResolved {
        execution_id: String,
        node_id: String,
        outputs: serde_json::Value,
    },

    #[serde(rename_all = "camelCase")]
    NodeFailed {
        execution_id: String,
        node_id: String,
        error: String,
    },

    /// Never started because an upstream node failed
    #[serde(rename_all = "camelCase")]
    NodeSkipped {
        execution_id: String,
        node_id: String,
        origin: String,
    },

    #[serde(rename_all = "camelCase")]
    EvaluationCompleted { execution_id: String },

    #[serde(rename_all = "camelCase")]
    EvaluationFailed { execution_id: String, error: String },
}

impl EvaluationEvent {
    /// The run this event belongs to
    pub fn execution_id(&self) -> &str {
        match self {
            Self::EvaluationStarted { execution_id, .. }
            | Self::NodeStarted { execution_id, .. }
            | Self::NodeResolved { execution_id, .. }
            | Self::NodeFailed { execution_id, .. }
            | Self::NodeSkipped { execution_id, .. }
            | Self::EvaluationCompleted { execution_id }
            | Self::EvaluationFailed { execution_id, .. } => execution_id,
        }
    }
}

/// A no-op event sink that discards all events
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: EvaluationEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// A vector-based event sink that collects events
///
/// Useful for testing to verify events were emitted correctly.
pub struct VecEventSink {
    events: Mutex<Vec<EvaluationEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    /// Get all collected events
    pub fn events(&self) -> Vec<EvaluationEvent> {
        self.events.lock().clone()
    }

    /// Clear all collected events
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl Default for VecEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for VecEventSink {
    fn send(&self, event: EvaluationEvent) -> Result<(), EventError> {
        self.events.lock().push(event);
        Ok(())
    }
}
