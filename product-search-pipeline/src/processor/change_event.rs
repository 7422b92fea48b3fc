//! Wire format of the inbound change events.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::errors::PipelineError;

/// A product change event as published on the topic.
///
/// `payload` is kept loosely typed; turning it into a document is the
/// mapper's job.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeEvent {
    #[serde(rename = "eventType", default)]
    pub event_type: Option<String>,
    pub payload: Map<String, Value>,
}

impl ChangeEvent {
    /// Decode an event from the raw message value.
    pub fn parse(bytes: &[u8]) -> Result<Self, PipelineError> {
        serde_json::from_slice(bytes)
            .map_err(|e| PipelineError::parse(format!("Invalid change event: {}", e)))
    }

    pub fn event_type(&self) -> &str {
        self.event_type.as_deref().unwrap_or("unknown")
    }
}
