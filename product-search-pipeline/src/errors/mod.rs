//! Error types for the ingestion pipeline.
//!
//! None of these escape the running pipeline: per-message failures are
//! logged and the message is dropped, while startup failures are returned
//! to the caller.

use product_search_repository::SearchError;
use thiserror::Error;

use crate::processor::MappingError;

/// Errors that can occur in the ingestion pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The raw message is not a well-formed change event.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The event payload does not describe a valid product document.
    #[error("Mapping error: {0}")]
    MappingError(#[from] MappingError),

    /// The store kept failing transiently until retries ran out.
    #[error("Transient store error after {attempts} attempts: {message}")]
    TransientStoreError { attempts: u32, message: String },

    /// The store rejected the write; retrying cannot help.
    #[error("Permanent store error: {0}")]
    PermanentStoreError(String),

    /// Kafka-related error.
    #[error("Kafka error: {0}")]
    KafkaError(String),

    /// Channel communication error.
    #[error("Channel error: {0}")]
    ChannelError(String),
}

impl PipelineError {
    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Classify a store failure that ended a write attempt sequence.
    pub fn from_store(error: SearchError, attempts: u32) -> Self {
        if error.is_transient() {
            Self::TransientStoreError {
                attempts,
                message: error.to_string(),
            }
        } else {
            Self::PermanentStoreError(error.to_string())
        }
    }
}

impl From<rdkafka::error::KafkaError> for PipelineError {
    fn from(err: rdkafka::error::KafkaError) -> Self {
        Self::KafkaError(err.to_string())
    }
}
