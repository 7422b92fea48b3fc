//! Message types for the consumer.
//!
//! Defines the structures that flow between the consumer, the write workers
//! and the commit coordinator.

use std::fmt;

/// Position of a record in the broker log.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordOffset {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

impl RecordOffset {
    pub fn new(topic: impl Into<String>, partition: i32, offset: i64) -> Self {
        Self {
            topic: topic.into(),
            partition,
            offset,
        }
    }
}

impl fmt::Display for RecordOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]@{}", self.topic, self.partition, self.offset)
    }
}

/// A raw record received from the broker.
#[derive(Debug, Clone)]
pub struct ConsumedRecord {
    pub offset: RecordOffset,
    /// Message value; `None` for tombstones or empty messages.
    pub payload: Option<Vec<u8>>,
}

impl ConsumedRecord {
    pub fn new(offset: RecordOffset, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            offset,
            payload: Some(payload.into()),
        }
    }
}

/// Messages sent from the consumer to the orchestrator.
#[derive(Debug)]
pub enum StreamMessage {
    /// A record to process.
    Record(ConsumedRecord),
    /// Stream has ended.
    End,
    /// An error occurred in the broker client.
    Error(String),
}

/// Progress reports sent to the commit coordinator.
///
/// For a given record, `Received` is always sent before the record's
/// outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ack {
    /// The record was taken off the stream and is now in flight.
    Received(RecordOffset),
    /// The record's document was written and awaits a store commit.
    Staged(RecordOffset),
    /// The record was logged and discarded; nothing to make visible.
    Dropped(RecordOffset),
}
