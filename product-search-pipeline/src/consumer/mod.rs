//! Consumer module for the ingestion pipeline.
//!
//! Provides the broker abstraction and its Kafka implementation.

mod kafka_consumer;
mod messages;
mod source;

pub use kafka_consumer::{KafkaConsumer, KafkaConsumerConfig, DEFAULT_GROUP_ID, DEFAULT_TOPIC};
pub use messages::{Ack, ConsumedRecord, RecordOffset, StreamMessage};
pub use source::EventSource;
