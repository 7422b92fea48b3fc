//! Kafka consumer implementation for the product search pipeline.
//!
//! Consumes product change events and forwards the raw records to the
//! pipeline. Offsets are committed only on request of the orchestrator.

use async_trait::async_trait;
use rdkafka::{
    config::ClientConfig,
    consumer::{CommitMode, Consumer, StreamConsumer},
    message::{BorrowedMessage, Message as KafkaMessage},
    Offset, TopicPartitionList,
};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, instrument};

use crate::consumer::messages::{ConsumedRecord, RecordOffset, StreamMessage};
use crate::consumer::source::EventSource;
use crate::errors::PipelineError;

/// Default consumer group.
pub const DEFAULT_GROUP_ID: &str = "search-indexer-v2";

/// Default topic carrying product change events.
pub const DEFAULT_TOPIC: &str = "product-search-events";

/// Connection settings for [`KafkaConsumer`].
#[derive(Debug, Clone)]
pub struct KafkaConsumerConfig {
    pub brokers: String,
    pub group_id: String,
    pub topic: String,
}

impl KafkaConsumerConfig {
    pub fn new(brokers: impl Into<String>) -> Self {
        Self {
            brokers: brokers.into(),
            group_id: DEFAULT_GROUP_ID.to_string(),
            topic: DEFAULT_TOPIC.to_string(),
        }
    }

    pub fn with_group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = group_id.into();
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }
}

/// Kafka consumer for product change events.
pub struct KafkaConsumer {
    consumer: StreamConsumer,
    topic: String,
}

impl KafkaConsumer {
    /// Create a new Kafka consumer.
    ///
    /// Auto-commit is disabled; a group with no committed position starts
    /// from the earliest retained record.
    pub fn new(config: &KafkaConsumerConfig) -> Result<Self, PipelineError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("group.id", &config.group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "6000")
            .create()?;

        info!(
            brokers = %config.brokers,
            group_id = %config.group_id,
            "Created Kafka consumer"
        );

        Ok(Self {
            consumer,
            topic: config.topic.clone(),
        })
    }

    /// Forward a single Kafka message to the pipeline.
    async fn forward_message(
        &self,
        msg: &BorrowedMessage<'_>,
        sender: &mpsc::Sender<StreamMessage>,
    ) -> Result<(), PipelineError> {
        let offset = RecordOffset::new(msg.topic(), msg.partition(), msg.offset());
        debug!(offset = %offset, "Received message");

        // Empty records still flow through so their offset gets accounted for.
        let record = ConsumedRecord {
            offset,
            payload: msg.payload().map(|p| p.to_vec()),
        };

        sender
            .send(StreamMessage::Record(record))
            .await
            .map_err(|e| PipelineError::ChannelError(e.to_string()))
    }
}

#[async_trait]
impl EventSource for KafkaConsumer {
    fn subscribe(&self) -> Result<(), PipelineError> {
        self.consumer.subscribe(&[self.topic.as_str()])?;

        info!(topic = %self.topic, "Subscribed to Kafka topic");
        Ok(())
    }

    #[instrument(skip(self, sender, shutdown), fields(topic = %self.topic))]
    async fn run(
        &self,
        sender: mpsc::Sender<StreamMessage>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), PipelineError> {
        use futures::StreamExt;

        let mut message_stream = self.consumer.stream();

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Consumer received shutdown signal");
                    let _ = sender.send(StreamMessage::End).await;
                    break;
                }
                message = message_stream.next() => {
                    match message {
                        Some(Ok(msg)) => {
                            if let Err(e) = self.forward_message(&msg, &sender).await {
                                // The receiving side is gone; nothing left to feed.
                                error!(error = %e, "Failed to forward message");
                                break;
                            }
                        }
                        Some(Err(e)) => {
                            error!(error = %e, "Kafka error");
                            let _ = sender.send(StreamMessage::Error(e.to_string())).await;
                        }
                        None => {
                            info!("Kafka stream ended");
                            let _ = sender.send(StreamMessage::End).await;
                            break;
                        }
                    }
                }
            }
        }

        Ok(())
    }

    fn commit_offsets(&self, offsets: &[RecordOffset]) -> Result<(), PipelineError> {
        if offsets.is_empty() {
            return Ok(());
        }

        let mut tpl = TopicPartitionList::new();
        for offset in offsets {
            tpl.add_partition_offset(&offset.topic, offset.partition, Offset::Offset(offset.offset))?;
        }

        self.consumer.commit(&tpl, CommitMode::Async)?;

        debug!(partitions = offsets.len(), "Committed offsets");
        Ok(())
    }

    fn close(&self) {
        self.consumer.unsubscribe();
        info!(topic = %self.topic, "Unsubscribed from Kafka topic");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = KafkaConsumerConfig::new("localhost:9092");

        assert_eq!(config.brokers, "localhost:9092");
        assert_eq!(config.group_id, "search-indexer-v2");
        assert_eq!(config.topic, "product-search-events");
    }

    #[test]
    fn test_config_overrides() {
        let config = KafkaConsumerConfig::new("broker:29092")
            .with_group_id("reindex")
            .with_topic("products.v2");

        assert_eq!(config.group_id, "reindex");
        assert_eq!(config.topic, "products.v2");
    }
}
