//! Orchestrator module for the product search pipeline.
//!
//! Coordinates the consumer, processor, dispatcher and commit coordinator.

mod committer;
mod offsets;

pub use committer::CommitCoordinator;
pub use offsets::OffsetTracker;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, Semaphore};
use tracing::{error, info, instrument, warn};

use crate::consumer::{Ack, ConsumedRecord, EventSource, StreamMessage};
use crate::dispatcher::{DispatcherConfig, WriteDispatcher, WriteJob};
use crate::errors::PipelineError;
use crate::loader::IndexWriter;
use crate::processor::ProductProcessor;

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Size of the message channel buffer.
    pub channel_buffer_size: usize,
    /// How long shutdown waits for queued writes (in milliseconds).
    pub shutdown_timeout_ms: u64,
    /// Most records that may be taken off the stream before their store
    /// commit. Intake waits once this many are outstanding.
    pub max_pending: usize,
    pub dispatcher: DispatcherConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: 1000,
            shutdown_timeout_ms: 10_000,
            max_pending: 5000,
            dispatcher: DispatcherConfig::default(),
        }
    }
}

/// Orchestrator that coordinates the pipeline components.
///
/// The orchestrator:
/// - Receives records from the event source on a single loop
/// - Maps them synchronously and hands writes to the dispatcher
/// - Reports every record's fate to the commit coordinator
/// - Stops taking records while `max_pending` of them await a store commit
/// - Drains in-flight work on shutdown
pub struct Orchestrator {
    source: Arc<dyn EventSource>,
    processor: ProductProcessor,
    writer: Arc<IndexWriter>,
    config: OrchestratorConfig,
    shutdown_tx: broadcast::Sender<()>,
}

impl Orchestrator {
    /// Create a new orchestrator with custom configuration.
    pub fn with_config(
        source: Arc<dyn EventSource>,
        processor: ProductProcessor,
        writer: Arc<IndexWriter>,
        config: OrchestratorConfig,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            source,
            processor,
            writer,
            config,
            shutdown_tx,
        }
    }

    /// A handle that stops the pipeline when sent to.
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Run the pipeline until the stream ends or shutdown is requested.
    ///
    /// Only a failure to start returns an error; per-record failures are
    /// logged and the record is skipped.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<(), PipelineError> {
        info!("Starting product search pipeline");

        self.source.subscribe()?;

        let (tx, mut rx) = mpsc::channel::<StreamMessage>(self.config.channel_buffer_size);

        // Start consumer in background
        let source = self.source.clone();
        let shutdown_rx = self.shutdown_tx.subscribe();
        let consumer_handle = tokio::spawn(async move {
            if let Err(e) = source.run(tx, shutdown_rx).await {
                error!(error = %e, "Consumer error");
            }
        });

        let capacity = Arc::new(Semaphore::new(self.config.max_pending.max(1)));
        let mut stop = self.shutdown_tx.subscribe();

        let (ack_tx, ack_rx) = mpsc::unbounded_channel();
        let committer =
            CommitCoordinator::new(self.writer.clone(), self.source.clone(), capacity.clone());
        let committer_handle = tokio::spawn(committer.run(ack_rx));

        let dispatcher = WriteDispatcher::spawn(
            self.writer.clone(),
            ack_tx.clone(),
            self.config.dispatcher.clone(),
        );

        while let Some(msg) = rx.recv().await {
            match msg {
                StreamMessage::Record(record) => {
                    let permit = tokio::select! {
                        permit = capacity.acquire() => permit,
                        _ = stop.recv() => {
                            warn!("Stopping while waiting for pending records to commit");
                            break;
                        }
                    };
                    match permit {
                        // Given back by the commit coordinator once the record completes
                        Ok(permit) => permit.forget(),
                        Err(e) => {
                            error!(error = %e, "Intake capacity closed, stopping pipeline");
                            break;
                        }
                    }

                    if let Err(e) = self.handle_record(record, &dispatcher, &ack_tx).await {
                        error!(error = %e, "Write dispatch failed, stopping pipeline");
                        break;
                    }
                }
                StreamMessage::Error(e) => {
                    error!(error = %e, "Received error from consumer");
                }
                StreamMessage::End => {
                    info!("Consumer stream ended");
                    break;
                }
            }
        }

        // Stop the consumer if we left the loop on our own
        let _ = self.shutdown_tx.send(());
        drop(rx);
        if let Err(e) = consumer_handle.await {
            error!(error = %e, "Consumer task failed");
        }

        dispatcher
            .shutdown(Duration::from_millis(self.config.shutdown_timeout_ms))
            .await;

        drop(ack_tx);
        if let Err(e) = committer_handle.await {
            error!(error = %e, "Commit coordinator task failed");
        }

        self.source.close();
        info!("Pipeline shutdown complete");
        Ok(())
    }

    /// Map one record and queue its write, or drop it.
    async fn handle_record(
        &self,
        record: ConsumedRecord,
        dispatcher: &WriteDispatcher,
        acks: &mpsc::UnboundedSender<Ack>,
    ) -> Result<(), PipelineError> {
        let offset = record.offset;
        let _ = acks.send(Ack::Received(offset.clone()));

        let bytes = match record.payload {
            Some(bytes) if !bytes.is_empty() => bytes,
            _ => {
                warn!(offset = %offset, "Skipping empty message");
                let _ = acks.send(Ack::Dropped(offset));
                return Ok(());
            }
        };

        match self.processor.process(&bytes) {
            Ok(document) => dispatcher.dispatch(WriteJob { document, offset }).await,
            Err(e) => {
                warn!(offset = %offset, error = %e, "Skipping invalid event");
                let _ = acks.send(Ack::Dropped(offset));
                Ok(())
            }
        }
    }
}
