//! Broker abstraction used by the orchestrator.

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};

use crate::consumer::messages::{RecordOffset, StreamMessage};
use crate::errors::PipelineError;

/// A source of change events with externally controlled offset commits.
///
/// Implementations must never commit on their own: offsets move only when
/// [`EventSource::commit_offsets`] is called.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Join the consumer group and subscribe to the configured topic.
    fn subscribe(&self) -> Result<(), PipelineError>;

    /// Forward records to `sender` until the stream ends or `shutdown` fires.
    ///
    /// A final [`StreamMessage::End`] is sent before returning.
    async fn run(
        &self,
        sender: mpsc::Sender<StreamMessage>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), PipelineError>;

    /// Commit consumer group positions.
    ///
    /// Each entry carries the offset of the next record to read, i.e. one
    /// past the last fully handled record of that partition.
    fn commit_offsets(&self, offsets: &[RecordOffset]) -> Result<(), PipelineError>;

    /// Leave the consumer group.
    fn close(&self);
}
