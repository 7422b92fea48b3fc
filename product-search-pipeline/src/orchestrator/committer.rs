//! Commit coordination between the store and the broker.
//!
//! Staged writes are made visible in batches. Broker offsets move forward
//! only after the store commit that covers them has succeeded. Each record
//! holds one unit of intake capacity until it is complete, which is what
//! stops intake when store commits keep failing.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Semaphore};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument, warn};

use crate::consumer::{Ack, EventSource, RecordOffset};
use crate::loader::IndexWriter;
use crate::orchestrator::offsets::OffsetTracker;

/// Owns the offset tracker and decides when to commit.
pub struct CommitCoordinator {
    writer: Arc<IndexWriter>,
    source: Arc<dyn EventSource>,
    tracker: OffsetTracker,
    staged: Vec<RecordOffset>,
    capacity: Arc<Semaphore>,
    batch_size: usize,
    flush_interval: Duration,
}

impl CommitCoordinator {
    /// `capacity` gets one permit back for every record that completes.
    pub fn new(
        writer: Arc<IndexWriter>,
        source: Arc<dyn EventSource>,
        capacity: Arc<Semaphore>,
    ) -> Self {
        let config = writer.config();
        let batch_size = config.batch_size.max(1);
        let flush_interval = Duration::from_millis(config.flush_interval_ms.max(1));

        Self {
            writer,
            source,
            tracker: OffsetTracker::new(),
            staged: Vec::with_capacity(batch_size),
            capacity,
            batch_size,
            flush_interval,
        }
    }

    /// Consume acknowledgements until every sender is gone, then commit
    /// whatever is left.
    #[instrument(skip(self, acks))]
    pub async fn run(mut self, mut acks: mpsc::UnboundedReceiver<Ack>) {
        let mut ticker = tokio::time::interval(self.flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                ack = acks.recv() => {
                    match ack {
                        Some(ack) => {
                            if self.apply(ack) {
                                self.flush().await;
                            }
                        }
                        None => break,
                    }
                }
                _ = ticker.tick() => {
                    self.flush().await;
                }
            }
        }

        self.flush().await;

        let in_flight = self.tracker.in_flight();
        if in_flight > 0 {
            warn!(in_flight, "Stopping with unfinished records; they will be redelivered");
        }
        info!("Commit coordinator stopped");
    }

    /// Record an acknowledgement. Returns true when a batch is full.
    fn apply(&mut self, ack: Ack) -> bool {
        match ack {
            Ack::Received(offset) => self.tracker.track(&offset),
            Ack::Staged(offset) => self.staged.push(offset),
            Ack::Dropped(offset) => {
                self.tracker.complete(&offset);
                self.capacity.add_permits(1);
            }
        }
        self.staged.len() >= self.batch_size
    }

    async fn flush(&mut self) {
        if !self.staged.is_empty() {
            if let Err(e) = self.writer.commit().await {
                // Keep the batch; the next trigger tries again.
                error!(staged = self.staged.len(), error = %e, "Store commit failed");
                return;
            }

            let count = self.staged.len();
            debug!(count, "Committed staged documents");
            for offset in self.staged.drain(..) {
                self.tracker.complete(&offset);
            }
            self.capacity.add_permits(count);
        }

        let offsets = self.tracker.committable();
        if offsets.is_empty() {
            return;
        }

        match self.source.commit_offsets(&offsets) {
            Ok(()) => self.tracker.mark_committed(&offsets),
            Err(e) => warn!(error = %e, "Offset commit failed"),
        }
    }
}
