//! Dispatcher module for the ingestion pipeline.
//!
//! Runs index writes on a fixed pool of workers. Every document id maps to
//! exactly one worker, so writes for the same product are applied in the
//! order they were received while different products proceed in parallel.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::consumer::{Ack, RecordOffset};
use crate::errors::PipelineError;
use crate::loader::IndexWriter;
use product_search_shared::ProductDocument;

/// Configuration for the write dispatcher.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Number of worker shards.
    pub workers: usize,
    /// Capacity of each shard's queue.
    pub queue_capacity: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 256,
        }
    }
}

/// A document to write together with the record it came from.
#[derive(Debug, Clone)]
pub struct WriteJob {
    pub document: ProductDocument,
    pub offset: RecordOffset,
}

/// Pool of write workers sharded by document id.
pub struct WriteDispatcher {
    shards: Vec<mpsc::Sender<WriteJob>>,
    handles: Vec<JoinHandle<()>>,
}

impl WriteDispatcher {
    /// Spawn the workers.
    ///
    /// Each worker reports the outcome of every job on `acks`: `Staged` once
    /// the document is written, `Dropped` if the write failed for good.
    pub fn spawn(
        writer: Arc<IndexWriter>,
        acks: mpsc::UnboundedSender<Ack>,
        config: DispatcherConfig,
    ) -> Self {
        let workers = config.workers.max(1);
        let mut shards = Vec::with_capacity(workers);
        let mut handles = Vec::with_capacity(workers);

        for shard in 0..workers {
            let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
            shards.push(tx);
            handles.push(tokio::spawn(run_worker(
                shard,
                rx,
                writer.clone(),
                acks.clone(),
            )));
        }

        info!(workers, queue_capacity = config.queue_capacity, "Started write workers");

        Self { shards, handles }
    }

    /// Queue a job on the worker owning its document id.
    ///
    /// Waits while that worker's queue is full.
    pub async fn dispatch(&self, job: WriteJob) -> Result<(), PipelineError> {
        let shard = shard_for(&job.document.id, self.shards.len());
        self.shards[shard]
            .send(job)
            .await
            .map_err(|e| PipelineError::ChannelError(format!("write worker {} stopped: {}", shard, e)))
    }

    /// Close the queues and wait for queued writes to finish.
    ///
    /// Workers still busy after `timeout` are aborted; their records are
    /// never acknowledged and will be redelivered.
    pub async fn shutdown(self, timeout: Duration) {
        let Self { shards, handles } = self;
        drop(shards);

        let aborts: Vec<_> = handles.iter().map(|h| h.abort_handle()).collect();
        if tokio::time::timeout(timeout, join_all(handles)).await.is_err() {
            warn!(
                timeout_ms = timeout.as_millis() as u64,
                "Write workers did not drain in time, aborting"
            );
            for abort in aborts {
                abort.abort();
            }
        } else {
            debug!("Write workers drained");
        }
    }
}

/// Pick the shard for a document id.
fn shard_for(id: &str, shards: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    (hasher.finish() % shards as u64) as usize
}

async fn run_worker(
    shard: usize,
    mut jobs: mpsc::Receiver<WriteJob>,
    writer: Arc<IndexWriter>,
    acks: mpsc::UnboundedSender<Ack>,
) {
    while let Some(job) = jobs.recv().await {
        let ack = match writer.add(&job.document).await {
            Ok(()) => Ack::Staged(job.offset),
            Err(e) => {
                error!(
                    shard,
                    id = %job.document.id,
                    offset = %job.offset,
                    error = %e,
                    "Dropping document after failed write"
                );
                Ack::Dropped(job.offset)
            }
        };

        if acks.send(ack).is_err() {
            warn!(shard, "Commit coordinator stopped, worker exiting");
            break;
        }
    }

    debug!(shard, "Write worker finished");
}
