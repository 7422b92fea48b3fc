//! In-memory doubles for the store and the broker.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};

use crate::consumer::{ConsumedRecord, EventSource, RecordOffset, StreamMessage};
use crate::errors::PipelineError;
use product_search_repository::{SearchEngineClient, SearchError};
use product_search_shared::{ProductDocument, SearchRequest, StoreSearchResponse};

#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Transient,
    Permanent,
}

impl Failure {
    fn error(self) -> SearchError {
        match self {
            Failure::Transient => SearchError::from_status(503, "unavailable".to_string()),
            Failure::Permanent => SearchError::from_status(400, "mapper_parsing_exception".to_string()),
        }
    }
}

#[derive(Default)]
struct StoreState {
    staged: HashMap<String, ProductDocument>,
    visible: HashMap<String, ProductDocument>,
    index_failures: HashMap<String, (Failure, usize)>,
    refresh_failures: Option<(Failure, usize)>,
    latency: Duration,
    write_delays: HashMap<String, Duration>,
    writes: Vec<String>,
}

/// Store with a staged area and a visible area, like a refreshing index.
#[derive(Default)]
pub struct MockStore {
    state: Mutex<StoreState>,
    index_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `times` writes of `id`.
    pub fn fail_index(&self, id: &str, failure: Failure, times: usize) {
        let mut state = self.state.lock().unwrap();
        state.index_failures.insert(id.to_string(), (failure, times));
    }

    /// Fail the next `times` refreshes.
    pub fn fail_refresh(&self, failure: Failure, times: usize) {
        self.state.lock().unwrap().refresh_failures = Some((failure, times));
    }

    pub fn set_latency(&self, latency: Duration) {
        self.state.lock().unwrap().latency = latency;
    }

    /// Hold the next write of `id` for `delay` before it lands.
    pub fn delay_next_write(&self, id: &str, delay: Duration) {
        let mut state = self.state.lock().unwrap();
        state.write_delays.insert(id.to_string(), delay);
    }

    pub fn visible(&self, id: &str) -> Option<ProductDocument> {
        self.state.lock().unwrap().visible.get(id).cloned()
    }

    pub fn visible_count(&self) -> usize {
        self.state.lock().unwrap().visible.len()
    }

    /// Ids in the order their writes were accepted.
    pub fn writes(&self) -> Vec<String> {
        self.state.lock().unwrap().writes.clone()
    }

    pub fn index_calls(&self) -> usize {
        self.index_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }
}

fn take_failure(slot: Option<&mut (Failure, usize)>) -> Option<Failure> {
    match slot {
        Some((failure, remaining)) if *remaining > 0 => {
            *remaining -= 1;
            Some(*failure)
        }
        _ => None,
    }
}

#[async_trait]
impl SearchEngineClient for MockStore {
    async fn search(&self, _request: &SearchRequest) -> Result<StoreSearchResponse, SearchError> {
        let state = self.state.lock().unwrap();
        let documents: Vec<ProductDocument> = state.visible.values().cloned().collect();
        Ok(StoreSearchResponse {
            total_matches: documents.len() as u64,
            documents,
            facets: Vec::new(),
        })
    }

    async fn index_document(&self, document: &ProductDocument) -> Result<(), SearchError> {
        self.index_calls.fetch_add(1, Ordering::SeqCst);
        let latency = {
            let mut state = self.state.lock().unwrap();
            let delay = state.write_delays.remove(&document.id).unwrap_or_default();
            state.latency + delay
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.state.lock().unwrap();
        if let Some(failure) = take_failure(state.index_failures.get_mut(&document.id)) {
            return Err(failure.error());
        }
        state.writes.push(document.id.clone());
        state.staged.insert(document.id.clone(), document.clone());
        Ok(())
    }

    async fn refresh(&self) -> Result<(), SearchError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        if let Some(failure) = take_failure(state.refresh_failures.as_mut()) {
            return Err(failure.error());
        }
        let staged: Vec<ProductDocument> = state.staged.drain().map(|(_, doc)| doc).collect();
        for doc in staged {
            state.visible.insert(doc.id.clone(), doc);
        }
        Ok(())
    }

    async fn ensure_index_exists(&self) -> Result<(), SearchError> {
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, SearchError> {
        Ok(true)
    }
}

/// Broker double that replays a fixed set of records.
///
/// By default the stream ends after the last record. An open source keeps
/// the stream alive until the pipeline is told to stop.
pub struct FakeSource {
    records: Mutex<Vec<ConsumedRecord>>,
    ends: bool,
    commits: Mutex<Vec<Vec<RecordOffset>>>,
    subscribed: AtomicBool,
    closed: AtomicBool,
}

impl FakeSource {
    pub fn new(records: Vec<ConsumedRecord>) -> Self {
        Self::build(records, true)
    }

    /// A source that never reports the end of its stream.
    pub fn open(records: Vec<ConsumedRecord>) -> Self {
        Self::build(records, false)
    }

    fn build(records: Vec<ConsumedRecord>, ends: bool) -> Self {
        Self {
            records: Mutex::new(records),
            ends,
            commits: Mutex::new(Vec::new()),
            subscribed: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    /// Every commit call, in order.
    pub fn commits(&self) -> Vec<Vec<RecordOffset>> {
        self.commits.lock().unwrap().clone()
    }

    /// Latest committed position for a partition.
    pub fn committed(&self, topic: &str, partition: i32) -> Option<i64> {
        self.commits
            .lock()
            .unwrap()
            .iter()
            .flatten()
            .filter(|o| o.topic == topic && o.partition == partition)
            .map(|o| o.offset)
            .last()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventSource for FakeSource {
    fn subscribe(&self) -> Result<(), PipelineError> {
        self.subscribed.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn run(
        &self,
        sender: mpsc::Sender<StreamMessage>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), PipelineError> {
        let records: Vec<ConsumedRecord> = self.records.lock().unwrap().drain(..).collect();
        for record in records {
            tokio::select! {
                sent = sender.send(StreamMessage::Record(record)) => {
                    if sent.is_err() {
                        return Ok(());
                    }
                }
                _ = shutdown.recv() => return Ok(()),
            }
        }

        if self.ends {
            let _ = sender.send(StreamMessage::End).await;
        } else {
            let _ = shutdown.recv().await;
        }
        Ok(())
    }

    fn commit_offsets(&self, offsets: &[RecordOffset]) -> Result<(), PipelineError> {
        self.commits.lock().unwrap().push(offsets.to_vec());
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// A record on partition 0 of the default topic.
pub fn record(offset: i64, payload: &str) -> ConsumedRecord {
    ConsumedRecord::new(
        RecordOffset::new("product-search-events", 0, offset),
        payload.as_bytes().to_vec(),
    )
}
