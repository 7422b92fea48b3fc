//! Loader module for the ingestion pipeline.
//!
//! Writes product documents into the search index and makes them visible,
//! retrying transient store failures with exponential backoff.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::errors::PipelineError;
use product_search_repository::{SearchEngineClient, SearchError};
use product_search_shared::ProductDocument;

/// Configuration for the index writer.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Number of staged writes that triggers a store commit.
    pub batch_size: usize,
    /// Maximum time a staged write waits for a commit (in milliseconds).
    pub flush_interval_ms: u64,
    /// Maximum number of retries after the first failed attempt.
    pub max_retries: u32,
    /// Initial retry delay in milliseconds.
    pub initial_retry_delay_ms: u64,
    /// Maximum retry delay in milliseconds.
    pub max_retry_delay_ms: u64,
    /// Upper bound on a single store call (in milliseconds).
    pub write_timeout_ms: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            flush_interval_ms: 1000,
            max_retries: 3,
            initial_retry_delay_ms: 100,
            max_retry_delay_ms: 5000,
            write_timeout_ms: 5000,
        }
    }
}

/// Writer that stages documents in the search index and commits them.
///
/// `add` only stages a document; it becomes searchable after the next
/// successful `commit`. Both are safe to call concurrently.
pub struct IndexWriter {
    client: Arc<dyn SearchEngineClient>,
    config: LoaderConfig,
}

impl IndexWriter {
    /// Create a new writer with the default configuration.
    pub fn new(client: Arc<dyn SearchEngineClient>) -> Self {
        Self::with_config(client, LoaderConfig::default())
    }

    /// Create a new writer with custom configuration.
    pub fn with_config(client: Arc<dyn SearchEngineClient>, config: LoaderConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Stage a document, overwriting any previous version with the same id.
    #[instrument(skip(self, document), fields(id = %document.id))]
    pub async fn add(&self, document: &ProductDocument) -> Result<(), PipelineError> {
        self.with_retry("add", || self.client.index_document(document))
            .await
    }

    /// Make every staged document visible to searches.
    #[instrument(skip(self))]
    pub async fn commit(&self) -> Result<(), PipelineError> {
        self.with_retry("commit", || self.client.refresh()).await
    }

    /// Run a store operation with a per-attempt timeout and exponential
    /// backoff between attempts. Only transient errors are retried.
    async fn with_retry<F, Fut>(&self, operation: &str, mut call: F) -> Result<(), PipelineError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), SearchError>>,
    {
        let mut delay_ms = self.config.initial_retry_delay_ms;
        let timeout = Duration::from_millis(self.config.write_timeout_ms);
        let mut attempt = 0;

        loop {
            let error = match tokio::time::timeout(timeout, call()).await {
                Ok(Ok(())) => {
                    if attempt > 0 {
                        info!(operation, attempt, "Store call succeeded after retry");
                    }
                    return Ok(());
                }
                Ok(Err(e)) => e,
                Err(_) => SearchError::Timeout(self.config.write_timeout_ms),
            };

            if !error.is_transient() {
                debug!(operation, error = %error, "Non-retryable store error");
                return Err(PipelineError::from_store(error, attempt + 1));
            }

            // Don't wait after the last attempt
            if attempt >= self.config.max_retries {
                return Err(PipelineError::from_store(error, attempt + 1));
            }

            warn!(
                operation,
                attempt = attempt + 1,
                max_retries = self.config.max_retries,
                delay_ms,
                error = %error,
                "Store call failed, retrying"
            );
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            delay_ms = (delay_ms * 2).min(self.config.max_retry_delay_ms);
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Failure, MockStore};
    use tokio::time::Instant;

    fn writer(store: &Arc<MockStore>) -> IndexWriter {
        IndexWriter::new(store.clone())
    }

    #[test]
    fn test_default_config() {
        let config = LoaderConfig::default();

        assert_eq!(config.batch_size, 100);
        assert_eq!(config.flush_interval_ms, 1000);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.initial_retry_delay_ms, 100);
        assert_eq!(config.max_retry_delay_ms, 5000);
        assert_eq!(config.write_timeout_ms, 5000);
    }

    #[tokio::test]
    async fn test_add_stages_until_commit() {
        let store = Arc::new(MockStore::new());
        let writer = writer(&store);

        writer.add(&ProductDocument::new("p-1")).await.unwrap();
        assert!(store.visible("p-1").is_none());

        writer.commit().await.unwrap();
        assert!(store.visible("p-1").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_is_retried_with_backoff() {
        let store = Arc::new(MockStore::new());
        store.fail_index("p-1", Failure::Transient, 2);
        let writer = writer(&store);

        let started = Instant::now();
        writer.add(&ProductDocument::new("p-1")).await.unwrap();

        assert_eq!(store.index_calls(), 3);
        // 100ms then 200ms of backoff.
        assert_eq!(started.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_gives_up_after_max_retries() {
        let store = Arc::new(MockStore::new());
        store.fail_index("p-1", Failure::Transient, 10);
        let writer = writer(&store);

        let result = writer.add(&ProductDocument::new("p-1")).await;

        assert!(matches!(
            result,
            Err(PipelineError::TransientStoreError { attempts: 4, .. })
        ));
        assert_eq!(store.index_calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_is_capped() {
        let store = Arc::new(MockStore::new());
        store.fail_index("p-1", Failure::Transient, 10);
        let config = LoaderConfig {
            max_retries: 5,
            initial_retry_delay_ms: 1000,
            max_retry_delay_ms: 2500,
            ..LoaderConfig::default()
        };
        let writer = IndexWriter::with_config(store.clone(), config);

        let started = Instant::now();
        let _ = writer.add(&ProductDocument::new("p-1")).await;

        // 1000 + 2000 + 2500 + 2500 + 2500
        assert_eq!(started.elapsed(), Duration::from_millis(10_500));
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let store = Arc::new(MockStore::new());
        store.fail_index("p-1", Failure::Permanent, 1);
        let writer = writer(&store);

        let result = writer.add(&ProductDocument::new("p-1")).await;

        assert!(matches!(result, Err(PipelineError::PermanentStoreError(_))));
        assert_eq!(store.index_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_store_times_out() {
        let store = Arc::new(MockStore::new());
        store.set_latency(Duration::from_secs(60));
        let config = LoaderConfig {
            max_retries: 0,
            ..LoaderConfig::default()
        };
        let writer = IndexWriter::with_config(store.clone(), config);

        let result = writer.add(&ProductDocument::new("p-1")).await;

        match result {
            Err(PipelineError::TransientStoreError { attempts, message }) => {
                assert_eq!(attempts, 1);
                assert!(message.contains("5000"));
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_commit_is_reported() {
        let store = Arc::new(MockStore::new());
        store.fail_refresh(Failure::Permanent, 1);
        let writer = writer(&store);

        writer.add(&ProductDocument::new("p-1")).await.unwrap();
        assert!(writer.commit().await.is_err());
        assert!(store.visible("p-1").is_none());

        writer.commit().await.unwrap();
        assert!(store.visible("p-1").is_some());
    }
}
