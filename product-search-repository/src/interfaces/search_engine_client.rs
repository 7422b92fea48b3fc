//! Document store client trait definition.
//!
//! This module defines the abstract interface for document store operations,
//! allowing for different backend implementations (OpenSearch, mocks, etc.).

use async_trait::async_trait;

use crate::errors::SearchError;
use product_search_shared::{ProductDocument, SearchRequest, StoreSearchResponse};

/// Abstract interface for document store operations.
///
/// One shared instance (behind an `Arc`) serves both the ingestion pipeline
/// and the search API, so implementations must be safe for concurrent
/// readers and writers without external locking.
///
/// # Visibility
///
/// Documents passed to [`index_document`](Self::index_document) are staged.
/// They are only guaranteed to be visible to [`search`](Self::search) after a
/// subsequent successful [`refresh`](Self::refresh).
#[async_trait]
pub trait SearchEngineClient: Send + Sync {
    /// Execute a search request against the index.
    ///
    /// # Returns
    ///
    /// * `Ok(StoreSearchResponse)` - The requested page, the total match count
    ///   and facet counts over all matches
    /// * `Err(SearchError)` - If the query fails
    async fn search(&self, request: &SearchRequest) -> Result<StoreSearchResponse, SearchError>;

    /// Stage a single document.
    ///
    /// The document's `id` is the store id: a document with the same `id`
    /// is replaced, never duplicated.
    async fn index_document(&self, document: &ProductDocument) -> Result<(), SearchError>;

    /// Make all staged documents visible to queries.
    async fn refresh(&self) -> Result<(), SearchError>;

    /// Ensure the index exists with the product mappings.
    ///
    /// This should be called during application startup.
    async fn ensure_index_exists(&self) -> Result<(), SearchError>;

    /// Check if the store is healthy and reachable.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If the store is healthy
    /// * `Ok(false)` - If the store answered but reports itself unhealthy
    /// * `Err(SearchError)` - If the health check fails to execute
    async fn health_check(&self) -> Result<bool, SearchError>;
}
