//! OpenSearch client implementation.
//!
//! This module provides the concrete implementation of `SearchEngineClient`
//! using the OpenSearch Rust client.

use async_trait::async_trait;
use opensearch::{
    cluster::ClusterHealthParts,
    http::response::Response,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesExistsParts, IndicesRefreshParts},
    IndexParts, OpenSearch, SearchParts,
};
use serde_json::Value;
use tracing::{debug, error, info, instrument};
use url::Url;

use crate::config::QueryConfig;
use crate::errors::SearchError;
use crate::interfaces::SearchEngineClient;
use crate::opensearch::index_config::{get_index_settings, IndexConfig};
use crate::opensearch::queries::build_search_query;
use crate::opensearch::response::parse_search_response;
use product_search_shared::{ProductDocument, SearchRequest, StoreSearchResponse};

/// OpenSearch client implementation.
///
/// The underlying `OpenSearch` client pools its HTTP connections and is safe
/// to share between the ingestion pipeline and concurrent search requests.
///
/// # Example
///
/// ```ignore
/// let client = OpenSearchClient::new(
///     "http://localhost:9200",
///     IndexConfig::new("products"),
///     QueryConfig::default(),
/// )?;
/// client.ensure_index_exists().await?;
///
/// client.index_document(&ProductDocument::new("p-1").with_name("Phone")).await?;
/// client.refresh().await?;
/// ```
pub struct OpenSearchClient {
    client: OpenSearch,
    index_config: IndexConfig,
    query_config: QueryConfig,
}

impl OpenSearchClient {
    /// Create a new OpenSearch client connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `index_config` - The product index name and sharding
    /// * `query_config` - Facet and recency tunables for the query builder
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchClient)` - A new client instance
    /// * `Err(SearchError)` - If the URL is invalid or transport setup fails
    pub fn new(
        url: &str,
        index_config: IndexConfig,
        query_config: QueryConfig,
    ) -> Result<Self, SearchError> {
        let parsed_url = Url::parse(url).map_err(|e| SearchError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            url = %url,
            index = %index_config.name,
            "Created OpenSearch client"
        );

        Ok(Self {
            client,
            index_config,
            query_config,
        })
    }

    fn index_name(&self) -> &str {
        &self.index_config.name
    }
}

/// Turn a non-success response into a classified error.
async fn ensure_success(response: Response, operation: &str) -> Result<Response, SearchError> {
    let status = response.status_code();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    error!(operation = %operation, status = %status, body = %body, "Request failed");
    Err(SearchError::from_status(status.as_u16(), body))
}

#[async_trait]
impl SearchEngineClient for OpenSearchClient {
    #[instrument(skip(self, request), fields(q = %request.q, page = request.page, size = request.size))]
    async fn search(&self, request: &SearchRequest) -> Result<StoreSearchResponse, SearchError> {
        let body = build_search_query(request, &self.query_config);

        let response = self
            .client
            .search(SearchParts::Index(&[self.index_name()]))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;
        let response = ensure_success(response, "search").await?;

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;

        let result = parse_search_response(body)?;
        debug!(
            total = result.total_matches,
            returned = result.documents.len(),
            "Search completed"
        );
        Ok(result)
    }

    async fn index_document(&self, document: &ProductDocument) -> Result<(), SearchError> {
        let response = self
            .client
            .index(IndexParts::IndexId(self.index_name(), &document.id))
            .body(document)
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;
        ensure_success(response, "index").await?;

        debug!(id = %document.id, "Document staged");
        Ok(())
    }

    async fn refresh(&self) -> Result<(), SearchError> {
        let response = self
            .client
            .indices()
            .refresh(IndicesRefreshParts::Index(&[self.index_name()]))
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;
        ensure_success(response, "refresh").await?;

        debug!(index = %self.index_name(), "Index refreshed");
        Ok(())
    }

    async fn ensure_index_exists(&self) -> Result<(), SearchError> {
        let exists = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[self.index_name()]))
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        if exists.status_code().is_success() {
            debug!(index = %self.index_name(), "Index already exists");
            return Ok(());
        }

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(self.index_name()))
            .body(get_index_settings(&self.index_config))
            .send()
            .await
            .map_err(|e| SearchError::IndexCreationError(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Another instance may have created it between the two calls.
            if body.contains("resource_already_exists_exception") {
                return Ok(());
            }
            return Err(SearchError::IndexCreationError(format!(
                "Index creation failed with status {}: {}",
                status, body
            )));
        }

        info!(index = %self.index_name(), "Created index");
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, SearchError> {
        let response = self
            .client
            .cluster()
            .health(ClusterHealthParts::None)
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        if !response.status_code().is_success() {
            return Ok(false);
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;

        Ok(is_healthy(&body))
    }
}

/// A cluster is usable unless it reports `red`.
fn is_healthy(health: &Value) -> bool {
    matches!(health["status"].as_str(), Some("green") | Some("yellow"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_rejects_invalid_url() {
        let result = OpenSearchClient::new(
            "not a url",
            IndexConfig::default(),
            QueryConfig::default(),
        );

        assert!(matches!(result, Err(SearchError::ConnectionError(_))));
    }

    #[test]
    fn test_new_accepts_valid_url() {
        let client = OpenSearchClient::new(
            "http://localhost:9200",
            IndexConfig::new("catalog"),
            QueryConfig::default(),
        )
        .unwrap();

        assert_eq!(client.index_name(), "catalog");
    }

    #[test]
    fn test_is_healthy() {
        assert!(is_healthy(&json!({ "status": "green" })));
        assert!(is_healthy(&json!({ "status": "yellow" })));
        assert!(!is_healthy(&json!({ "status": "red" })));
        assert!(!is_healthy(&json!({})));
    }
}
