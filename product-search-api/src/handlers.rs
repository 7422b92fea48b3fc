//! Request handlers for the search API.

use axum::extract::Query;
use axum::{Extension, Json};
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::errors::ApiError;
use crate::AppState;
use product_search_repository::SearchError;
use product_search_shared::{SearchRequest, SearchResult};

pub async fn handle_greeting() -> &'static str {
    "Hello from Search Service!"
}

pub async fn handle_health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `GET /api/search`
///
/// Parameters are validated before the store is contacted; a query that
/// does not answer within the configured timeout is a store failure.
#[instrument(skip_all)]
pub async fn handle_search(
    Query(params): Query<Vec<(String, String)>>,
    Extension(state): Extension<AppState>,
) -> Result<Json<SearchResult>, ApiError> {
    let request = SearchRequest::from_params(
        params.iter().map(|(k, v)| (k.as_str(), v.as_str())),
    )?;

    let timeout_ms = state.query_timeout.as_millis() as u64;
    let raw = tokio::time::timeout(state.query_timeout, state.client.search(&request))
        .await
        .map_err(|_| SearchError::Timeout(timeout_ms))??;

    let result = SearchResult::shape(&request, raw);
    debug!(q = %request.q, total = result.total, items = result.items.len(), "Search served");
    Ok(Json(result))
}
