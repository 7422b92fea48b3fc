//! API error type and its HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use product_search_repository::SearchError;
use product_search_shared::ValidationError;

/// Everything a request can fail with.
///
/// Store failures are logged in full but reach the client only as a generic
/// message.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("query failed: {0}")]
    Query(#[from] SearchError),

    #[error("not found")]
    NotFound,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Query(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::Validation(e) => e.to_string(),
            ApiError::Query(e) => {
                error!(error = %e, "Search failed");
                "Search failed".to_string()
            }
            ApiError::NotFound => "Not found".to_string(),
        };

        (self.status(), Json(json!({ "error": message }))).into_response()
    }
}
