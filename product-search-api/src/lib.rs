//! # Product Search API
//!
//! HTTP surface of the product search service.
//!
//! | Route | Response |
//! |---|---|
//! | `GET /api/search` | faceted, paginated search over the product index |
//! | `GET /health` | liveness, never touches the store |
//! | `GET /` | plain-text greeting |
//! | anything else | `404` |

mod errors;
mod handlers;

pub use errors::ApiError;
pub use handlers::{handle_greeting, handle_health, handle_search};

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Extension, Router};
use product_search_repository::SearchEngineClient;

/// Default upper bound on a store query.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<dyn SearchEngineClient>,
    pub query_timeout: Duration,
}

impl AppState {
    pub fn new(client: Arc<dyn SearchEngineClient>) -> Self {
        Self {
            client,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_greeting))
        .route("/health", get(handle_health))
        .route("/api/search", get(handle_search))
        .fallback(|| async { ApiError::NotFound })
        .layer(Extension(state))
}
