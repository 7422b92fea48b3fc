//! OpenSearch implementation of the document store client.
//!
//! This module provides a concrete implementation of `SearchEngineClient`
//! using OpenSearch as the backend.

mod client;
mod index_config;
mod queries;
mod response;

pub use client::OpenSearchClient;
pub use index_config::{get_index_settings, IndexConfig};
pub use queries::build_search_query;
pub use response::parse_search_response;
