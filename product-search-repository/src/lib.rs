//! # Product Search Repository
//!
//! This crate provides the document store capability used by both the
//! ingestion pipeline and the search API. It includes the error taxonomy
//! (with transient/permanent classification), the abstract
//! `SearchEngineClient` interface, and a concrete implementation for
//! OpenSearch.

pub mod config;
pub mod errors;
pub mod interfaces;
pub mod opensearch;

pub use config::QueryConfig;
pub use errors::SearchError;
pub use interfaces::SearchEngineClient;
pub use opensearch::{IndexConfig, OpenSearchClient};
