//! # Product Search Shared
//!
//! Types shared by the ingestion pipeline, the search repository and the
//! HTTP API: the indexed product document, the validated search request and
//! the public search result.

pub mod document;
pub mod request;
pub mod response;

pub use document::{fields, ProductDocument};
pub use request::{SearchRequest, SortMode, ValidationError};
pub use response::{FacetBucket, FacetField, SearchResult, StoreSearchResponse};
