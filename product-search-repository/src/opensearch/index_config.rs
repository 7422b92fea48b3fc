//! OpenSearch index configuration and mappings.
//!
//! This module defines the index settings and mappings for the product index.

use serde_json::{json, Value};

use product_search_shared::fields;

/// Default name of the product index.
pub const DEFAULT_INDEX_NAME: &str = "products";

/// Identity and sharding of the product index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    pub name: String,
    pub number_of_shards: u32,
    pub number_of_replicas: u32,
}

impl IndexConfig {
    /// Create a single-shard config for the named index.
    ///
    /// One shard keeps relevance scores and facet counts exact.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            number_of_shards: 1,
            number_of_replicas: 1,
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self::new(DEFAULT_INDEX_NAME)
    }
}

/// Get the index settings and mappings for the product index.
///
/// The mapping includes:
/// - **Keyword fields** for `id`, `category` and `brand` (exact filters, facets)
/// - **Text fields** for `name` and `description`, each copied into the
///   catch-all `text_all` field
/// - A numeric `price` and a `createdAt` date for range filters, sorting and
///   the recency boost
pub fn get_index_settings(config: &IndexConfig) -> Value {
    json!({
        "settings": {
            "number_of_shards": config.number_of_shards,
            "number_of_replicas": config.number_of_replicas
        },
        "mappings": {
            "dynamic": "strict",
            "properties": {
                (fields::ID): { "type": "keyword" },
                (fields::NAME): {
                    "type": "text",
                    "copy_to": fields::TEXT_ALL
                },
                (fields::DESCRIPTION): {
                    "type": "text",
                    "copy_to": fields::TEXT_ALL
                },
                (fields::CATEGORY): {
                    "type": "keyword",
                    "copy_to": fields::TEXT_ALL
                },
                (fields::BRAND): {
                    "type": "keyword",
                    "copy_to": fields::TEXT_ALL
                },
                (fields::TEXT_ALL): { "type": "text" },
                (fields::PRICE): { "type": "double" },
                (fields::CREATED_AT): { "type": "date" }
            }
        }
    })
}
