//! Raw store output and the public search result contract.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::document::{fields, ProductDocument};
use crate::request::SearchRequest;

/// Facet fields every search result carries, even when they have no values.
pub const FACET_FIELDS: [&str; 3] = [fields::CATEGORY, fields::BRAND, fields::PRICE];

/// A single facet value and the number of matching documents carrying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetBucket {
    pub value: String,
    pub count: u64,
}

impl FacetBucket {
    pub fn new(value: impl Into<String>, count: u64) -> Self {
        Self {
            value: value.into(),
            count,
        }
    }
}

/// The value/count pairs the store returned for one facet field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetField {
    pub field: String,
    pub buckets: Vec<FacetBucket>,
}

/// What the document store returns for a query, before shaping.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSearchResponse {
    /// Documents of the requested page, in store order.
    pub documents: Vec<ProductDocument>,
    /// Total number of matches across all pages.
    pub total_matches: u64,
    /// Facet counts computed over all matches.
    pub facets: Vec<FacetField>,
}

impl StoreSearchResponse {
    /// A response with no matches and no facets.
    pub fn empty() -> Self {
        Self {
            documents: Vec::new(),
            total_matches: 0,
            facets: Vec::new(),
        }
    }
}

/// The public response body of `GET /api/search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub total: u64,
    pub page: u32,
    pub size: u32,
    pub items: Vec<ProductDocument>,
    pub facets: BTreeMap<String, IndexMap<String, u64>>,
}

impl SearchResult {
    /// Shape raw store output into the public contract.
    ///
    /// `total` is the store's match count, not the page length. Item order is
    /// kept exactly as returned. Every field in [`FACET_FIELDS`] is present,
    /// with an empty map when the store reported no values for it.
    ///
    /// Term facets are ordered by value. Price buckets keep the store's
    /// order, which runs from the cheapest range up.
    pub fn shape(request: &SearchRequest, raw: StoreSearchResponse) -> Self {
        let mut facets: BTreeMap<String, IndexMap<String, u64>> = FACET_FIELDS
            .iter()
            .map(|field| (field.to_string(), IndexMap::new()))
            .collect();

        for facet in raw.facets {
            let counts = facets.entry(facet.field).or_default();
            for bucket in facet.buckets {
                *counts.entry(bucket.value).or_insert(0) += bucket.count;
            }
        }

        for (field, counts) in facets.iter_mut() {
            if field != fields::PRICE {
                counts.sort_keys();
            }
        }

        Self {
            total: raw.total_matches,
            page: request.page,
            size: request.size,
            items: raw.documents,
            facets,
        }
    }
}
