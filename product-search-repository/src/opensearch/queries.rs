//! OpenSearch query builders.
//!
//! This module translates a validated `SearchRequest` into the OpenSearch
//! query DSL. The translation is deterministic: the same request and config
//! always produce the same body.

use serde_json::{json, Map, Value};

use crate::config::QueryConfig;
use product_search_shared::{fields, SearchRequest, SortMode};

/// Field weights for the free-text clause. Product name outranks
/// description, and the catch-all field carries no extra weight.
const NAME_BOOST: u32 = 3;
const DESCRIPTION_BOOST: u32 = 2;

/// Build the complete `_search` body for a request.
///
/// The body contains:
/// - Pagination (`from = page * size`, `size`) and an exact total count
/// - A `bool` query with the weighted text clause in `must` and the
///   category, brand and price filters in `filter`
/// - A recency boost when ranking by relevance, or a single `sort` clause
///   when an explicit sort replaces ranking
/// - Aggregations for the category, brand and price facets
pub fn build_search_query(request: &SearchRequest, config: &QueryConfig) -> Value {
    let bool_query = build_bool_query(request);

    let mut body = Map::new();
    body.insert("from".to_string(), json!(request.start()));
    body.insert("size".to_string(), json!(request.rows()));
    body.insert("track_total_hits".to_string(), json!(true));

    match sort_clause(request.sort) {
        None => {
            body.insert("query".to_string(), with_recency_boost(bool_query, config));
        }
        Some(sort) => {
            body.insert("query".to_string(), bool_query);
            body.insert("sort".to_string(), sort);
        }
    }

    body.insert("aggs".to_string(), build_facet_aggregations(config));
    Value::Object(body)
}

/// Build the weighted free-text clause.
fn build_text_query(query_text: &str) -> Value {
    json!({
        "multi_match": {
            "query": query_text,
            "type": "best_fields",
            "fields": [
                format!("{}^{}", fields::NAME, NAME_BOOST),
                format!("{}^{}", fields::DESCRIPTION, DESCRIPTION_BOOST),
                fields::TEXT_ALL
            ]
        }
    })
}

/// Build the exact-match and range filters. All filters are AND-combined.
fn build_filters(request: &SearchRequest) -> Vec<Value> {
    let mut filters = Vec::new();

    if let Some(category) = &request.category {
        filters.push(json!({ "term": { (fields::CATEGORY): category } }));
    }
    if let Some(brand) = &request.brand {
        filters.push(json!({ "term": { (fields::BRAND): brand } }));
    }
    if request.has_price_range() {
        // An absent bound is left out of the range, leaving that side open.
        let mut range = Map::new();
        if let Some(min) = request.min_price {
            range.insert("gte".to_string(), json!(min));
        }
        if let Some(max) = request.max_price {
            range.insert("lte".to_string(), json!(max));
        }
        filters.push(json!({ "range": { (fields::PRICE): range } }));
    }

    filters
}

fn build_bool_query(request: &SearchRequest) -> Value {
    json!({
        "bool": {
            "must": [build_text_query(&request.q)],
            "filter": build_filters(request)
        }
    })
}

/// Wrap a query so newer documents score higher at equal text relevance.
///
/// The constant `weight: 1` plus a gaussian decay on `createdAt` yields a
/// multiplier in [1, 2]: age only ever scales the text score down towards
/// its plain value and never suppresses a match. The decay only applies to
/// documents that have `createdAt`; undated documents keep the plain score.
fn with_recency_boost(query: Value, config: &QueryConfig) -> Value {
    json!({
        "function_score": {
            "query": query,
            "functions": [
                { "weight": 1 },
                {
                    "filter": { "exists": { "field": fields::CREATED_AT } },
                    "gauss": {
                        (fields::CREATED_AT): {
                            "origin": "now",
                            "scale": config.recency_scale,
                            "offset": config.recency_offset,
                            "decay": config.recency_decay
                        }
                    }
                }
            ],
            "score_mode": "sum",
            "boost_mode": "multiply"
        }
    })
}

/// The sort clause for explicit sort modes. `None` means rank by score.
fn sort_clause(sort: SortMode) -> Option<Value> {
    match sort {
        SortMode::Relevance => None,
        SortMode::PriceAsc => Some(json!([{ (fields::PRICE): { "order": "asc" } }])),
        SortMode::PriceDesc => Some(json!([{ (fields::PRICE): { "order": "desc" } }])),
        SortMode::Newest => Some(json!([{ (fields::CREATED_AT): { "order": "desc" } }])),
    }
}

/// Build the facet aggregations. Aggregations run over every document that
/// matches the query and filters, independent of `from`/`size`.
fn build_facet_aggregations(config: &QueryConfig) -> Value {
    let ranges: Vec<Value> = config
        .price_ranges()
        .into_iter()
        .map(|range| {
            let mut bucket = Map::new();
            bucket.insert("key".to_string(), json!(range.key));
            bucket.insert("from".to_string(), json!(range.from));
            if let Some(to) = range.to {
                bucket.insert("to".to_string(), json!(to));
            }
            Value::Object(bucket)
        })
        .collect();

    json!({
        (fields::CATEGORY): {
            "terms": { "field": fields::CATEGORY, "size": config.facet_size }
        },
        (fields::BRAND): {
            "terms": { "field": fields::BRAND, "size": config.facet_size }
        },
        (fields::PRICE): {
            "range": { "field": fields::PRICE, "ranges": ranges }
        }
    })
}
