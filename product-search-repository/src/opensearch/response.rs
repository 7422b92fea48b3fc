//! Parsing of OpenSearch `_search` responses.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::errors::SearchError;
use product_search_shared::{FacetBucket, FacetField, ProductDocument, StoreSearchResponse};

#[derive(Debug, Deserialize)]
struct RawSearchResponse {
    hits: RawHits,
    #[serde(default)]
    aggregations: BTreeMap<String, RawAggregation>,
}

#[derive(Debug, Deserialize)]
struct RawHits {
    total: RawTotal,
    #[serde(default)]
    hits: Vec<RawHit>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTotal {
    Object { value: u64 },
    Count(u64),
}

#[derive(Debug, Deserialize)]
struct RawHit {
    #[serde(rename = "_source")]
    source: ProductDocument,
}

#[derive(Debug, Deserialize)]
struct RawAggregation {
    #[serde(default)]
    buckets: Vec<RawBucket>,
}

#[derive(Debug, Deserialize)]
struct RawBucket {
    key: Value,
    doc_count: u64,
}

/// Parse a `_search` response body into documents, total and facet counts.
///
/// Hits keep the order the store returned them in. A hit whose `_source`
/// does not decode as a product fails the whole response rather than
/// silently shortening the page.
pub fn parse_search_response(body: Value) -> Result<StoreSearchResponse, SearchError> {
    let raw: RawSearchResponse = serde_json::from_value(body)
        .map_err(|e| SearchError::parse(format!("Invalid search response: {}", e)))?;

    let total_matches = match raw.hits.total {
        RawTotal::Object { value } => value,
        RawTotal::Count(count) => count,
    };

    let documents = raw.hits.hits.into_iter().map(|hit| hit.source).collect();

    let facets = raw
        .aggregations
        .into_iter()
        .map(|(field, aggregation)| FacetField {
            field,
            buckets: aggregation
                .buckets
                .into_iter()
                .map(|bucket| FacetBucket::new(bucket_key(bucket.key), bucket.doc_count))
                .collect(),
        })
        .collect();

    Ok(StoreSearchResponse {
        documents,
        total_matches,
        facets,
    })
}

fn bucket_key(key: Value) -> String {
    match key {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_response() {
        let body = json!({
            "took": 3,
            "hits": {
                "total": { "value": 42, "relation": "eq" },
                "hits": [
                    {
                        "_id": "p-2",
                        "_score": 4.2,
                        "_source": { "id": "p-2", "name": "iPhone 15", "price": 999.0 }
                    },
                    {
                        "_id": "p-1",
                        "_score": 1.1,
                        "_source": { "id": "p-1", "description": "case for iphone" }
                    }
                ]
            },
            "aggregations": {
                "category": {
                    "doc_count_error_upper_bound": 0,
                    "sum_other_doc_count": 0,
                    "buckets": [
                        { "key": "phones", "doc_count": 30 },
                        { "key": "accessories", "doc_count": 12 }
                    ]
                },
                "brand": { "buckets": [] },
                "price": {
                    "buckets": [
                        { "key": "0-100", "from": 0.0, "to": 100.0, "doc_count": 12 },
                        { "key": "900-*", "from": 900.0, "doc_count": 30 }
                    ]
                }
            }
        });

        let response = parse_search_response(body).unwrap();

        assert_eq!(response.total_matches, 42);
        assert_eq!(response.documents.len(), 2);
        assert_eq!(response.documents[0].id, "p-2");
        assert_eq!(response.documents[1].id, "p-1");
        assert_eq!(response.documents[0].price, Some(999.0));

        let category = response
            .facets
            .iter()
            .find(|f| f.field == "category")
            .unwrap();
        assert_eq!(category.buckets[0], FacetBucket::new("phones", 30));

        let brand = response.facets.iter().find(|f| f.field == "brand").unwrap();
        assert!(brand.buckets.is_empty());

        let price = response.facets.iter().find(|f| f.field == "price").unwrap();
        assert_eq!(price.buckets[1], FacetBucket::new("900-*", 30));
    }

    #[test]
    fn test_parse_without_aggregations() {
        let body = json!({
            "hits": { "total": { "value": 0, "relation": "eq" }, "hits": [] }
        });

        let response = parse_search_response(body).unwrap();

        assert_eq!(response, StoreSearchResponse::empty());
    }

    #[test]
    fn test_parse_numeric_total_and_keys() {
        let body = json!({
            "hits": { "total": 3, "hits": [] },
            "aggregations": {
                "brand": { "buckets": [{ "key": 7, "doc_count": 3 }] }
            }
        });

        let response = parse_search_response(body).unwrap();

        assert_eq!(response.total_matches, 3);
        assert_eq!(response.facets[0].buckets[0].value, "7");
    }

    #[test]
    fn test_undecodable_source_is_an_error() {
        let body = json!({
            "hits": {
                "total": { "value": 1 },
                "hits": [{ "_source": { "name": "missing id" } }]
            }
        });

        let err = parse_search_response(body).unwrap_err();
        assert!(matches!(err, SearchError::ParseError(_)));
    }

    #[test]
    fn test_missing_hits_is_an_error() {
        let err = parse_search_response(json!({ "error": "boom" })).unwrap_err();
        assert!(!err.is_transient());
    }
}
