//! Maps change-event payloads onto product documents.
//!
//! Mapping is a pure function of the payload so it can be exercised against
//! literal fixtures without a broker or a store.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

use product_search_shared::{fields, ProductDocument};

/// A payload that cannot become a product document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MappingError {
    #[error("payload has no usable id")]
    MissingId,

    #[error("field '{field}' must be {expected}")]
    InvalidType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("price is not numeric: {0}")]
    InvalidPrice(String),

    #[error("createdAt is not a valid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Build a [`ProductDocument`] from an event payload.
///
/// `id` must be a non-blank string. Textual fields are taken as strings
/// without coercion, `price` may be a JSON number or a numeric string, and
/// `createdAt` may be an RFC 3339 string or epoch milliseconds. Absent and
/// `null` fields are left out of the document.
pub fn map_payload(payload: &Map<String, Value>) -> Result<ProductDocument, MappingError> {
    let id = match payload.get(fields::ID) {
        Some(Value::String(id)) if !id.trim().is_empty() => id.clone(),
        _ => return Err(MappingError::MissingId),
    };

    Ok(ProductDocument {
        id,
        name: string_field(payload, fields::NAME)?,
        description: string_field(payload, fields::DESCRIPTION)?,
        category: string_field(payload, fields::CATEGORY)?,
        brand: string_field(payload, fields::BRAND)?,
        price: price_field(payload)?,
        created_at: timestamp_field(payload)?,
    })
}

fn present<'a>(payload: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    payload.get(field).filter(|value| !value.is_null())
}

fn string_field(
    payload: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, MappingError> {
    match present(payload, field) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(MappingError::InvalidType {
            field,
            expected: "a string",
        }),
    }
}

fn price_field(payload: &Map<String, Value>) -> Result<Option<f64>, MappingError> {
    let value = match present(payload, fields::PRICE) {
        None => return Ok(None),
        Some(value) => value,
    };

    let price = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match price {
        Some(p) if p.is_finite() => Ok(Some(p)),
        _ => Err(MappingError::InvalidPrice(value.to_string())),
    }
}

fn timestamp_field(payload: &Map<String, Value>) -> Result<Option<DateTime<Utc>>, MappingError> {
    let value = match present(payload, fields::CREATED_AT) {
        None => return Ok(None),
        Some(value) => value,
    };

    let parsed = match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    };

    parsed
        .map(Some)
        .ok_or_else(|| MappingError::InvalidTimestamp(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn test_full_payload() {
        let doc = map_payload(&payload(json!({
            "id": "p-1",
            "name": "Wireless Mouse",
            "description": "Ergonomic",
            "category": "electronics",
            "brand": "Acme",
            "price": 24.99,
            "createdAt": "2024-03-01T10:00:00Z"
        })))
        .unwrap();

        assert_eq!(doc.id, "p-1");
        assert_eq!(doc.name.as_deref(), Some("Wireless Mouse"));
        assert_eq!(doc.category.as_deref(), Some("electronics"));
        assert_eq!(doc.brand.as_deref(), Some("Acme"));
        assert_eq!(doc.price, Some(24.99));
        assert_eq!(
            doc.created_at,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_only_id_leaves_everything_else_absent() {
        let doc = map_payload(&payload(json!({ "id": "p-2" }))).unwrap();

        assert_eq!(doc, ProductDocument::new("p-2"));
    }

    #[test]
    fn test_null_fields_are_absent() {
        let doc = map_payload(&payload(json!({
            "id": "p-3",
            "name": null,
            "price": null
        })))
        .unwrap();

        assert_eq!(doc.name, None);
        assert_eq!(doc.price, None);
    }

    #[test]
    fn test_missing_id() {
        let result = map_payload(&payload(json!({ "name": "Orphan" })));
        assert_eq!(result, Err(MappingError::MissingId));
    }

    #[test]
    fn test_blank_id() {
        let result = map_payload(&payload(json!({ "id": "  " })));
        assert_eq!(result, Err(MappingError::MissingId));
    }

    #[test]
    fn test_non_string_id() {
        let result = map_payload(&payload(json!({ "id": 42 })));
        assert_eq!(result, Err(MappingError::MissingId));
    }

    #[test]
    fn test_numeric_string_price() {
        let doc = map_payload(&payload(json!({ "id": "p-4", "price": "19.50" }))).unwrap();
        assert_eq!(doc.price, Some(19.5));
    }

    #[test]
    fn test_non_numeric_price() {
        let result = map_payload(&payload(json!({ "id": "p-5", "price": "cheap" })));
        assert!(matches!(result, Err(MappingError::InvalidPrice(_))));

        let result = map_payload(&payload(json!({ "id": "p-5", "price": true })));
        assert!(matches!(result, Err(MappingError::InvalidPrice(_))));
    }

    #[test]
    fn test_text_field_is_not_coerced() {
        let result = map_payload(&payload(json!({ "id": "p-6", "category": 7 })));
        assert_eq!(
            result,
            Err(MappingError::InvalidType {
                field: "category",
                expected: "a string"
            })
        );
    }

    #[test]
    fn test_epoch_millis_created_at() {
        let doc = map_payload(&payload(json!({ "id": "p-7", "createdAt": 1_700_000_000_000i64 })))
            .unwrap();

        assert_eq!(
            doc.created_at,
            Some(Utc.timestamp_millis_opt(1_700_000_000_000).unwrap())
        );
    }

    #[test]
    fn test_invalid_created_at() {
        let result = map_payload(&payload(json!({ "id": "p-8", "createdAt": "yesterday" })));
        assert!(matches!(result, Err(MappingError::InvalidTimestamp(_))));
    }
}
