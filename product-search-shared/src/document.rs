//! The normalized product record kept in the search index.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Field names as they appear in the index and in change-event payloads.
pub mod fields {
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const DESCRIPTION: &str = "description";
    pub const CATEGORY: &str = "category";
    pub const BRAND: &str = "brand";
    pub const PRICE: &str = "price";
    pub const CREATED_AT: &str = "createdAt";
    /// Catch-all text field fed by `copy_to` from the textual fields.
    pub const TEXT_ALL: &str = "text_all";
}

/// A product as stored in the search index.
///
/// `id` is the stable external product identifier and doubles as the index
/// document id, so indexing the same `id` twice overwrites. Optional fields
/// that were absent in the source payload are omitted on serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDocument {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ProductDocument {
    /// Create a document carrying only its id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            description: None,
            category: None,
            brand: None,
            price: None,
            created_at: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_absent_fields_are_omitted() {
        let doc = ProductDocument::new("p-1").with_name("Phone");

        let value = serde_json::to_value(&doc).unwrap();

        assert_eq!(value, json!({ "id": "p-1", "name": "Phone" }));
    }

    #[test]
    fn test_created_at_uses_camel_case() {
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let doc = ProductDocument::new("p-1")
            .with_price(9.5)
            .with_created_at(created);

        let value = serde_json::to_value(&doc).unwrap();

        assert_eq!(value["createdAt"], "2024-05-01T12:00:00Z");
        assert_eq!(value["price"], 9.5);
        assert!(value.get("created_at").is_none());
    }

    #[test]
    fn test_deserialize_stored_source() {
        let doc: ProductDocument = serde_json::from_value(json!({
            "id": "p-2",
            "brand": "Acme",
            "createdAt": "2024-01-02T03:04:05Z"
        }))
        .unwrap();

        assert_eq!(doc.id, "p-2");
        assert_eq!(doc.brand.as_deref(), Some("Acme"));
        assert!(doc.name.is_none());
        assert!(doc.created_at.is_some());
    }
}
