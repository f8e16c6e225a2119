//! Domain types shared by the loader, the query planner and the store client.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// A product document as persisted in the managed collection.
///
/// Field names follow the wire format: the document key is `_id` (set to
/// `productId` on write), `$vector` holds a client-side embedding and
/// `$vectorize` marks text for server-side vectorization. Both vector
/// fields are projected out of every search response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "productId")]
    pub product_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(rename = "imageUrl", default)]
    pub image_url: String,
    #[serde(rename = "$vector", default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
    #[serde(rename = "$vectorize", default, skip_serializing_if = "Option::is_none")]
    pub vectorize: Option<String>,
}

/// One `/search` call. All fields are optional; absent paging fields fall
/// back to the configured defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub min_price: Option<f64>,
    #[serde(default)]
    pub max_price: Option<f64>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub page: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub results: Vec<ProductRecord>,
    pub has_next_page: bool,
    pub current_page: u32,
}

/// Structured filter terms, AND-combined into a single filter document.
///
/// Price bounds are inclusive and independently applicable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub category: Option<String>,
    pub city: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl Filter {
    pub fn is_empty(&self) -> bool {
        self.category.is_none()
            && self.city.is_none()
            && self.min_price.is_none()
            && self.max_price.is_none()
    }

    /// The wire-format filter document, e.g.
    /// `{"category": "Electronics", "price": {"$gte": 100.0}}`.
    pub fn to_document(&self) -> Value {
        let mut doc = Map::new();
        if let Some(category) = &self.category {
            doc.insert("category".to_string(), json!(category));
        }
        if let Some(city) = &self.city {
            doc.insert("city".to_string(), json!(city));
        }
        let mut price = Map::new();
        if let Some(min) = self.min_price {
            price.insert("$gte".to_string(), json!(min));
        }
        if let Some(max) = self.max_price {
            price.insert("$lte".to_string(), json!(max));
        }
        if !price.is_empty() {
            doc.insert("price".to_string(), Value::Object(price));
        }
        Value::Object(doc)
    }
}

/// Result ordering for a collection read.
///
/// `ById` gives the deterministic order that skip-pagination needs;
/// `ByVector` and `Hybrid` delegate ranking entirely to the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Sort {
    ById,
    ByVector(Vec<f32>),
    Hybrid(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FindOptions {
    pub sort: Sort,
    pub skip: u32,
    pub limit: u32,
    pub include_vectors: bool,
}
