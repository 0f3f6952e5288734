//! Shared API request/response types

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

// ========================================
// Recommendation Types
// ========================================

/// Body of `POST /api/recommend`
///
/// # Examples
///
/// ```
/// use furnish_common::api::types::RecommendRequest;
///
/// let request = RecommendRequest::new("oak coffee table").with_k(8);
/// let body = serde_json::to_value(&request).unwrap();
/// assert_eq!(body["query"], "oak coffee table");
/// assert_eq!(body["k"], 8);
/// assert!(body.get("filters").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RecommendRequest {
    /// Free-text query
    pub query: String,

    /// Number of results wanted (backend default when omitted)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k: Option<u32>,

    /// Backend-defined filters, passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Map<String, Value>>,
}

impl RecommendRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            k: None,
            filters: None,
        }
    }

    pub fn with_k(mut self, k: u32) -> Self {
        self.k = Some(k);
        self
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.filters
            .get_or_insert_with(Map::new)
            .insert(key.into(), value);
        self
    }

    /// Reject requests the backend cannot answer meaningfully
    pub fn validate(&self) -> Result<()> {
        if self.query.trim().is_empty() {
            return Err(Error::InvalidInput("query is empty".to_string()));
        }
        if self.k == Some(0) {
            return Err(Error::InvalidInput("k must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// One ranked result
///
/// Only `uniq_id`, `title` and `image` matter to image resolution; the rest is
/// display data. `image` is untrusted and may be any shape.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ItemRecord {
    /// Backend id; `null` or missing reads as empty
    #[serde(default, deserialize_with = "null_as_default")]
    pub uniq_id: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,

    #[serde(default)]
    pub brand: Option<String>,

    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub price: Option<f64>,

    /// Preformatted price from the backend
    #[serde(default)]
    pub price_text: Option<String>,

    /// Raw image reference
    #[serde(default)]
    pub image: Option<String>,

    #[serde(default)]
    pub color: Option<String>,

    /// Similarity score
    #[serde(default)]
    pub score: Option<f64>,

    /// Generated description
    #[serde(default)]
    pub blurb: Option<String>,
}

impl ItemRecord {
    /// Price label: rounded rupees, else backend text, else `₹NA`
    pub fn price_label(&self) -> String {
        if let Some(price) = self.price.filter(|p| p.is_finite()) {
            return format!("₹{}", price.round() as i64);
        }
        match self.price_text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => "₹NA".to_string(),
        }
    }
}

/// Deserialize `null` the same as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Body returned by `POST /api/recommend`
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct RecommendResponse {
    #[serde(default)]
    pub items: Vec<ItemRecord>,

    /// Hint sent alongside an empty result set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ========================================
// Analytics Types
// ========================================

/// `[name, count]` pair as sent by the analytics endpoint
pub type CountEntry = (String, u64);

/// Body returned by `GET /api/analytics`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AnalyticsResponse {
    pub total_products: u64,

    pub brand_counts: Vec<CountEntry>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_counts: Option<Vec<CountEntry>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_counts: Option<Vec<CountEntry>>,
}
