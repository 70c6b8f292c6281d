//! Variant Model

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use surrealdb::RecordId;

/// Concrete purchasable SKU under a product (e.g. a color/size combination)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    pub id: Option<RecordId>,
    /// Record link to the owning product
    pub product: RecordId,
    /// Unique SKU
    pub sku: String,
    pub price: f64,
    /// Discounted price captured from the active category offer
    pub offer_price: Option<f64>,
    #[serde(default)]
    pub stock: i64,
    /// Attribute map, e.g. { "color": "red", "size": "M" }
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Deserialize, validator::Validate)]
pub struct VariantCreate {
    #[validate(length(min = 1))]
    pub sku: String,
    #[validate(range(min = 0.0))]
    pub price: f64,
    #[validate(range(min = 0))]
    pub stock: i64,
    pub attributes: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Deserialize, validator::Validate)]
pub struct VariantUpdate {
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    #[validate(range(min = 0))]
    pub stock: Option<i64>,
    pub attributes: Option<BTreeMap<String, String>>,
}
