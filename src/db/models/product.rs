//! Product Model

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

pub type ProductId = RecordId;

/// Product entity
///
/// `price`/`offer_price`/`stock` are authoritative only for products without
/// variants; once variants exist, each variant carries its own.
/// `offer_price` is captured from the category offer at catalog-write time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Option<ProductId>,
    pub name: String,
    /// Unique product code
    pub code: String,
    #[serde(default)]
    pub description: String,
    /// Record link to category
    pub category: RecordId,
    /// Record link to brand
    pub brand: Option<RecordId>,
    /// Base price, always stored
    pub price: f64,
    /// Discounted price captured from the active category offer
    pub offer_price: Option<f64>,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub has_variants: bool,
    #[serde(default)]
    pub is_deleted: bool,
    pub deleted_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Deserialize, validator::Validate)]
pub struct ProductCreate {
    #[validate(length(min = 3))]
    pub name: String,
    #[validate(length(min = 1))]
    pub code: String,
    pub description: Option<String>,
    pub category: RecordId,
    pub brand: Option<RecordId>,
    #[validate(range(min = 0.0))]
    pub price: f64,
    #[validate(range(min = 0))]
    pub stock: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, validator::Validate)]
pub struct ProductUpdate {
    #[validate(length(min = 3))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<RecordId>,
    pub brand: Option<RecordId>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    #[validate(range(min = 0))]
    pub stock: Option<i64>,
}
