//! Cart Model
//!
//! One cart per user (unique index on `user`). Line items are identified by
//! the composite key `(product, variant|None)`; prices on a line item are a
//! snapshot captured at add-time.

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::coupon::DiscountType;
use super::product::Product;
use super::variant::Variant;

/// A single cart line item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub product: RecordId,
    pub variant: Option<RecordId>,
    pub quantity: i64,
    /// Base price captured at add-time
    pub price: f64,
    /// Offer price captured at add-time, if one was active
    pub offer_price: Option<f64>,
}

impl CartItem {
    /// The price actually charged: offer price if present, else base price
    pub fn effective_price(&self) -> f64 {
        self.offer_price.unwrap_or(self.price)
    }

    /// Composite-key match on `(product, variant|None)`
    pub fn matches(&self, product: &RecordId, variant: Option<&RecordId>) -> bool {
        self.product == *product && self.variant.as_ref() == variant
    }
}

/// Immutable coupon snapshot stored on the cart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponApplied {
    pub coupon: RecordId,
    pub code: String,
    pub discount_type: DiscountType,
    pub original_amount: f64,
    pub discount_amount: f64,
    pub final_amount: f64,
}

/// Cart entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub id: Option<RecordId>,
    pub user: RecordId,
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub total_price: f64,
    pub coupon_applied: Option<CouponApplied>,
    /// Optimistic concurrency stamp, bumped on every save
    #[serde(default)]
    pub version: i64,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Cart {
    /// Sum of item quantities
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

/// Cart line item with its catalog references resolved (read-only join)
#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    pub product: Option<Product>,
    pub variant: Option<Variant>,
    pub quantity: i64,
    pub price: f64,
    pub offer_price: Option<f64>,
    /// quantity × (offer_price ?? price)
    pub item_total: f64,
}

/// Cart as returned by GetCart
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub id: Option<RecordId>,
    pub user: RecordId,
    pub items: Vec<CartItemView>,
    pub total_price: f64,
    pub total_quantity: i64,
    pub coupon_applied: Option<CouponApplied>,
    /// Coupon final amount when a coupon is applied, else `total_price`
    pub final_amount: f64,
}
