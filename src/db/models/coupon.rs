//! Coupon Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Coupon discount type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

/// Code-based discount applied to a cart at checkout, independent of
/// category offers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coupon {
    pub id: Option<RecordId>,
    pub code: String,
    pub discount_type: DiscountType,
    /// Percentage value for `Percentage`, amount for `Fixed`
    pub discount_amount: f64,
    #[serde(default)]
    pub min_purchase: f64,
    pub max_discount: f64,
    pub expiry_date: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, validator::Validate)]
pub struct CouponCreate {
    #[validate(length(min = 1))]
    pub code: String,
    pub discount_type: DiscountType,
    #[validate(range(min = 0.0))]
    pub discount_amount: f64,
    #[validate(range(min = 0.0))]
    pub min_purchase: Option<f64>,
    #[validate(range(min = 0.0))]
    pub max_discount: f64,
    pub expiry_date: DateTime<Utc>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CouponUpdate {
    pub code: Option<String>,
    pub discount_type: Option<DiscountType>,
    pub discount_amount: Option<f64>,
    pub min_purchase: Option<f64>,
    pub max_discount: Option<f64>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub description: Option<String>,
}
