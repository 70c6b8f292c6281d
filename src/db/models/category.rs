//! Category Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Time-bounded percentage offer embedded in a category.
///
/// The offer applies only while `is_active` and `start_date <= now <= end_date`.
/// A periodic sweep clears it once `end_date` has passed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryOffer {
    pub title: String,
    pub discount_percentage: f64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub is_active: bool,
}

/// Category entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Option<RecordId>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Active offer, if any (cleared by the expiry sweep)
    pub offer: Option<CategoryOffer>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryCreate {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}
