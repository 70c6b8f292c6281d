//! Cart Engine
//!
//! One active cart per user: add/remove/update line items, recompute totals,
//! apply/remove coupon.

mod engine;

pub use engine::{CartEngine, QuantityAction};
