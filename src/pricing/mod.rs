//! Pricing / Discount Rules
//!
//! Pure functions shared by the catalog, cart and order engines:
//!
//! - [`calculator`] - effective price from base price + category offer
//! - [`coupon`] - coupon application on a cart/order total
//!
//! Category offers and coupons are independent discount layers: the offer is
//! captured into `offer_price` at catalog-write time, the coupon is applied
//! on top of the resulting total.

pub mod calculator;
pub mod coupon;

pub use calculator::{effective_price, round_money};
pub use coupon::{CouponOutcome, apply_coupon};
