//! Coupon Application
//!
//! Second, independent discount layer on top of a cart/order total.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;

use super::calculator::round_money;
use crate::db::models::{Coupon, DiscountType};
use crate::utils::AppError;

/// Result of applying a coupon to an amount
#[derive(Debug, Clone, PartialEq)]
pub struct CouponOutcome {
    pub original_amount: f64,
    pub discount_amount: f64,
    pub final_amount: f64,
}

/// Apply a coupon to `original_amount`.
///
/// Fails with `CouponNotApplicable` when the coupon is past its expiry date
/// or the amount is below `min_purchase`. The discount is capped at
/// `max_discount`; the final amount never goes below zero.
pub fn apply_coupon(
    original_amount: f64,
    coupon: &Coupon,
    now: DateTime<Utc>,
) -> Result<CouponOutcome, AppError> {
    if now > coupon.expiry_date {
        return Err(AppError::CouponNotApplicable(format!(
            "coupon {} has expired",
            coupon.code
        )));
    }
    if original_amount < coupon.min_purchase {
        return Err(AppError::CouponNotApplicable(format!(
            "minimum purchase of {:.2} not met",
            coupon.min_purchase
        )));
    }

    let original = Decimal::from_f64(original_amount).unwrap_or_default();
    let amount = Decimal::from_f64(coupon.discount_amount).unwrap_or_default();
    let cap = Decimal::from_f64(coupon.max_discount).unwrap_or_default();

    let raw_discount = match coupon.discount_type {
        DiscountType::Percentage => original * amount / Decimal::ONE_HUNDRED,
        DiscountType::Fixed => amount,
    };
    let discount = raw_discount.min(cap);
    let final_amount = (original - discount).max(Decimal::ZERO);

    Ok(CouponOutcome {
        original_amount: round_money(original_amount),
        discount_amount: round_money(discount.to_f64().unwrap_or_default()),
        final_amount: round_money(final_amount.to_f64().unwrap_or_default()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn coupon(kind: DiscountType, amount: f64, min: f64, max: f64) -> Coupon {
        Coupon {
            id: None,
            code: "SAVE10".to_string(),
            discount_type: kind,
            discount_amount: amount,
            min_purchase: min,
            max_discount: max,
            expiry_date: Utc::now() + Duration::days(7),
            description: String::new(),
            created_at: None,
        }
    }

    #[test]
    fn percentage_discount_capped_at_max() {
        // 10% of 1000 = 100, capped at 80 -> final 920
        let c = coupon(DiscountType::Percentage, 10.0, 0.0, 80.0);
        let outcome = apply_coupon(1000.0, &c, Utc::now()).unwrap();
        assert_eq!(outcome.discount_amount, 80.0);
        assert_eq!(outcome.final_amount, 920.0);
    }

    #[test]
    fn percentage_discount_under_cap() {
        let c = coupon(DiscountType::Percentage, 10.0, 0.0, 200.0);
        let outcome = apply_coupon(500.0, &c, Utc::now()).unwrap();
        assert_eq!(outcome.discount_amount, 50.0);
        assert_eq!(outcome.final_amount, 450.0);
    }

    #[test]
    fn fixed_discount_capped_at_max() {
        let c = coupon(DiscountType::Fixed, 120.0, 0.0, 100.0);
        let outcome = apply_coupon(300.0, &c, Utc::now()).unwrap();
        assert_eq!(outcome.discount_amount, 100.0);
        assert_eq!(outcome.final_amount, 200.0);
    }

    #[test]
    fn below_min_purchase_rejected() {
        let c = coupon(DiscountType::Percentage, 10.0, 500.0, 80.0);
        let err = apply_coupon(499.99, &c, Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::CouponNotApplicable(_)));
    }

    #[test]
    fn expired_coupon_rejected() {
        let mut c = coupon(DiscountType::Fixed, 10.0, 0.0, 10.0);
        c.expiry_date = Utc::now() - Duration::days(1);
        let err = apply_coupon(100.0, &c, Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::CouponNotApplicable(_)));
    }

    #[test]
    fn final_amount_never_negative() {
        let c = coupon(DiscountType::Fixed, 50.0, 0.0, 50.0);
        let outcome = apply_coupon(30.0, &c, Utc::now()).unwrap();
        assert_eq!(outcome.final_amount, 0.0);
    }
}
