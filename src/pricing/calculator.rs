//! Effective Price Calculator
//!
//! Uses rust_decimal for precise calculations, stores as f64.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;

use crate::db::models::CategoryOffer;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Convert f64 to Decimal for calculation
#[inline]
fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Round a monetary amount to 2 decimal places, half-up
pub fn round_money(value: f64) -> f64 {
    to_f64(to_decimal(value))
}

/// Whether the offer applies at `now`
fn offer_in_effect(offer: &CategoryOffer, now: DateTime<Utc>) -> bool {
    offer.is_active && offer.start_date <= now && now <= offer.end_date
}

/// Compute the effective price for a base price under an optional category
/// offer.
///
/// If the offer is active and `now` is within its window:
/// `base - base * discount_percentage / 100`, rounded to 2 decimal places.
/// Otherwise the base price is returned unchanged. The result is captured
/// into `offer_price` at catalog-write time; it is never recomputed when the
/// window lapses (the expiry sweep reconciles that asynchronously), so the
/// caller must tolerate the offer disappearing between reads.
pub fn effective_price(base_price: f64, offer: Option<&CategoryOffer>, now: DateTime<Utc>) -> f64 {
    let Some(offer) = offer else {
        return base_price;
    };
    if !offer_in_effect(offer, now) {
        return base_price;
    }

    let base = to_decimal(base_price);
    let pct = to_decimal(offer.discount_percentage);
    let discounted = base - base * pct / Decimal::ONE_HUNDRED;

    to_f64(discounted.max(Decimal::ZERO))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn offer(pct: f64, start: DateTime<Utc>, end: DateTime<Utc>, active: bool) -> CategoryOffer {
        CategoryOffer {
            title: "seasonal".to_string(),
            discount_percentage: pct,
            start_date: start,
            end_date: end,
            is_active: active,
        }
    }

    #[test]
    fn active_offer_in_range_discounts() {
        let now = Utc::now();
        let o = offer(15.0, now - Duration::days(1), now + Duration::days(1), true);
        assert_eq!(effective_price(200.0, Some(&o), now), 170.00);
    }

    #[test]
    fn offer_outside_window_is_ignored() {
        let now = Utc::now();
        let past = offer(15.0, now - Duration::days(10), now - Duration::days(5), true);
        let future = offer(15.0, now + Duration::days(5), now + Duration::days(10), true);
        assert_eq!(effective_price(200.0, Some(&past), now), 200.0);
        assert_eq!(effective_price(200.0, Some(&future), now), 200.0);
    }

    #[test]
    fn inactive_offer_is_ignored() {
        let now = Utc::now();
        let o = offer(15.0, now - Duration::days(1), now + Duration::days(1), false);
        assert_eq!(effective_price(200.0, Some(&o), now), 200.0);
    }

    #[test]
    fn no_offer_returns_base() {
        assert_eq!(effective_price(49.99, None, Utc::now()), 49.99);
    }

    #[test]
    fn discount_rounds_to_two_places() {
        let now = Utc::now();
        // 33.33% of 9.99 -> 6.6603...
        let o = offer(33.33, now - Duration::days(1), now + Duration::days(1), true);
        assert_eq!(effective_price(9.99, Some(&o), now), 6.66);
    }
}
