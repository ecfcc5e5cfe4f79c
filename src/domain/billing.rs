//! Parking rate and money helpers
//!
//! Money is kept in the smallest currency unit (`i64` cents). The per-minute
//! rate is the single conversion between prepaid minutes and money.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

const MILLIS_PER_MINUTE: i64 = 60_000;

/// Per-minute parking price
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParkingRate {
    /// Price per started minute in smallest currency unit
    pub price_per_minute_cents: i64,
    /// Currency code (ISO 4217)
    pub currency: String,
}

impl Default for ParkingRate {
    fn default() -> Self {
        Self {
            price_per_minute_cents: 100,
            currency: "HNL".to_string(),
        }
    }
}

impl ParkingRate {
    pub fn new(price_per_minute_cents: i64, currency: impl Into<String>) -> Self {
        Self {
            price_per_minute_cents,
            currency: currency.into(),
        }
    }

    /// Cost of `minutes` of parking
    pub fn cost_cents(&self, minutes: i64) -> i64 {
        minutes.max(0) * self.price_per_minute_cents
    }

    pub fn format(&self, cents: i64) -> String {
        format_cents(cents, &self.currency)
    }
}

/// Minutes between `start` and `end`, every started minute counted.
/// An `end` before `start` (clock skew) bills zero.
pub fn billable_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let millis = (end - start).num_milliseconds();
    if millis <= 0 {
        0
    } else {
        (millis + MILLIS_PER_MINUTE - 1) / MILLIS_PER_MINUTE
    }
}

/// Cents as a two-decimal amount, for API output
pub fn cents_to_decimal(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

pub fn format_cents(cents: i64, currency: &str) -> String {
    format!("{} {}", cents_to_decimal(cents), currency)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn whole_minutes() {
        let t0 = Utc::now();
        assert_eq!(billable_minutes(t0, t0 + Duration::minutes(30)), 30);
    }

    #[test]
    fn partial_minute_rounds_up() {
        let t0 = Utc::now();
        assert_eq!(billable_minutes(t0, t0 + Duration::seconds(61)), 2);
        assert_eq!(billable_minutes(t0, t0 + Duration::milliseconds(1)), 1);
    }

    #[test]
    fn zero_and_negative_durations_bill_nothing() {
        let t0 = Utc::now();
        assert_eq!(billable_minutes(t0, t0), 0);
        assert_eq!(billable_minutes(t0, t0 - Duration::minutes(5)), 0);
    }

    #[test]
    fn cost_uses_rate() {
        let rate = ParkingRate::new(150, "HNL");
        assert_eq!(rate.cost_cents(30), 4500);
        assert_eq!(rate.format(4500), "45.00 HNL");
        assert_eq!(rate.cost_cents(-3), 0);
    }

    #[test]
    fn decimal_rendering() {
        assert_eq!(cents_to_decimal(1999).to_string(), "19.99");
        assert_eq!(format_cents(5, "USD"), "0.05 USD");
    }
}
