//! Minute package domain entity

use chrono::{DateTime, Utc};

use crate::domain::billing::format_cents;
use crate::domain::DomainResult;
use crate::shared::DomainError;

/// A purchasable bundle of parking minutes at a fixed price
#[derive(Debug, Clone)]
pub struct MinutePackage {
    pub id: String,
    pub name: String,
    pub minutes: i64,
    /// Price in smallest currency unit
    pub price_cents: i64,
    /// Currency code (ISO 4217)
    pub currency: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MinutePackage {
    pub fn new(
        name: impl Into<String>,
        minutes: i64,
        price_cents: i64,
        currency: impl Into<String>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::Validation("package name must not be empty".into()));
        }
        if minutes <= 0 {
            return Err(DomainError::Validation("package minutes must be positive".into()));
        }
        if price_cents < 0 {
            return Err(DomainError::Validation("package price must not be negative".into()));
        }

        let now = Utc::now();
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            minutes,
            price_cents,
            currency: currency.into(),
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn format_price(&self) -> String {
        format_cents(self.price_cents, &self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_package() {
        let p = MinutePackage::new("1 hour", 60, 5000, "HNL").unwrap();
        assert!(p.is_active);
        assert_eq!(p.format_price(), "50.00 HNL");
    }

    #[test]
    fn zero_minutes_rejected() {
        assert!(matches!(
            MinutePackage::new("empty", 0, 100, "HNL"),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn negative_price_rejected() {
        assert!(MinutePackage::new("bad", 30, -1, "HNL").is_err());
    }
}
