use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::domain::billing::cents_to_decimal;
use crate::domain::MinutePackage;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PackageDto {
    pub id: String,
    pub name: String,
    pub minutes: i64,
    pub price_cents: i64,
    pub price: String,
    pub currency: String,
    pub is_active: bool,
}

impl From<MinutePackage> for PackageDto {
    fn from(p: MinutePackage) -> Self {
        Self {
            price: cents_to_decimal(p.price_cents).to_string(),
            id: p.id,
            name: p.name,
            minutes: p.minutes,
            price_cents: p.price_cents,
            currency: p.currency,
            is_active: p.is_active,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePackageRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(range(min = 1, message = "minutes must be positive"))]
    pub minutes: i64,
    #[validate(range(min = 0, message = "price must not be negative"))]
    pub price_cents: i64,
    /// Defaults to the configured billing currency
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListPackagesParams {
    /// Include deactivated packages (admin only)
    #[serde(default)]
    pub include_inactive: bool,
}
