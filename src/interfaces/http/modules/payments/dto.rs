//! Payment transaction DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::billing::cents_to_decimal;
use crate::domain::{PaymentTransaction, PurchaseMethod, TransactionStatus};
use crate::interfaces::http::common::ApiError;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransactionDto {
    pub id: String,
    pub user_id: String,
    pub user_phone: String,
    pub user_name: String,
    /// purchase, parking or refund
    #[serde(rename = "type")]
    pub tx_type: String,
    /// transfer, cash or card
    pub method: String,
    pub amount_cents: i64,
    pub amount: String,
    pub currency: String,
    pub minutes: i64,
    /// pending, completed, cancelled or failed
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_intent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub processed_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub status_changed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_reason: Option<String>,
}

impl From<PaymentTransaction> for TransactionDto {
    fn from(tx: PaymentTransaction) -> Self {
        let status = tx.status.as_str().to_string();
        let (status_changed_at, status_reason) = match tx.status {
            TransactionStatus::Pending => (None, None),
            TransactionStatus::Completed { completed_at } => (Some(completed_at), None),
            TransactionStatus::Cancelled {
                cancelled_at,
                reason,
            } => (Some(cancelled_at), reason),
            TransactionStatus::Failed { failed_at, reason } => (Some(failed_at), reason),
        };

        Self {
            id: tx.id,
            user_id: tx.user_id,
            user_phone: tx.user_phone,
            user_name: tx.user_name,
            tx_type: tx.tx_type.as_str().to_string(),
            method: tx.method.as_str().to_string(),
            amount_cents: tx.amount_cents,
            amount: cents_to_decimal(tx.amount_cents).to_string(),
            currency: tx.currency,
            minutes: tx.minutes,
            status,
            reference: tx.reference,
            package_id: tx.metadata.package_id,
            payment_intent_id: tx.metadata.payment_intent_id,
            note: tx.metadata.note,
            processed_by: tx.processed_by,
            created_at: tx.created_at,
            status_changed_at,
            status_reason,
        }
    }
}

/// Buy a minute package. Clients omit `user_id`.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PurchaseRequestDto {
    pub user_id: Option<String>,
    #[validate(length(min = 1))]
    pub package_id: String,
    /// transfer or cash
    pub method: String,
    /// Transfer receipt number
    #[validate(length(max = 100))]
    pub reference: Option<String>,
}

impl PurchaseRequestDto {
    pub fn purchase_method(&self) -> Result<PurchaseMethod, ApiError> {
        match PurchaseMethod::from_str(&self.method) {
            Some(PurchaseMethod::Card) => Err(ApiError::bad_request(
                "Card purchases go through /api/v1/transactions/card",
            )),
            Some(m) => Ok(m),
            None => Err(ApiError::bad_request(format!("Unknown purchase method '{}'", self.method))),
        }
    }
}

/// Register a card payment intent created with the processor
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CardPaymentRequestDto {
    pub user_id: Option<String>,
    #[validate(length(min = 1))]
    pub package_id: String,
    #[validate(length(min = 1, max = 255))]
    pub payment_intent_id: String,
    pub payment_method_id: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ReasonRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RefundRequest {
    #[validate(range(min = 1, message = "minutes must be positive"))]
    pub minutes: i64,
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}
