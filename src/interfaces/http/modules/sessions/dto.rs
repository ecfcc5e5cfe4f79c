//! Session DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::services::{CostPreview, ScanOutcome};
use crate::domain::billing::cents_to_decimal;
use crate::domain::{ParkingSession, PaymentMethod, SessionState};
use crate::interfaces::http::common::ApiError;

/// Session API representation
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionDto {
    pub id: String,
    pub user_id: String,
    pub user_phone: String,
    pub user_name: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spot_id: Option<String>,
    pub qr_code: String,
    /// active, completed or cancelled
    pub status: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i64>,
    pub cost_cents: Option<i64>,
    /// Cost as a two-decimal amount
    pub cost: Option<String>,
    pub payment_method: Option<String>,
    pub guard_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
}

impl From<ParkingSession> for SessionDto {
    fn from(s: ParkingSession) -> Self {
        let status = s.state.as_str().to_string();
        let end_time = s.ended_at();
        let (bill, cancel_reason) = match s.state {
            SessionState::Active => (None, None),
            SessionState::Completed(bill) => (Some(bill), None),
            SessionState::Cancelled { reason, .. } => (None, reason),
        };

        Self {
            id: s.id,
            user_id: s.user_id,
            user_phone: s.user_phone,
            user_name: s.user_name,
            location: s.location,
            spot_id: s.spot_id,
            qr_code: s.qr_code,
            status,
            start_time: s.started_at,
            end_time,
            duration_minutes: bill.as_ref().map(|b| b.duration_minutes),
            cost_cents: bill.as_ref().map(|b| b.cost_cents),
            cost: bill.as_ref().map(|b| cents_to_decimal(b.cost_cents).to_string()),
            payment_method: bill.as_ref().map(|b| b.payment_method.as_str().to_string()),
            guard_id: bill.and_then(|b| b.guard_id),
            cancel_reason,
        }
    }
}

/// Open a session. Clients omit `user_id`; staff open for any user.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct StartSessionRequest {
    pub user_id: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub location: String,
    pub spot_id: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct EndSessionRequest {
    /// balance (default), cash or transfer
    pub payment_method: Option<String>,
}

impl EndSessionRequest {
    pub fn payment_method(&self) -> Result<PaymentMethod, ApiError> {
        match self.payment_method.as_deref() {
            None => Ok(PaymentMethod::Balance),
            Some(m) => PaymentMethod::from_str(m)
                .ok_or_else(|| ApiError::bad_request(format!("Unknown payment method '{}'", m))),
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CancelSessionRequest {
    pub reason: Option<String>,
}

/// Guard scan of a user QR code
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ScanRequest {
    /// `PARKING_USER_{phone}`
    #[validate(length(min = 1))]
    pub qr_code: String,
    #[validate(length(min = 1, max = 200))]
    pub location: String,
    pub spot_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ScanResponse {
    /// `started` or `ended`
    pub action: String,
    pub session: SessionDto,
}

impl From<ScanOutcome> for ScanResponse {
    fn from(outcome: ScanOutcome) -> Self {
        let action = outcome.action().to_string();
        let session = match outcome {
            ScanOutcome::Started(s) | ScanOutcome::Ended(s) => s,
        };
        Self {
            action,
            session: session.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CostPreviewDto {
    pub session_id: String,
    pub duration_minutes: i64,
    pub cost_cents: i64,
    pub cost: String,
    pub currency: String,
}

impl From<CostPreview> for CostPreviewDto {
    fn from(p: CostPreview) -> Self {
        Self {
            session_id: p.session_id,
            duration_minutes: p.duration_minutes,
            cost_cents: p.cost_cents,
            cost: cents_to_decimal(p.cost_cents).to_string(),
            currency: p.currency,
        }
    }
}
