//! Parking session domain entity

use chrono::{DateTime, Utc};

use crate::domain::billing::{billable_minutes, ParkingRate};
use crate::domain::qr::SessionQrCode;
use crate::shared::DomainError;

/// How a completed session was paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaymentMethod {
    /// Debited from the user's prepaid minutes
    #[default]
    Balance,
    Cash,
    Transfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Balance => "balance",
            Self::Cash => "cash",
            Self::Transfer => "transfer",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "balance" => Some(Self::Balance),
            "cash" => Some(Self::Cash),
            "transfer" => Some(Self::Transfer),
            _ => None,
        }
    }
}

/// Bill written when a session completes. Set exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionBill {
    pub ended_at: DateTime<Utc>,
    pub duration_minutes: i64,
    pub cost_cents: i64,
    pub payment_method: PaymentMethod,
    pub guard_id: Option<String>,
}

/// Session lifecycle state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Completed(SessionBill),
    Cancelled {
        cancelled_at: DateTime<Utc>,
        reason: Option<String>,
    },
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed(_) => "completed",
            Self::Cancelled { .. } => "cancelled",
        }
    }
}

/// A parked-vehicle occupancy record from entry to exit
#[derive(Debug, Clone)]
pub struct ParkingSession {
    pub id: String,
    pub user_id: String,
    pub user_phone: String,
    pub user_name: String,
    pub started_at: DateTime<Utc>,
    pub location: String,
    pub spot_id: Option<String>,
    pub qr_code: String,
    pub state: SessionState,
}

impl ParkingSession {
    pub fn start(
        user_id: impl Into<String>,
        user_phone: impl Into<String>,
        user_name: impl Into<String>,
        location: impl Into<String>,
        spot_id: Option<String>,
        at: DateTime<Utc>,
    ) -> Self {
        let user_id = user_id.into();
        let qr_code = SessionQrCode::issue(user_id.clone(), at).to_string();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            user_phone: user_phone.into(),
            user_name: user_name.into(),
            started_at: at,
            location: location.into(),
            spot_id,
            qr_code,
            state: SessionState::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    pub fn bill(&self) -> Option<&SessionBill> {
        match &self.state {
            SessionState::Completed(bill) => Some(bill),
            _ => None,
        }
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        match &self.state {
            SessionState::Active => None,
            SessionState::Completed(bill) => Some(bill.ended_at),
            SessionState::Cancelled { cancelled_at, .. } => Some(*cancelled_at),
        }
    }

    /// Running bill for an active session, as it would be if closed at `at`.
    pub fn preview(&self, at: DateTime<Utc>, rate: &ParkingRate) -> (i64, i64) {
        let minutes = billable_minutes(self.started_at, at);
        (minutes, rate.cost_cents(minutes))
    }

    /// Active → Completed. Computes duration and cost once.
    pub fn complete(
        &mut self,
        at: DateTime<Utc>,
        rate: &ParkingRate,
        payment_method: PaymentMethod,
        guard_id: Option<String>,
    ) -> Result<SessionBill, DomainError> {
        self.ensure_active()?;
        let (duration_minutes, cost_cents) = self.preview(at, rate);
        let bill = SessionBill {
            ended_at: at,
            duration_minutes,
            cost_cents,
            payment_method,
            guard_id,
        };
        self.state = SessionState::Completed(bill.clone());
        Ok(bill)
    }

    /// Active → Cancelled. No bill is produced.
    pub fn cancel(&mut self, at: DateTime<Utc>, reason: Option<String>) -> Result<(), DomainError> {
        self.ensure_active()?;
        self.state = SessionState::Cancelled {
            cancelled_at: at,
            reason,
        };
        Ok(())
    }

    fn ensure_active(&self) -> Result<(), DomainError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(DomainError::SessionNotActive {
                session_id: self.id.clone(),
            })
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn sample(at: DateTime<Utc>) -> ParkingSession {
        ParkingSession::start("u1", "+50499887766", "Ana", "Mall North", Some("spot-1".into()), at)
    }

    #[test]
    fn new_session_is_active() {
        let t0 = Utc::now();
        let s = sample(t0);
        assert!(s.is_active());
        assert!(s.bill().is_none());
        assert!(s.ended_at().is_none());
        assert_eq!(s.qr_code, format!("PARKING_u1_{}", t0.timestamp_millis()));
    }

    #[test]
    fn complete_sets_duration_and_cost() {
        let t0 = Utc::now();
        let mut s = sample(t0);
        let rate = ParkingRate::new(100, "HNL");
        let bill = s
            .complete(t0 + Duration::minutes(30), &rate, PaymentMethod::Cash, Some("g1".into()))
            .unwrap();
        assert_eq!(bill.duration_minutes, 30);
        assert_eq!(bill.cost_cents, 3000);
        assert_eq!(bill.payment_method, PaymentMethod::Cash);
        assert_eq!(s.state.as_str(), "completed");
    }

    #[test]
    fn completing_twice_fails_and_keeps_first_bill() {
        let t0 = Utc::now();
        let mut s = sample(t0);
        let rate = ParkingRate::default();
        s.complete(t0 + Duration::minutes(10), &rate, PaymentMethod::Balance, None)
            .unwrap();

        let err = s
            .complete(t0 + Duration::minutes(50), &rate, PaymentMethod::Balance, None)
            .unwrap_err();
        assert!(matches!(err, DomainError::SessionNotActive { .. }));
        assert_eq!(s.bill().unwrap().duration_minutes, 10);
    }

    #[test]
    fn cancel_only_from_active() {
        let t0 = Utc::now();
        let mut s = sample(t0);
        s.cancel(t0, Some("wrong plate".into())).unwrap();
        assert_eq!(s.state.as_str(), "cancelled");
        assert!(s.cancel(t0, None).is_err());
        assert!(s
            .complete(t0, &ParkingRate::default(), PaymentMethod::Cash, None)
            .is_err());
    }

    #[test]
    fn payment_method_strings() {
        for m in [PaymentMethod::Balance, PaymentMethod::Cash, PaymentMethod::Transfer] {
            assert_eq!(PaymentMethod::from_str(m.as_str()), Some(m));
        }
        assert!(PaymentMethod::from_str("card").is_none());
    }
}
