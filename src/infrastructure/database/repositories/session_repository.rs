//! SeaORM implementation of SessionRepository

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};

use super::{corrupt_row, db_err};
use crate::domain::{
    DomainResult, ParkingSession, PaymentMethod, SessionBill, SessionRepository, SessionState,
};
use crate::infrastructure::database::entities::parking_session;

const TABLE: &str = "parking_sessions";
const ACTIVE: &str = "active";

pub struct SeaOrmSessionRepository {
    db: DatabaseConnection,
}

impl SeaOrmSessionRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

pub(super) fn model_to_domain(m: parking_session::Model) -> DomainResult<ParkingSession> {
    let state = match m.status.as_str() {
        "active" => SessionState::Active,
        "completed" => SessionState::Completed(SessionBill {
            ended_at: m
                .ended_at
                .ok_or_else(|| corrupt_row(TABLE, &m.id, "completed without ended_at"))?,
            duration_minutes: m
                .duration_minutes
                .ok_or_else(|| corrupt_row(TABLE, &m.id, "completed without duration"))?,
            cost_cents: m
                .cost_cents
                .ok_or_else(|| corrupt_row(TABLE, &m.id, "completed without cost"))?,
            payment_method: m
                .payment_method
                .as_deref()
                .and_then(PaymentMethod::from_str)
                .ok_or_else(|| corrupt_row(TABLE, &m.id, "unknown payment method"))?,
            guard_id: m.guard_id,
        }),
        "cancelled" => SessionState::Cancelled {
            cancelled_at: m
                .ended_at
                .ok_or_else(|| corrupt_row(TABLE, &m.id, "cancelled without ended_at"))?,
            reason: m.cancel_reason,
        },
        other => return Err(corrupt_row(TABLE, &m.id, &format!("unknown status {}", other))),
    };

    Ok(ParkingSession {
        id: m.id,
        user_id: m.user_id,
        user_phone: m.user_phone,
        user_name: m.user_name,
        started_at: m.started_at,
        location: m.location,
        spot_id: m.spot_id,
        qr_code: m.qr_code,
        state,
    })
}

/// Columns describing the session's state. Identity columns are left
/// unset so the result can drive a conditional update.
pub(super) fn state_columns(session: &ParkingSession) -> parking_session::ActiveModel {
    let mut active = parking_session::ActiveModel {
        status: Set(session.state.as_str().to_string()),
        ..Default::default()
    };
    match &session.state {
        SessionState::Active => {
            active.ended_at = Set(None);
            active.duration_minutes = Set(None);
            active.cost_cents = Set(None);
            active.payment_method = Set(None);
            active.guard_id = Set(None);
            active.cancel_reason = Set(None);
        }
        SessionState::Completed(bill) => {
            active.ended_at = Set(Some(bill.ended_at));
            active.duration_minutes = Set(Some(bill.duration_minutes));
            active.cost_cents = Set(Some(bill.cost_cents));
            active.payment_method = Set(Some(bill.payment_method.as_str().to_string()));
            active.guard_id = Set(bill.guard_id.clone());
            active.cancel_reason = Set(None);
        }
        SessionState::Cancelled {
            cancelled_at,
            reason,
        } => {
            active.ended_at = Set(Some(*cancelled_at));
            active.duration_minutes = Set(None);
            active.cost_cents = Set(None);
            active.payment_method = Set(None);
            active.guard_id = Set(None);
            active.cancel_reason = Set(reason.clone());
        }
    }
    active
}

pub(super) fn domain_to_active_model(session: &ParkingSession) -> parking_session::ActiveModel {
    let mut active = state_columns(session);
    active.id = Set(session.id.clone());
    active.user_id = Set(session.user_id.clone());
    active.user_phone = Set(session.user_phone.clone());
    active.user_name = Set(session.user_name.clone());
    active.started_at = Set(session.started_at);
    active.location = Set(session.location.clone());
    active.spot_id = Set(session.spot_id.clone());
    active.qr_code = Set(session.qr_code.clone());
    active
}

fn collect(models: Vec<parking_session::Model>) -> DomainResult<Vec<ParkingSession>> {
    models.into_iter().map(model_to_domain).collect()
}

// ── SessionRepository impl ──────────────────────────────────────

#[async_trait]
impl SessionRepository for SeaOrmSessionRepository {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<ParkingSession>> {
        parking_session::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain)
            .transpose()
    }

    async fn find_active_for_user(&self, user_id: &str) -> DomainResult<Option<ParkingSession>> {
        parking_session::Entity::find()
            .filter(parking_session::Column::UserId.eq(user_id))
            .filter(parking_session::Column::Status.eq(ACTIVE))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain)
            .transpose()
    }

    async fn find_by_user(&self, user_id: &str) -> DomainResult<Vec<ParkingSession>> {
        let models = parking_session::Entity::find()
            .filter(parking_session::Column::UserId.eq(user_id))
            .order_by_desc(parking_session::Column::StartedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        collect(models)
    }

    async fn find_active(&self) -> DomainResult<Vec<ParkingSession>> {
        let models = parking_session::Entity::find()
            .filter(parking_session::Column::Status.eq(ACTIVE))
            .order_by_asc(parking_session::Column::StartedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        collect(models)
    }

    async fn find_by_qr_code(&self, qr_code: &str) -> DomainResult<Option<ParkingSession>> {
        parking_session::Entity::find()
            .filter(parking_session::Column::QrCode.eq(qr_code))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain)
            .transpose()
    }
}
