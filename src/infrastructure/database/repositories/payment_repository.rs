//! SeaORM implementation of PaymentRepository

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};

use super::{corrupt_row, db_err};
use crate::domain::{
    DomainResult, PaymentRepository, PaymentTransaction, PurchaseMethod, TransactionMetadata,
    TransactionStatus, TransactionType,
};
use crate::infrastructure::database::entities::payment_transaction;

const TABLE: &str = "payment_transactions";
const PENDING: &str = "pending";

pub struct SeaOrmPaymentRepository {
    db: DatabaseConnection,
}

impl SeaOrmPaymentRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

pub(super) fn model_to_domain(m: payment_transaction::Model) -> DomainResult<PaymentTransaction> {
    let tx_type = TransactionType::from_str(&m.tx_type)
        .ok_or_else(|| corrupt_row(TABLE, &m.id, &format!("unknown type {}", m.tx_type)))?;
    let method = PurchaseMethod::from_str(&m.method)
        .ok_or_else(|| corrupt_row(TABLE, &m.id, &format!("unknown method {}", m.method)))?;
    let changed_at = m.status_changed_at.unwrap_or(m.created_at);
    let status = match m.status.as_str() {
        "pending" => TransactionStatus::Pending,
        "completed" => TransactionStatus::Completed {
            completed_at: changed_at,
        },
        "cancelled" => TransactionStatus::Cancelled {
            cancelled_at: changed_at,
            reason: m.status_reason,
        },
        "failed" => TransactionStatus::Failed {
            failed_at: changed_at,
            reason: m.status_reason,
        },
        other => return Err(corrupt_row(TABLE, &m.id, &format!("unknown status {}", other))),
    };

    Ok(PaymentTransaction {
        id: m.id,
        user_id: m.user_id,
        user_phone: m.user_phone,
        user_name: m.user_name,
        tx_type,
        method,
        amount_cents: m.amount_cents,
        currency: m.currency,
        minutes: m.minutes,
        reference: m.reference,
        metadata: TransactionMetadata {
            package_id: m.package_id,
            payment_intent_id: m.payment_intent_id,
            payment_method_id: m.payment_method_id,
            note: m.note,
        },
        created_at: m.created_at,
        processed_by: m.processed_by,
        status,
    })
}

/// Status columns only, for the conditional settle update
pub(super) fn status_columns(tx: &PaymentTransaction) -> payment_transaction::ActiveModel {
    let (changed_at, reason) = match &tx.status {
        TransactionStatus::Pending => (None, None),
        TransactionStatus::Completed { completed_at } => (Some(*completed_at), None),
        TransactionStatus::Cancelled {
            cancelled_at,
            reason,
        } => (Some(*cancelled_at), reason.clone()),
        TransactionStatus::Failed { failed_at, reason } => (Some(*failed_at), reason.clone()),
    };
    payment_transaction::ActiveModel {
        status: Set(tx.status.as_str().to_string()),
        status_changed_at: Set(changed_at),
        status_reason: Set(reason),
        processed_by: Set(tx.processed_by.clone()),
        ..Default::default()
    }
}

pub(super) fn domain_to_active_model(tx: &PaymentTransaction) -> payment_transaction::ActiveModel {
    let mut active = status_columns(tx);
    active.id = Set(tx.id.clone());
    active.user_id = Set(tx.user_id.clone());
    active.user_phone = Set(tx.user_phone.clone());
    active.user_name = Set(tx.user_name.clone());
    active.tx_type = Set(tx.tx_type.as_str().to_string());
    active.method = Set(tx.method.as_str().to_string());
    active.amount_cents = Set(tx.amount_cents);
    active.currency = Set(tx.currency.clone());
    active.minutes = Set(tx.minutes);
    active.reference = Set(tx.reference.clone());
    active.package_id = Set(tx.metadata.package_id.clone());
    active.payment_intent_id = Set(tx.metadata.payment_intent_id.clone());
    active.payment_method_id = Set(tx.metadata.payment_method_id.clone());
    active.note = Set(tx.metadata.note.clone());
    active.created_at = Set(tx.created_at);
    active
}

fn collect(models: Vec<payment_transaction::Model>) -> DomainResult<Vec<PaymentTransaction>> {
    models.into_iter().map(model_to_domain).collect()
}

// ── PaymentRepository impl ──────────────────────────────────────

#[async_trait]
impl PaymentRepository for SeaOrmPaymentRepository {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<PaymentTransaction>> {
        payment_transaction::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain)
            .transpose()
    }

    async fn find_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> DomainResult<Option<PaymentTransaction>> {
        payment_transaction::Entity::find()
            .filter(payment_transaction::Column::PaymentIntentId.eq(payment_intent_id))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain)
            .transpose()
    }

    async fn find_by_user(&self, user_id: &str) -> DomainResult<Vec<PaymentTransaction>> {
        let models = payment_transaction::Entity::find()
            .filter(payment_transaction::Column::UserId.eq(user_id))
            .order_by_desc(payment_transaction::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        collect(models)
    }

    async fn find_pending(&self) -> DomainResult<Vec<PaymentTransaction>> {
        let models = payment_transaction::Entity::find()
            .filter(payment_transaction::Column::Status.eq(PENDING))
            .order_by_asc(payment_transaction::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        collect(models)
    }
}
