//! SeaORM implementation of the Ledger
//!
//! Each operation runs in one database transaction. State transitions are
//! `UPDATE ... WHERE status = <expected>` so a racing writer sees zero rows
//! affected instead of overwriting a terminal state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, TransactionTrait,
};

use super::{db_err, payment_repository, session_repository, user_repository};
use crate::domain::{
    BalanceDebit, DomainError, DomainResult, Ledger, ParkingSession, PaymentTransaction, SpotStatus,
};
use crate::infrastructure::database::entities::{
    parking_session, parking_spot, payment_transaction, user,
};

pub struct SeaOrmLedger {
    db: DatabaseConnection,
}

impl SeaOrmLedger {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

async fn debit_balance(
    txn: &DatabaseTransaction,
    user_id: &str,
    minutes: i64,
    at: DateTime<Utc>,
) -> DomainResult<BalanceDebit> {
    let model = user::Entity::find_by_id(user_id)
        .one(txn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| DomainError::not_found("User", "id", user_id))?;

    let previous_minutes = model.balance_minutes;
    let (new_minutes, shortfall_minutes) =
        user_repository::model_to_domain(model).balance_after_debit(minutes);

    let result = user::Entity::update_many()
        .col_expr(user::Column::BalanceMinutes, Expr::value(new_minutes))
        .col_expr(user::Column::UpdatedAt, Expr::value(at))
        .filter(user::Column::Id.eq(user_id))
        .filter(user::Column::BalanceMinutes.eq(previous_minutes))
        .exec(txn)
        .await
        .map_err(db_err)?;

    if result.rows_affected == 0 {
        // storage error so the caller's retry re-runs the whole transaction
        return Err(DomainError::Storage(format!(
            "balance of user {} changed during debit",
            user_id
        )));
    }

    Ok(BalanceDebit {
        previous_minutes,
        new_minutes,
        shortfall_minutes,
    })
}

async fn credit_balance(txn: &DatabaseTransaction, user_id: &str, minutes: i64) -> DomainResult<()> {
    let result = user::Entity::update_many()
        .col_expr(
            user::Column::BalanceMinutes,
            Expr::col(user::Column::BalanceMinutes).add(minutes),
        )
        .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(user::Column::Id.eq(user_id))
        .exec(txn)
        .await
        .map_err(db_err)?;

    if result.rows_affected == 0 {
        return Err(DomainError::not_found("User", "id", user_id));
    }
    Ok(())
}

#[async_trait]
impl Ledger for SeaOrmLedger {
    async fn open_session(&self, session: &ParkingSession) -> DomainResult<()> {
        debug!("Opening session {} for user {}", session.id, session.user_id);
        let txn = self.db.begin().await.map_err(db_err)?;

        session_repository::domain_to_active_model(session)
            .insert(&txn)
            .await
            .map_err(|e| match db_err(e) {
                DomainError::Conflict(_) => DomainError::SessionAlreadyActive {
                    user_id: session.user_id.clone(),
                },
                other => other,
            })?;

        if let Some(spot_id) = &session.spot_id {
            let result = parking_spot::Entity::update_many()
                .col_expr(parking_spot::Column::IsOccupied, Expr::value(true))
                .col_expr(
                    parking_spot::Column::Status,
                    Expr::value(SpotStatus::Occupied.as_str()),
                )
                .col_expr(
                    parking_spot::Column::CurrentSessionId,
                    Expr::value(session.id.as_str()),
                )
                .col_expr(parking_spot::Column::LastUpdated, Expr::value(session.started_at))
                .filter(parking_spot::Column::Id.eq(spot_id.as_str()))
                .filter(parking_spot::Column::IsOccupied.eq(false))
                .filter(parking_spot::Column::Status.eq(SpotStatus::Available.as_str()))
                .exec(&txn)
                .await
                .map_err(db_err)?;

            if result.rows_affected == 0 {
                return Err(DomainError::SpotUnavailable {
                    spot_id: spot_id.clone(),
                });
            }
        }

        txn.commit().await.map_err(db_err)
    }

    async fn close_session(
        &self,
        session: &ParkingSession,
        debit_minutes: Option<i64>,
    ) -> DomainResult<Option<BalanceDebit>> {
        debug!("Closing session {} as {}", session.id, session.state.as_str());
        let txn = self.db.begin().await.map_err(db_err)?;

        let result = parking_session::Entity::update_many()
            .set(session_repository::state_columns(session))
            .filter(parking_session::Column::Id.eq(session.id.as_str()))
            .filter(parking_session::Column::Status.eq("active"))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            let exists = parking_session::Entity::find_by_id(session.id.as_str())
                .one(&txn)
                .await
                .map_err(db_err)?
                .is_some();
            return Err(if exists {
                DomainError::SessionNotActive {
                    session_id: session.id.clone(),
                }
            } else {
                DomainError::not_found("ParkingSession", "id", session.id.as_str())
            });
        }

        let at = session.ended_at().unwrap_or_else(Utc::now);
        let debit = match debit_minutes {
            Some(minutes) => Some(debit_balance(&txn, &session.user_id, minutes, at).await?),
            None => None,
        };

        if let Some(spot_id) = &session.spot_id {
            parking_spot::Entity::update_many()
                .col_expr(parking_spot::Column::IsOccupied, Expr::value(false))
                .col_expr(
                    parking_spot::Column::Status,
                    Expr::value(SpotStatus::Available.as_str()),
                )
                .col_expr(
                    parking_spot::Column::CurrentSessionId,
                    Expr::value(Option::<String>::None),
                )
                .col_expr(parking_spot::Column::LastUpdated, Expr::value(at))
                .filter(parking_spot::Column::Id.eq(spot_id.as_str()))
                .filter(parking_spot::Column::CurrentSessionId.eq(session.id.as_str()))
                .exec(&txn)
                .await
                .map_err(db_err)?;
        }

        txn.commit().await.map_err(db_err)?;
        Ok(debit)
    }

    async fn record_transaction(&self, tx: &PaymentTransaction) -> DomainResult<()> {
        debug!("Recording transaction {} ({})", tx.id, tx.status.as_str());
        let txn = self.db.begin().await.map_err(db_err)?;

        payment_repository::domain_to_active_model(tx)
            .insert(&txn)
            .await
            .map_err(|e| match db_err(e) {
                DomainError::Conflict(_) => DomainError::Conflict(format!(
                    "transaction {} or its payment intent is already recorded",
                    tx.id
                )),
                other => other,
            })?;

        if tx.status.is_completed() {
            credit_balance(&txn, &tx.user_id, tx.credit_minutes()).await?;
        }

        txn.commit().await.map_err(db_err)
    }

    async fn settle_transaction(&self, tx: &PaymentTransaction) -> DomainResult<bool> {
        debug!("Settling transaction {} as {}", tx.id, tx.status.as_str());
        let txn = self.db.begin().await.map_err(db_err)?;

        let result = payment_transaction::Entity::update_many()
            .set(payment_repository::status_columns(tx))
            .filter(payment_transaction::Column::Id.eq(tx.id.as_str()))
            .filter(payment_transaction::Column::Status.eq("pending"))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            let exists = payment_transaction::Entity::find_by_id(tx.id.as_str())
                .one(&txn)
                .await
                .map_err(db_err)?
                .is_some();
            if exists {
                return Ok(false);
            }
            return Err(DomainError::not_found("PaymentTransaction", "id", tx.id.as_str()));
        }

        if tx.status.is_completed() {
            credit_balance(&txn, &tx.user_id, tx.credit_minutes()).await?;
        }

        txn.commit().await.map_err(db_err)?;
        Ok(true)
    }
}
