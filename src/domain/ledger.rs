//! Atomic multi-record writes
//!
//! Every state transition that touches more than one record (session and
//! spot, session and balance, transaction and balance) is a single ledger
//! call. Implementations run each call in one storage transaction and guard
//! transitions with a status check on the stored row, so two racing callers
//! cannot both apply the same transition.

use async_trait::async_trait;

use super::payment::PaymentTransaction;
use super::session::ParkingSession;
use super::DomainResult;

/// Result of debiting parking minutes from a user balance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceDebit {
    pub previous_minutes: i64,
    pub new_minutes: i64,
    /// Minutes the balance could not cover
    pub shortfall_minutes: i64,
}

#[async_trait]
pub trait Ledger: Send + Sync {
    /// Insert an active session and occupy its spot.
    ///
    /// Fails with `SessionAlreadyActive` if the user already has an active
    /// session in storage and `SpotUnavailable` if the spot was taken.
    async fn open_session(&self, session: &ParkingSession) -> DomainResult<()>;

    /// Store the terminal state of `session` (completed or cancelled),
    /// debit `debit_minutes` from the user's balance clamped at zero, and
    /// release the spot.
    ///
    /// Fails with `SessionNotActive` if the stored session is no longer
    /// active. Returns the debit applied, if any.
    async fn close_session(
        &self,
        session: &ParkingSession,
        debit_minutes: Option<i64>,
    ) -> DomainResult<Option<BalanceDebit>>;

    /// Insert a payment transaction, crediting its minutes when it is
    /// already completed.
    async fn record_transaction(&self, tx: &PaymentTransaction) -> DomainResult<()>;

    /// Move a stored pending transaction to the status held by `tx`,
    /// crediting minutes when that status is completed.
    ///
    /// Returns `false` without writing when the stored row is no longer
    /// pending.
    async fn settle_transaction(&self, tx: &PaymentTransaction) -> DomainResult<bool>;
}
