//! Minute purchases and balance-affecting transactions
//!
//! Every path that moves a transaction into `completed` goes through
//! [`PaymentManager::complete_transaction`], whether the caller knows the
//! transaction id (admin confirmation) or only the card processor's intent id.

use std::sync::Arc;

use tracing::{info, warn};

use crate::application::locks::{KeyedLocks, SharedKeyedLocks};
use crate::domain::{
    DomainError, DomainResult, MinutePackage, PaymentTransaction, PurchaseMethod,
    RepositoryProvider, TransactionLocator, User,
};
use crate::shared::{
    require_non_empty, retry_with_backoff, system_clock, PaginatedResult, PaginationParams,
    RetryConfig, SharedClock,
};

#[derive(Debug, Clone)]
pub struct PurchaseRequest {
    pub user_id: String,
    pub package_id: String,
    pub method: PurchaseMethod,
    pub reference: Option<String>,
    pub processed_by: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CardPaymentRequest {
    pub user_id: String,
    pub package_id: String,
    pub payment_intent_id: String,
    pub payment_method_id: Option<String>,
}

pub struct PaymentManager {
    repos: Arc<dyn RepositoryProvider>,
    currency: String,
    clock: SharedClock,
    retry: RetryConfig,
    locks: SharedKeyedLocks,
}

impl PaymentManager {
    pub fn new(repos: Arc<dyn RepositoryProvider>, currency: impl Into<String>) -> Self {
        Self {
            repos,
            currency: currency.into(),
            clock: system_clock(),
            retry: RetryConfig::default(),
            locks: KeyedLocks::shared(),
        }
    }

    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_locks(mut self, locks: SharedKeyedLocks) -> Self {
        self.locks = locks;
        self
    }

    /// Buy a package. Cash and card credit the balance at once; a transfer
    /// stays pending until an admin confirms it.
    pub async fn process_purchase(&self, request: PurchaseRequest) -> DomainResult<PaymentTransaction> {
        let user = self.load_user(&request.user_id).await?;
        let package = self.load_active_package(&request.package_id).await?;

        let tx = PaymentTransaction::purchase(
            &user,
            &package,
            request.method,
            request.reference,
            request.processed_by,
            self.clock.now(),
        );
        self.record(&tx).await?;

        metrics::counter!(
            "parking_purchases_total",
            "method" => tx.method.as_str(),
            "status" => tx.status.as_str()
        )
        .increment(1);
        info!(
            transaction_id = tx.id.as_str(),
            user_id = tx.user_id.as_str(),
            package_id = package.id.as_str(),
            method = tx.method.as_str(),
            status = tx.status.as_str(),
            minutes = tx.minutes,
            amount = %package.format_price(),
            "Purchase recorded"
        );

        Ok(tx)
    }

    /// Admin confirmation of a pending transfer.
    pub async fn confirm_transaction(
        &self,
        transaction_id: &str,
        processed_by: &str,
    ) -> DomainResult<PaymentTransaction> {
        self.complete_transaction(
            TransactionLocator::Id(transaction_id.to_string()),
            Some(processed_by.to_string()),
        )
        .await
    }

    /// Pending → Completed, crediting minutes exactly once. Completing an
    /// already completed transaction returns it unchanged.
    pub async fn complete_transaction(
        &self,
        locator: TransactionLocator,
        processed_by: Option<String>,
    ) -> DomainResult<PaymentTransaction> {
        let mut tx = self.locate(&locator).await?;
        if tx.status.is_completed() {
            info!(transaction_id = tx.id.as_str(), %locator, "Transaction already completed");
            return Ok(tx);
        }

        tx.complete(self.clock.now(), processed_by)?;

        if !self.settle(&tx, "complete_transaction").await? {
            let stored = self.get_transaction(&tx.id).await?;
            if stored.status.is_completed() {
                return Ok(stored);
            }
            return Err(not_pending(&stored));
        }

        metrics::counter!("parking_minutes_credited_total").increment(tx.credit_minutes().max(0) as u64);
        info!(
            transaction_id = tx.id.as_str(),
            user_id = tx.user_id.as_str(),
            %locator,
            minutes = tx.minutes,
            processed_by = ?tx.processed_by,
            "Transaction completed, balance credited"
        );

        Ok(tx)
    }

    pub async fn cancel_transaction(
        &self,
        transaction_id: &str,
        reason: Option<String>,
    ) -> DomainResult<PaymentTransaction> {
        let mut tx = self.get_transaction(transaction_id).await?;
        tx.cancel(self.clock.now(), reason)?;

        if !self.settle(&tx, "cancel_transaction").await? {
            let stored = self.get_transaction(transaction_id).await?;
            if stored.status.is_completed() {
                return Err(DomainError::CannotCancelCompleted {
                    transaction_id: stored.id,
                });
            }
            return Err(not_pending(&stored));
        }

        info!(transaction_id, user_id = tx.user_id.as_str(), "Transaction cancelled");
        Ok(tx)
    }

    /// Pending card transaction awaiting the processor's outcome.
    pub async fn create_card_payment(
        &self,
        request: CardPaymentRequest,
    ) -> DomainResult<PaymentTransaction> {
        require_non_empty("payment_intent_id", &request.payment_intent_id)?;
        if self
            .repos
            .payments()
            .find_by_payment_intent(&request.payment_intent_id)
            .await?
            .is_some()
        {
            return Err(DomainError::Conflict(format!(
                "payment intent {} already recorded",
                request.payment_intent_id
            )));
        }

        let user = self.load_user(&request.user_id).await?;
        let package = self.load_active_package(&request.package_id).await?;

        let tx = PaymentTransaction::card_intent(
            &user,
            &package,
            request.payment_intent_id,
            request.payment_method_id,
            self.clock.now(),
        );
        self.record(&tx).await?;

        info!(
            transaction_id = tx.id.as_str(),
            user_id = tx.user_id.as_str(),
            payment_intent_id = ?tx.metadata.payment_intent_id,
            "Card payment pending"
        );
        Ok(tx)
    }

    /// Processor reported success for `payment_intent_id`.
    pub async fn complete_card_payment(
        &self,
        payment_intent_id: &str,
    ) -> DomainResult<PaymentTransaction> {
        self.complete_transaction(
            TransactionLocator::PaymentIntent(payment_intent_id.to_string()),
            None,
        )
        .await
    }

    /// Processor reported failure for `payment_intent_id`. No credit.
    pub async fn fail_card_payment(
        &self,
        payment_intent_id: &str,
        reason: Option<String>,
    ) -> DomainResult<PaymentTransaction> {
        let mut tx = self
            .locate(&TransactionLocator::PaymentIntent(payment_intent_id.to_string()))
            .await?;
        tx.fail(self.clock.now(), reason)?;

        if !self.settle(&tx, "fail_card_payment").await? {
            let stored = self.get_transaction(&tx.id).await?;
            return Err(not_pending(&stored));
        }

        metrics::counter!("parking_card_payments_failed_total").increment(1);
        warn!(
            transaction_id = tx.id.as_str(),
            payment_intent_id,
            "Card payment failed"
        );
        Ok(tx)
    }

    /// Credit `minutes` to a user as a completed refund record.
    pub async fn grant_refund(
        &self,
        user_id: &str,
        minutes: i64,
        reason: Option<String>,
        processed_by: &str,
    ) -> DomainResult<PaymentTransaction> {
        if minutes <= 0 {
            return Err(DomainError::Validation("refund minutes must be positive".into()));
        }
        let user = self.load_user(user_id).await?;

        let tx = PaymentTransaction::refund(
            &user,
            minutes,
            self.currency.as_str(),
            reason,
            processed_by,
            self.clock.now(),
        );
        self.record(&tx).await?;

        metrics::counter!("parking_minutes_credited_total").increment(minutes as u64);
        info!(
            transaction_id = tx.id.as_str(),
            user_id,
            minutes,
            processed_by,
            "Refund granted"
        );
        Ok(tx)
    }

    pub async fn get_transaction(&self, transaction_id: &str) -> DomainResult<PaymentTransaction> {
        self.repos
            .payments()
            .find_by_id(transaction_id)
            .await?
            .ok_or_else(|| DomainError::not_found("PaymentTransaction", "id", transaction_id))
    }

    pub async fn transactions_for_user(
        &self,
        user_id: &str,
        pagination: PaginationParams,
    ) -> DomainResult<PaginatedResult<PaymentTransaction>> {
        let txs = self.repos.payments().find_by_user(user_id).await?;
        Ok(PaginatedResult::from_vec(txs, pagination))
    }

    pub async fn pending_transactions(&self) -> DomainResult<Vec<PaymentTransaction>> {
        self.repos.payments().find_pending().await
    }

    async fn locate(&self, locator: &TransactionLocator) -> DomainResult<PaymentTransaction> {
        match locator {
            TransactionLocator::Id(id) => self.get_transaction(id).await,
            TransactionLocator::PaymentIntent(intent) => self
                .repos
                .payments()
                .find_by_payment_intent(intent)
                .await?
                .ok_or_else(|| {
                    DomainError::not_found("PaymentTransaction", "payment_intent_id", intent.as_str())
                }),
        }
    }

    async fn load_user(&self, user_id: &str) -> DomainResult<User> {
        self.repos
            .users()
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", "id", user_id))
    }

    /// Inactive packages are reported as missing.
    async fn load_active_package(&self, package_id: &str) -> DomainResult<MinutePackage> {
        self.repos
            .packages()
            .find_by_id(package_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| DomainError::not_found("MinutePackage", "id", package_id))
    }

    async fn record(&self, tx: &PaymentTransaction) -> DomainResult<()> {
        let _guard = self.locks.lock(&tx.user_id).await;
        retry_with_backoff(
            self.retry.clone(),
            || self.repos.ledger().record_transaction(tx),
            DomainError::is_transient,
            "record_transaction",
        )
        .await
    }

    async fn settle(&self, tx: &PaymentTransaction, operation: &str) -> DomainResult<bool> {
        let _guard = self.locks.lock(&tx.user_id).await;
        retry_with_backoff(
            self.retry.clone(),
            || self.repos.ledger().settle_transaction(tx),
            DomainError::is_transient,
            operation,
        )
        .await
    }
}

fn not_pending(tx: &PaymentTransaction) -> DomainError {
    DomainError::TransactionNotPending {
        transaction_id: tx.id.clone(),
        status: tx.status.as_str(),
    }
}
