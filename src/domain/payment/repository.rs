//! Payment transaction repository interface

use async_trait::async_trait;

use super::model::PaymentTransaction;
use crate::domain::DomainResult;

/// Read side only. Inserts and status transitions go through the ledger so
/// balance credits stay in the same storage transaction.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<PaymentTransaction>>;
    async fn find_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> DomainResult<Option<PaymentTransaction>>;
    /// Newest first
    async fn find_by_user(&self, user_id: &str) -> DomainResult<Vec<PaymentTransaction>>;
    /// Oldest first, the admin confirmation queue
    async fn find_pending(&self) -> DomainResult<Vec<PaymentTransaction>>;
}
