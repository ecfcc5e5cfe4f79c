//! Payment transaction domain entity

use chrono::{DateTime, Utc};

use crate::domain::package::MinutePackage;
use crate::domain::user::User;
use crate::shared::DomainError;

/// What a transaction does to the balance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionType {
    /// Minutes bought from a package
    Purchase,
    /// Parking charge recorded outside the balance
    Parking,
    /// Minutes granted back by an admin
    Refund,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Parking => "parking",
            Self::Refund => "refund",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "purchase" => Some(Self::Purchase),
            "parking" => Some(Self::Parking),
            "refund" => Some(Self::Refund),
            _ => None,
        }
    }
}

/// How the customer paid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseMethod {
    /// Bank transfer, confirmed later by an admin
    Transfer,
    Cash,
    Card,
}

impl PurchaseMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transfer => "transfer",
            Self::Cash => "cash",
            Self::Card => "card",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "transfer" => Some(Self::Transfer),
            "cash" => Some(Self::Cash),
            "card" => Some(Self::Card),
            _ => None,
        }
    }

    /// Money is in hand when the record is created.
    pub fn settles_immediately(&self) -> bool {
        matches!(self, Self::Cash | Self::Card)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    Pending,
    Completed {
        completed_at: DateTime<Utc>,
    },
    Cancelled {
        cancelled_at: DateTime<Utc>,
        reason: Option<String>,
    },
    Failed {
        failed_at: DateTime<Utc>,
        reason: Option<String>,
    },
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed { .. } => "completed",
            Self::Cancelled { .. } => "cancelled",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionMetadata {
    pub package_id: Option<String>,
    /// Card processor intent id
    pub payment_intent_id: Option<String>,
    pub payment_method_id: Option<String>,
    pub note: Option<String>,
}

/// How a caller identifies the transaction to complete
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionLocator {
    Id(String),
    PaymentIntent(String),
}

impl std::fmt::Display for TransactionLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id={}", id),
            Self::PaymentIntent(intent) => write!(f, "payment_intent={}", intent),
        }
    }
}

/// Balance-affecting payment record
#[derive(Debug, Clone)]
pub struct PaymentTransaction {
    pub id: String,
    pub user_id: String,
    pub user_phone: String,
    pub user_name: String,
    pub tx_type: TransactionType,
    pub method: PurchaseMethod,
    /// Amount in smallest currency unit
    pub amount_cents: i64,
    pub currency: String,
    /// Minutes credited on completion
    pub minutes: i64,
    /// External reference (transfer receipt number)
    pub reference: Option<String>,
    pub metadata: TransactionMetadata,
    pub created_at: DateTime<Utc>,
    /// Staff member who confirmed or created the record
    pub processed_by: Option<String>,
    pub status: TransactionStatus,
}

impl PaymentTransaction {
    /// Purchase of `package` by `user`. Cash and card settle at creation,
    /// transfers wait for confirmation.
    pub fn purchase(
        user: &User,
        package: &MinutePackage,
        method: PurchaseMethod,
        reference: Option<String>,
        processed_by: Option<String>,
        at: DateTime<Utc>,
    ) -> Self {
        let status = if method.settles_immediately() {
            TransactionStatus::Completed { completed_at: at }
        } else {
            TransactionStatus::Pending
        };
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
            user_phone: user.phone.clone(),
            user_name: user.name.clone(),
            tx_type: TransactionType::Purchase,
            method,
            amount_cents: package.price_cents,
            currency: package.currency.clone(),
            minutes: package.minutes,
            reference,
            metadata: TransactionMetadata {
                package_id: Some(package.id.clone()),
                ..Default::default()
            },
            created_at: at,
            processed_by,
            status,
        }
    }

    /// Pending card purchase awaiting the processor's outcome
    pub fn card_intent(
        user: &User,
        package: &MinutePackage,
        payment_intent_id: impl Into<String>,
        payment_method_id: Option<String>,
        at: DateTime<Utc>,
    ) -> Self {
        let mut tx = Self::purchase(user, package, PurchaseMethod::Card, None, None, at);
        tx.status = TransactionStatus::Pending;
        tx.metadata.payment_intent_id = Some(payment_intent_id.into());
        tx.metadata.payment_method_id = payment_method_id;
        tx
    }

    /// Completed zero-amount credit of `minutes`
    pub fn refund(
        user: &User,
        minutes: i64,
        currency: impl Into<String>,
        note: Option<String>,
        processed_by: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
            user_phone: user.phone.clone(),
            user_name: user.name.clone(),
            tx_type: TransactionType::Refund,
            method: PurchaseMethod::Cash,
            amount_cents: 0,
            currency: currency.into(),
            minutes,
            reference: None,
            metadata: TransactionMetadata {
                note,
                ..Default::default()
            },
            created_at: at,
            processed_by: Some(processed_by.into()),
            status: TransactionStatus::Completed { completed_at: at },
        }
    }

    /// Minutes this record adds to the balance once completed
    pub fn credit_minutes(&self) -> i64 {
        match self.tx_type {
            TransactionType::Purchase | TransactionType::Refund => self.minutes,
            TransactionType::Parking => 0,
        }
    }

    /// Pending → Completed
    pub fn complete(
        &mut self,
        at: DateTime<Utc>,
        processed_by: Option<String>,
    ) -> Result<(), DomainError> {
        self.ensure_pending()?;
        self.status = TransactionStatus::Completed { completed_at: at };
        if processed_by.is_some() {
            self.processed_by = processed_by;
        }
        Ok(())
    }

    /// Pending → Cancelled
    pub fn cancel(&mut self, at: DateTime<Utc>, reason: Option<String>) -> Result<(), DomainError> {
        if self.status.is_completed() {
            return Err(DomainError::CannotCancelCompleted {
                transaction_id: self.id.clone(),
            });
        }
        self.ensure_pending()?;
        self.status = TransactionStatus::Cancelled {
            cancelled_at: at,
            reason,
        };
        Ok(())
    }

    /// Pending → Failed
    pub fn fail(&mut self, at: DateTime<Utc>, reason: Option<String>) -> Result<(), DomainError> {
        self.ensure_pending()?;
        self.status = TransactionStatus::Failed {
            failed_at: at,
            reason,
        };
        Ok(())
    }

    fn ensure_pending(&self) -> Result<(), DomainError> {
        if self.status.is_pending() {
            Ok(())
        } else {
            Err(DomainError::TransactionNotPending {
                transaction_id: self.id.clone(),
                status: self.status.as_str(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::UserRole;

    fn user() -> User {
        User {
            id: "u1".into(),
            phone: "+50499887766".into(),
            name: "Ana".into(),
            email: None,
            role: UserRole::Client,
            is_active: true,
            balance_minutes: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn package() -> MinutePackage {
        MinutePackage::new("1 hour", 60, 5000, "HNL").unwrap()
    }

    #[test]
    fn cash_purchase_is_completed_at_creation() {
        let tx = PaymentTransaction::purchase(
            &user(),
            &package(),
            PurchaseMethod::Cash,
            None,
            Some("g1".into()),
            Utc::now(),
        );
        assert!(tx.status.is_completed());
        assert_eq!(tx.minutes, 60);
        assert_eq!(tx.amount_cents, 5000);
        assert_eq!(tx.credit_minutes(), 60);
    }

    #[test]
    fn transfer_purchase_waits_for_confirmation() {
        let mut tx = PaymentTransaction::purchase(
            &user(),
            &package(),
            PurchaseMethod::Transfer,
            Some("REF-1".into()),
            None,
            Utc::now(),
        );
        assert!(tx.status.is_pending());
        tx.complete(Utc::now(), Some("admin".into())).unwrap();
        assert!(tx.status.is_completed());
        assert_eq!(tx.processed_by.as_deref(), Some("admin"));
    }

    #[test]
    fn completed_cannot_be_cancelled() {
        let mut tx = PaymentTransaction::purchase(
            &user(),
            &package(),
            PurchaseMethod::Cash,
            None,
            None,
            Utc::now(),
        );
        let err = tx.cancel(Utc::now(), None).unwrap_err();
        assert!(matches!(err, DomainError::CannotCancelCompleted { .. }));
    }

    #[test]
    fn terminal_states_reject_transitions() {
        let mut tx = PaymentTransaction::card_intent(&user(), &package(), "pi_1", None, Utc::now());
        assert!(tx.status.is_pending());
        tx.fail(Utc::now(), Some("declined".into())).unwrap();
        assert_eq!(tx.status.as_str(), "failed");
        assert!(matches!(
            tx.complete(Utc::now(), None),
            Err(DomainError::TransactionNotPending { status: "failed", .. })
        ));
        assert!(tx.cancel(Utc::now(), None).is_err());
    }

    #[test]
    fn refund_credits_without_amount() {
        let tx = PaymentTransaction::refund(&user(), 15, "HNL", Some("gate fault".into()), "admin", Utc::now());
        assert_eq!(tx.tx_type, TransactionType::Refund);
        assert_eq!(tx.amount_cents, 0);
        assert_eq!(tx.credit_minutes(), 15);
        assert!(tx.status.is_completed());
    }

    #[test]
    fn enum_strings() {
        for m in [PurchaseMethod::Transfer, PurchaseMethod::Cash, PurchaseMethod::Card] {
            assert_eq!(PurchaseMethod::from_str(m.as_str()), Some(m));
        }
        for t in [TransactionType::Purchase, TransactionType::Parking, TransactionType::Refund] {
            assert_eq!(TransactionType::from_str(t.as_str()), Some(t));
        }
    }
}
