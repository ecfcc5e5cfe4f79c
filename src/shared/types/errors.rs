use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("User {user_id} already has an active parking session")]
    SessionAlreadyActive { user_id: String },

    #[error("Parking session {session_id} is not active")]
    SessionNotActive { session_id: String },

    #[error("Parking spot {spot_id} is not available")]
    SpotUnavailable { spot_id: String },

    #[error("Transaction {transaction_id} is completed and cannot be cancelled")]
    CannotCancelCompleted { transaction_id: String },

    #[error("Transaction {transaction_id} is {status}, expected pending")]
    TransactionNotPending {
        transaction_id: String,
        status: &'static str,
    },

    #[error("Validation: {0}")]
    Validation(String),

    #[error("Already exists: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, field: &'static str, value: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            field,
            value: value.into(),
        }
    }

    /// Whether this error is likely transient (e.g. DB connection lost)
    /// and the operation may succeed if retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, DomainError::Storage(_))
    }

    /// State-machine violations: the request was well-formed but the
    /// record is not in a state that allows it.
    pub fn is_state_conflict(&self) -> bool {
        matches!(
            self,
            DomainError::SessionAlreadyActive { .. }
                | DomainError::SessionNotActive { .. }
                | DomainError::SpotUnavailable { .. }
                | DomainError::CannotCancelCompleted { .. }
                | DomainError::TransactionNotPending { .. }
                | DomainError::Conflict(_)
        )
    }
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_are_transient() {
        assert!(DomainError::Storage("connection reset".into()).is_transient());
        assert!(!DomainError::Validation("bad".into()).is_transient());
        assert!(!DomainError::SessionNotActive {
            session_id: "s1".into()
        }
        .is_transient());
    }

    #[test]
    fn state_conflicts_are_classified() {
        assert!(DomainError::SessionAlreadyActive {
            user_id: "u1".into()
        }
        .is_state_conflict());
        assert!(DomainError::CannotCancelCompleted {
            transaction_id: "t1".into()
        }
        .is_state_conflict());
        assert!(!DomainError::not_found("User", "id", "u1").is_state_conflict());
    }

    #[test]
    fn not_found_message() {
        let err = DomainError::not_found("Session", "id", "abc");
        assert_eq!(err.to_string(), "Not found: Session with id=abc");
    }
}
