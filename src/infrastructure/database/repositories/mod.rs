//! Database repository implementations
//!
//! Per-aggregate SeaORM repositories, the transactional ledger and the
//! unified RepositoryProvider.

pub mod ledger;
pub mod package_repository;
pub mod payment_repository;
pub mod repository_provider;
pub mod session_repository;
pub mod spot_repository;
pub mod user_repository;

pub use ledger::SeaOrmLedger;
pub use repository_provider::SeaOrmRepositoryProvider;

use sea_orm::{DbErr, SqlErr};

use crate::domain::DomainError;

/// Constraint violations are caller errors; anything else is a storage failure.
pub(crate) fn db_err(e: DbErr) -> DomainError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => DomainError::Conflict(detail),
        Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
            DomainError::Validation(format!("referenced record does not exist: {}", detail))
        }
        _ => DomainError::Storage(e.to_string()),
    }
}

/// A stored row that does not map back onto a domain state
pub(crate) fn corrupt_row(table: &str, id: &str, detail: &str) -> DomainError {
    DomainError::Storage(format!("{} row {} is inconsistent: {}", table, id, detail))
}
