//! Payment transaction aggregate

pub mod model;
pub mod repository;

pub use model::{
    PaymentTransaction, PurchaseMethod, TransactionLocator, TransactionMetadata,
    TransactionStatus, TransactionType,
};
pub use repository::PaymentRepository;
