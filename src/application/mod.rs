//! Application layer: use cases over the domain ports

pub mod locks;
pub mod services;

pub use locks::{KeyGuard, KeyedLocks, SharedKeyedLocks};
pub use services::{
    AccountService, CardPaymentRequest, CostPreview, PackageService, PaymentManager,
    PurchaseRequest, ScanOutcome, SessionManager, SpotService, StartSession,
};
