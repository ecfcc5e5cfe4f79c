//! Application services

mod account_service;
mod package_service;
mod payment_manager;
mod session_manager;
mod spot_service;

pub use account_service::AccountService;
pub use package_service::PackageService;
pub use payment_manager::{CardPaymentRequest, PaymentManager, PurchaseRequest};
pub use session_manager::{CostPreview, ScanOutcome, SessionManager, StartSession};
pub use spot_service::SpotService;
