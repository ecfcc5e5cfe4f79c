//! Domain layer: entities, state machines and storage ports

pub mod billing;
pub mod ledger;
pub mod package;
pub mod payment;
pub mod qr;
pub mod repositories;
pub mod session;
pub mod spot;
pub mod user;

pub use billing::ParkingRate;
pub use ledger::{BalanceDebit, Ledger};
pub use package::{MinutePackage, PackageRepository};
pub use payment::{
    PaymentRepository, PaymentTransaction, PurchaseMethod, TransactionLocator,
    TransactionMetadata, TransactionStatus, TransactionType,
};
pub use qr::{SessionQrCode, UserQrCode};
pub use repositories::RepositoryProvider;
pub use session::{ParkingSession, PaymentMethod, SessionBill, SessionRepository, SessionState};
pub use spot::{ParkingSpot, SpotRepository, SpotStatus, SpotType};
pub use user::{CreateUserDto, GetUserDto, User, UserRepository, UserRole};

pub use crate::shared::{DomainError, DomainResult};
