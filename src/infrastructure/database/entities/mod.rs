//! Database entities module

pub mod minute_package;
pub mod parking_session;
pub mod parking_spot;
pub mod payment_transaction;
pub mod user;

pub use minute_package::Entity as MinutePackage;
pub use parking_session::Entity as ParkingSession;
pub use parking_spot::Entity as ParkingSpot;
pub use payment_transaction::Entity as PaymentTransaction;
pub use user::Entity as User;
