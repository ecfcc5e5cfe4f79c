//! Parking session aggregate
//!
//! Contains the ParkingSession entity, its state machine, and the
//! read-side repository interface. Writes go through the ledger.

pub mod model;
pub mod repository;

pub use model::{ParkingSession, PaymentMethod, SessionBill, SessionState};
pub use repository::SessionRepository;
