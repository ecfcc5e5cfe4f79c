//! Parking spot aggregate

pub mod model;
pub mod repository;

pub use model::{ParkingSpot, SpotStatus, SpotType};
pub use repository::SpotRepository;
