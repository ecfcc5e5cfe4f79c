pub mod health;
pub mod metrics;
pub mod packages;
pub mod payments;
pub mod sessions;
pub mod spots;
pub mod users;
