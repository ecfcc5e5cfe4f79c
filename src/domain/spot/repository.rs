//! Parking spot repository interface

use async_trait::async_trait;

use super::model::{ParkingSpot, SpotStatus};
use crate::domain::DomainResult;

/// Occupancy (`is_occupied`, `current_session_id`) is written only by the
/// [`Ledger`](crate::domain::Ledger); this trait covers administration.
#[async_trait]
pub trait SpotRepository: Send + Sync {
    async fn save(&self, spot: ParkingSpot) -> DomainResult<()>;
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<ParkingSpot>>;
    async fn find_by_number(&self, number: &str) -> DomainResult<Option<ParkingSpot>>;
    async fn find_all(&self) -> DomainResult<Vec<ParkingSpot>>;
    async fn find_available(&self) -> DomainResult<Vec<ParkingSpot>>;
    async fn update_status(&self, id: &str, status: SpotStatus) -> DomainResult<()>;
}
