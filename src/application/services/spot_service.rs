//! Parking spot administration

use std::sync::Arc;

use tracing::info;

use crate::domain::{DomainError, DomainResult, ParkingSpot, RepositoryProvider, SpotStatus, SpotType};
use crate::shared::require_non_empty;

pub struct SpotService {
    repos: Arc<dyn RepositoryProvider>,
}

impl SpotService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    pub async fn create_spot(
        &self,
        number: &str,
        location: &str,
        spot_type: SpotType,
    ) -> DomainResult<ParkingSpot> {
        require_non_empty("number", number)?;
        require_non_empty("location", location)?;
        if self.repos.spots().find_by_number(number.trim()).await?.is_some() {
            return Err(DomainError::Conflict(format!("spot number {} already exists", number.trim())));
        }

        let spot = ParkingSpot::new(number.trim(), location.trim(), spot_type);
        self.repos.spots().save(spot.clone()).await?;

        info!(spot_id = spot.id.as_str(), number = spot.number.as_str(), "Parking spot created");
        Ok(spot)
    }

    pub async fn get_spot(&self, spot_id: &str) -> DomainResult<ParkingSpot> {
        self.repos
            .spots()
            .find_by_id(spot_id)
            .await?
            .ok_or_else(|| DomainError::not_found("ParkingSpot", "id", spot_id))
    }

    pub async fn list_spots(&self) -> DomainResult<Vec<ParkingSpot>> {
        self.repos.spots().find_all().await
    }

    pub async fn available_spots(&self) -> DomainResult<Vec<ParkingSpot>> {
        self.repos.spots().find_available().await
    }

    /// Administrative status change. `occupied` belongs to sessions and an
    /// occupied spot keeps its status until its session closes.
    pub async fn set_status(&self, spot_id: &str, status: SpotStatus) -> DomainResult<ParkingSpot> {
        if status == SpotStatus::Occupied {
            return Err(DomainError::Validation(
                "occupied is set by opening a session".into(),
            ));
        }
        let mut spot = self.get_spot(spot_id).await?;
        if spot.is_occupied {
            return Err(DomainError::Conflict(format!(
                "spot {} is occupied by session {}",
                spot.number,
                spot.current_session_id.as_deref().unwrap_or("unknown")
            )));
        }

        self.repos.spots().update_status(spot_id, status).await?;
        spot.status = status;

        info!(spot_id, %status, "Parking spot status changed");
        Ok(spot)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::ParkingSession;
    use crate::infrastructure::storage::InMemoryRepositoryProvider;

    #[tokio::test]
    async fn create_and_list() {
        let svc = SpotService::new(Arc::new(InMemoryRepositoryProvider::new()));
        svc.create_spot("B2", "Level 2", SpotType::Regular).await.unwrap();
        svc.create_spot("A1", "Level 1", SpotType::Electric).await.unwrap();

        let spots = svc.list_spots().await.unwrap();
        assert_eq!(spots.len(), 2);
        assert_eq!(spots[0].number, "A1");

        let err = svc.create_spot("A1", "Level 1", SpotType::Regular).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn maintenance_hides_spot() {
        let svc = SpotService::new(Arc::new(InMemoryRepositoryProvider::new()));
        let spot = svc.create_spot("A1", "Level 1", SpotType::Regular).await.unwrap();

        svc.set_status(&spot.id, SpotStatus::Maintenance).await.unwrap();
        assert!(svc.available_spots().await.unwrap().is_empty());

        svc.set_status(&spot.id, SpotStatus::Available).await.unwrap();
        assert_eq!(svc.available_spots().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn occupied_spot_status_is_locked() {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let svc = SpotService::new(repos.clone());
        let spot = svc.create_spot("A1", "Level 1", SpotType::Regular).await.unwrap();

        let session = ParkingSession::start("u1", "p", "Ana", "Gate", Some(spot.id.clone()), Utc::now());
        repos.ledger().open_session(&session).await.unwrap();

        let err = svc.set_status(&spot.id, SpotStatus::Maintenance).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert!(matches!(
            svc.set_status(&spot.id, SpotStatus::Occupied).await,
            Err(DomainError::Validation(_))
        ));
    }
}
