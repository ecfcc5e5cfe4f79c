//! Parking session repository interface

use async_trait::async_trait;

use super::model::ParkingSession;
use crate::domain::DomainResult;

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<ParkingSession>>;
    async fn find_active_for_user(&self, user_id: &str) -> DomainResult<Option<ParkingSession>>;
    /// All sessions of a user, newest first
    async fn find_by_user(&self, user_id: &str) -> DomainResult<Vec<ParkingSession>>;
    async fn find_active(&self) -> DomainResult<Vec<ParkingSession>>;
    async fn find_by_qr_code(&self, qr_code: &str) -> DomainResult<Option<ParkingSession>>;
}
