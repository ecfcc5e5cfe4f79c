//! Minute package repository interface

use async_trait::async_trait;

use super::model::MinutePackage;
use crate::domain::DomainResult;

#[async_trait]
pub trait PackageRepository: Send + Sync {
    async fn save(&self, package: MinutePackage) -> DomainResult<()>;
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<MinutePackage>>;
    async fn find_all(&self) -> DomainResult<Vec<MinutePackage>>;
    async fn find_active(&self) -> DomainResult<Vec<MinutePackage>>;
    async fn set_active(&self, id: &str, is_active: bool) -> DomainResult<()>;
    async fn count(&self) -> DomainResult<u64>;
}
