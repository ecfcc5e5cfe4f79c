use async_trait::async_trait;

use super::{GetUserDto, User};
use crate::domain::DomainResult;
use crate::shared::PaginatedResult;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: User) -> DomainResult<()>;

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<User>>;
    async fn find_by_phone(&self, phone: &str) -> DomainResult<Option<User>>;
    async fn list(&self, dto: GetUserDto) -> DomainResult<PaginatedResult<User>>;

    async fn set_active(&self, id: &str, is_active: bool) -> DomainResult<Option<User>>;
}
