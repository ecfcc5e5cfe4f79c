//! User accounts

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::domain::{
    CreateUserDto, DomainError, DomainResult, GetUserDto, RepositoryProvider, User,
};
use crate::shared::{require_non_empty, validate_phone, PaginatedResult};

pub struct AccountService {
    repos: Arc<dyn RepositoryProvider>,
}

impl AccountService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    pub async fn register_user(&self, dto: CreateUserDto) -> DomainResult<User> {
        let phone = dto.phone.trim().to_string();
        validate_phone(&phone)?;
        require_non_empty("name", &dto.name)?;
        if dto.initial_balance_minutes < 0 {
            return Err(DomainError::Validation("initial balance must not be negative".into()));
        }
        if self.repos.users().find_by_phone(&phone).await?.is_some() {
            return Err(DomainError::Conflict(format!("phone {} already registered", phone)));
        }

        let now = Utc::now();
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            phone,
            name: dto.name.trim().to_string(),
            email: dto.email.filter(|e| !e.trim().is_empty()),
            role: dto.role.unwrap_or_default(),
            is_active: true,
            balance_minutes: dto.initial_balance_minutes,
            created_at: now,
            updated_at: now,
        };
        self.repos.users().create(user.clone()).await?;

        info!(user_id = user.id.as_str(), role = user.role.as_str(), "User registered");
        Ok(user)
    }

    pub async fn get_user(&self, user_id: &str) -> DomainResult<User> {
        self.repos
            .users()
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", "id", user_id))
    }

    pub async fn find_by_phone(&self, phone: &str) -> DomainResult<User> {
        self.repos
            .users()
            .find_by_phone(phone.trim())
            .await?
            .ok_or_else(|| DomainError::not_found("User", "phone", phone.trim()))
    }

    pub async fn list_users(&self, dto: GetUserDto) -> DomainResult<PaginatedResult<User>> {
        self.repos.users().list(dto).await
    }

    pub async fn set_active(&self, user_id: &str, is_active: bool) -> DomainResult<User> {
        let user = self
            .repos
            .users()
            .set_active(user_id, is_active)
            .await?
            .ok_or_else(|| DomainError::not_found("User", "id", user_id))?;
        info!(user_id, is_active, "User active flag changed");
        Ok(user)
    }

    /// Prepaid minutes left
    pub async fn balance(&self, user_id: &str) -> DomainResult<i64> {
        Ok(self.get_user(user_id).await?.balance_minutes)
    }
}
