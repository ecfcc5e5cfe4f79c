//! User DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::domain::{CreateUserDto, GetUserDto, User, UserQrCode, UserRole};
use crate::interfaces::http::common::ApiError;
use crate::shared::PaginationParams;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    pub id: String,
    pub phone: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub balance_minutes: i64,
    /// Token a guard scans at the gate
    pub qr_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(u: User) -> Self {
        Self {
            qr_code: UserQrCode::new(u.phone.as_str()).to_string(),
            id: u.id,
            phone: u.phone,
            name: u.name,
            email: u.email,
            role: u.role.as_str().to_string(),
            is_active: u.is_active,
            balance_minutes: u.balance_minutes,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

fn parse_role(role: Option<&str>) -> Result<Option<UserRole>, ApiError> {
    match role {
        None => Ok(None),
        Some(r) => UserRole::from_str(r)
            .map(Some)
            .ok_or_else(|| ApiError::bad_request(format!("Unknown role '{}'", r))),
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(length(min = 6, max = 16))]
    pub phone: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: Option<String>,
    /// client (default), guard or admin
    pub role: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub initial_balance_minutes: i64,
}

impl CreateUserRequest {
    pub fn into_domain(self) -> Result<CreateUserDto, ApiError> {
        Ok(CreateUserDto {
            role: parse_role(self.role.as_deref())?,
            phone: self.phone,
            name: self.name,
            email: self.email,
            initial_balance_minutes: self.initial_balance_minutes,
        })
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListUsersParams {
    /// Matches name or phone
    pub search: Option<String>,
    /// client, guard or admin
    pub role: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    50
}

impl ListUsersParams {
    pub fn into_domain(self) -> Result<GetUserDto, ApiError> {
        Ok(GetUserDto {
            role: parse_role(self.role.as_deref())?,
            search: self.search.filter(|s| !s.trim().is_empty()),
            pagination: PaginationParams::new(self.page, self.limit),
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BalanceDto {
    pub user_id: String,
    pub balance_minutes: i64,
}
