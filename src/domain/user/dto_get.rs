use super::UserRole;
use crate::shared::PaginationParams;

#[derive(Debug, Clone, Default)]
pub struct GetUserDto {
    pub search: Option<String>,
    pub role: Option<UserRole>,
    pub pagination: PaginationParams,
}
