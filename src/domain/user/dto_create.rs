use super::UserRole;

#[derive(Debug, Clone)]
pub struct CreateUserDto {
    pub phone: String,
    pub name: String,
    pub email: Option<String>,
    pub role: Option<UserRole>,
    pub initial_balance_minutes: i64,
}
