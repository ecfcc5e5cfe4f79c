use chrono::{DateTime, Utc};

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserRole {
    #[default]
    Client,
    Guard,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Guard => "guard",
            Self::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "client" => Some(Self::Client),
            "guard" => Some(Self::Guard),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Staff roles may open and close sessions for other users.
    pub fn is_staff(&self) -> bool {
        matches!(self, Self::Guard | Self::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User model
///
/// `balance_minutes` is the prepaid parking allowance. It is always
/// expressed in minutes; monetary values never flow into it directly.
#[derive(Clone, Debug)]
pub struct User {
    pub id: String,
    pub phone: String,
    pub name: String,
    pub email: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub balance_minutes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Balance after debiting `minutes`, clamped at zero, and the part of
    /// the debit that the balance could not cover.
    pub fn balance_after_debit(&self, minutes: i64) -> (i64, i64) {
        let remaining = self.balance_minutes - minutes.max(0);
        if remaining < 0 {
            (0, -remaining)
        } else {
            (remaining, 0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(balance: i64) -> User {
        User {
            id: "u1".into(),
            phone: "+50499887766".into(),
            name: "Ana".into(),
            email: None,
            role: UserRole::Client,
            is_active: true,
            balance_minutes: balance,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn debit_within_balance() {
        assert_eq!(user(60).balance_after_debit(45), (15, 0));
    }

    #[test]
    fn debit_beyond_balance_clamps_to_zero() {
        assert_eq!(user(10).balance_after_debit(30), (0, 20));
    }

    #[test]
    fn role_strings() {
        assert_eq!(UserRole::from_str("guard"), Some(UserRole::Guard));
        assert_eq!(UserRole::Admin.as_str(), "admin");
        assert!(UserRole::from_str("viewer").is_none());
        assert!(UserRole::Guard.is_staff());
        assert!(!UserRole::Client.is_staff());
    }
}
