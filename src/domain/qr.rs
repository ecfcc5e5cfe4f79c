//! QR token formats
//!
//! Two distinct tokens exist and are never interchangeable:
//!
//! - [`UserQrCode`] `PARKING_USER_{phone}`: shown by a client, scanned by a
//!   guard to identify the user at the gate.
//! - [`SessionQrCode`] `PARKING_{userId}_{epochMillis}`: generated when a
//!   session opens and stored on it. Not secret; unique only as far as the
//!   millisecond timestamp is.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};

use crate::shared::DomainError;

const USER_PREFIX: &str = "PARKING_USER_";
const SESSION_PREFIX: &str = "PARKING_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserQrCode {
    pub phone: String,
}

impl UserQrCode {
    pub fn new(phone: impl Into<String>) -> Self {
        Self {
            phone: phone.into(),
        }
    }
}

impl fmt::Display for UserQrCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", USER_PREFIX, self.phone)
    }
}

impl FromStr for UserQrCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let phone = s
            .trim()
            .strip_prefix(USER_PREFIX)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| DomainError::Validation(format!("not a user QR code: {}", s)))?;
        Ok(Self::new(phone))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionQrCode {
    pub user_id: String,
    pub issued_at_millis: i64,
}

impl SessionQrCode {
    pub fn issue(user_id: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            issued_at_millis: at.timestamp_millis(),
        }
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.issued_at_millis).single()
    }
}

impl fmt::Display for SessionQrCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}_{}", SESSION_PREFIX, self.user_id, self.issued_at_millis)
    }
}

impl FromStr for SessionQrCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::Validation(format!("not a session QR code: {}", s));

        let s = s.trim();
        if s.starts_with(USER_PREFIX) {
            return Err(invalid());
        }
        let body = s.strip_prefix(SESSION_PREFIX).ok_or_else(invalid)?;
        // user ids may themselves contain '_', the timestamp never does
        let (user_id, millis) = body.rsplit_once('_').ok_or_else(invalid)?;
        if user_id.is_empty() {
            return Err(invalid());
        }
        let issued_at_millis = millis.parse::<i64>().map_err(|_| invalid())?;

        Ok(Self {
            user_id: user_id.to_string(),
            issued_at_millis,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_code_renders_and_parses() {
        let code = UserQrCode::new("+50499887766");
        assert_eq!(code.to_string(), "PARKING_USER_+50499887766");
        assert_eq!("PARKING_USER_+50499887766".parse::<UserQrCode>().unwrap(), code);
    }

    #[test]
    fn user_code_rejects_other_payloads() {
        assert!("PARKING_USER_".parse::<UserQrCode>().is_err());
        assert!("PARKING_u1_1700000000000".parse::<UserQrCode>().is_err());
        assert!("hello".parse::<UserQrCode>().is_err());
    }

    #[test]
    fn session_code_embeds_user_and_time() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let code = SessionQrCode::issue("user_42", at);
        assert_eq!(code.to_string(), "PARKING_user_42_1700000000123");

        let parsed: SessionQrCode = "PARKING_user_42_1700000000123".parse().unwrap();
        assert_eq!(parsed.user_id, "user_42");
        assert_eq!(parsed.issued_at(), Some(at));
    }

    #[test]
    fn session_code_is_not_a_user_code() {
        assert!("PARKING_USER_99887766".parse::<SessionQrCode>().is_err());
        assert!("PARKING_u1_notatime".parse::<SessionQrCode>().is_err());
        assert!("PARKING__1700000000000".parse::<SessionQrCode>().is_err());
    }
}
