//! JWT Token handling
//!
//! Tokens are issued by the identity provider that shares the configured
//! secret. This service only verifies them; `create_token` exists for the
//! CLI and tests.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::domain::UserRole;

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    /// Secret key for signing tokens
    pub secret: String,
    /// Token expiration time in hours
    pub expiration_hours: i64,
    /// Issuer claim
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "change-me-in-production".to_string(),
            expiration_hours: 24,
            issuer: "parkhub".to_string(),
        }
    }
}

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Display name
    pub name: String,
    /// User role
    pub role: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Issuer
    pub iss: String,
}

impl TokenClaims {
    pub fn new(user_id: &str, name: &str, role: UserRole, config: &JwtConfig, now: DateTime<Utc>) -> Self {
        let exp = now + Duration::hours(config.expiration_hours);

        Self {
            sub: user_id.to_string(),
            name: name.to_string(),
            role: role.as_str().to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: config.issuer.clone(),
        }
    }

    /// Unknown role strings yield `None`
    pub fn user_role(&self) -> Option<UserRole> {
        UserRole::from_str(&self.role)
    }
}

pub fn create_token(
    user_id: &str,
    name: &str,
    role: UserRole,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = TokenClaims::new(user_id, name, role, config, Utc::now());

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Verify signature, expiry and issuer
pub fn verify_token(
    token: &str,
    config: &JwtConfig,
) -> Result<TokenClaims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    validation.set_issuer(&[&config.issuer]);

    let token_data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret".into(),
            expiration_hours: 1,
            issuer: "parkhub-test".into(),
        }
    }

    #[test]
    fn token_round_trip() {
        let token = create_token("u1", "Ana", UserRole::Guard, &config()).unwrap();
        let claims = verify_token(&token, &config()).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.name, "Ana");
        assert_eq!(claims.user_role(), Some(UserRole::Guard));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = create_token("u1", "Ana", UserRole::Client, &config()).unwrap();
        let other = JwtConfig {
            secret: "other".into(),
            ..config()
        };
        assert!(verify_token(&token, &other).is_err());
    }

    #[test]
    fn wrong_issuer_is_rejected() {
        let token = create_token("u1", "Ana", UserRole::Client, &config()).unwrap();
        let other = JwtConfig {
            issuer: "someone-else".into(),
            ..config()
        };
        assert!(verify_token(&token, &other).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let cfg = config();
        let claims = TokenClaims::new(
            "u1",
            "Ana",
            UserRole::Admin,
            &cfg,
            Utc::now() - Duration::hours(3),
        );
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(cfg.secret.as_bytes()),
        )
        .unwrap();
        assert!(verify_token(&token, &cfg).is_err());
    }
}
