//! Bearer JWT authentication and role checks

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::domain::UserRole;
use crate::infrastructure::crypto::jwt::{verify_token, JwtConfig, TokenClaims};
use crate::interfaces::http::common::ApiError;

#[derive(Clone)]
pub struct AuthState {
    pub jwt_config: Arc<JwtConfig>,
}

impl AuthState {
    pub fn new(jwt_config: JwtConfig) -> Self {
        Self {
            jwt_config: Arc::new(jwt_config),
        }
    }
}

/// Caller identity taken from a verified token
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub name: String,
    pub role: UserRole,
}

impl AuthenticatedUser {
    fn from_claims(claims: TokenClaims) -> Option<Self> {
        let role = claims.user_role()?;
        Some(Self {
            user_id: claims.sub,
            name: claims.name,
            role,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Admin role required"))
        }
    }

    pub fn require_staff(&self) -> Result<(), ApiError> {
        if self.role.is_staff() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Guard or admin role required"))
        }
    }

    /// Clients may only act on their own account; staff on any.
    pub fn require_self_or_staff(&self, user_id: &str) -> Result<(), ApiError> {
        if self.role.is_staff() || self.user_id == user_id {
            Ok(())
        } else {
            Err(ApiError::forbidden("Cannot act on another user's account"))
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))
    }
}

fn bearer_token(request: &Request<Body>) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
}

pub async fn auth_middleware(
    State(auth): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(&request) else {
        return ApiError::unauthorized("Missing authentication token").into_response();
    };

    let user = match verify_token(token, &auth.jwt_config) {
        Ok(claims) => AuthenticatedUser::from_claims(claims),
        Err(e) => {
            tracing::debug!(error = %e, "Rejected bearer token");
            return ApiError::unauthorized("Invalid or expired token").into_response();
        }
    };
    let Some(user) = user else {
        return ApiError::unauthorized("Token carries an unknown role").into_response();
    };

    request.extensions_mut().insert(user);
    next.run(request).await
}
