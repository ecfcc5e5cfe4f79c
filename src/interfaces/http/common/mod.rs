//! Response envelope, pagination and error mapping shared by all handlers

mod validated_json;

pub use validated_json::{ValidatedJson, ValidatedJsonRejection};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::DomainError;
use crate::shared::{PaginatedResult, PaginationParams};

/// Standard API response envelope
///
/// Success: `{"success": true, "data": {...}}`,
/// failure: `{"success": false, "data": null, "error": "..."}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Page query parameters
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Page number, 1-based. Default: 1
    #[serde(default = "default_page")]
    pub page: u32,
    /// Items per page (1-100). Default: 50
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    50
}

impl From<PageQuery> for PaginationParams {
    fn from(q: PageQuery) -> Self {
        PaginationParams::new(q.page, q.limit)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl<T> PaginatedResponse<T> {
    pub fn from_result<D>(result: PaginatedResult<D>) -> Self
    where
        T: From<D>,
    {
        Self {
            items: result.items.into_iter().map(T::from).collect(),
            total: result.total,
            page: result.page,
            limit: result.limit,
            total_pages: result.total_pages,
        }
    }
}

/// Handler error: an HTTP status plus the message placed in the envelope
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        let status = match &e {
            DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
            DomainError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
            DomainError::Storage(detail) => {
                tracing::error!(error = detail.as_str(), "Storage failure while handling request");
                return Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal storage error");
            }
            e if e.is_state_conflict() => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::<()>::error(self.message))).into_response()
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_statuses() {
        let cases = [
            (DomainError::not_found("User", "id", "u1"), StatusCode::NOT_FOUND),
            (
                DomainError::SessionAlreadyActive { user_id: "u1".into() },
                StatusCode::CONFLICT,
            ),
            (
                DomainError::CannotCancelCompleted { transaction_id: "t1".into() },
                StatusCode::CONFLICT,
            ),
            (DomainError::Conflict("phone".into()), StatusCode::CONFLICT),
            (DomainError::Validation("bad".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (DomainError::Forbidden("no".into()), StatusCode::FORBIDDEN),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn storage_detail_is_not_exposed() {
        let err = ApiError::from(DomainError::Storage("disk I/O error at /var/db".into()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message.contains("/var/db"));
    }

    #[test]
    fn page_query_is_clamped() {
        let params: PaginationParams = PageQuery { page: 0, limit: 500 }.into();
        assert_eq!(params.page, 1);
        assert_eq!(params.limit, 100);
    }
}
