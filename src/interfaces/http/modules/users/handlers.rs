//! User API handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::dto::{BalanceDto, CreateUserRequest, ListUsersParams, SetActiveRequest, UserDto};
use crate::application::services::AccountService;
use crate::interfaces::http::common::{
    ok, ApiError, ApiResponse, ApiResult, PaginatedResponse, ValidatedJson,
};
use crate::interfaces::http::middleware::AuthenticatedUser;

#[derive(Clone)]
pub struct UserHandlerState {
    pub accounts: Arc<AccountService>,
}

#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "Users",
    security(("bearer_auth" = [])),
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = ApiResponse<UserDto>),
        (status = 409, description = "Phone already registered"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn create_user(
    State(state): State<UserHandlerState>,
    caller: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserDto>>), ApiError> {
    caller.require_admin()?;
    let user = state.accounts.register_user(request.into_domain()?).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(user.into()))))
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(ListUsersParams),
    responses(
        (status = 200, description = "User list", body = ApiResponse<PaginatedResponse<UserDto>>),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn list_users(
    State(state): State<UserHandlerState>,
    caller: AuthenticatedUser,
    Query(params): Query<ListUsersParams>,
) -> ApiResult<PaginatedResponse<UserDto>> {
    caller.require_admin()?;
    let result = state.accounts.list_users(params.into_domain()?).await?;
    ok(PaginatedResponse::from_result(result))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = ApiResponse<UserDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_user(
    State(state): State<UserHandlerState>,
    caller: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<UserDto> {
    caller.require_self_or_staff(&id)?;
    let user = state.accounts.get_user(&id).await?;
    ok(user.into())
}

#[utoipa::path(
    get,
    path = "/api/v1/users/phone/{phone}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("phone" = String, Path, description = "Phone number")),
    responses(
        (status = 200, description = "User details", body = ApiResponse<UserDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_user_by_phone(
    State(state): State<UserHandlerState>,
    caller: AuthenticatedUser,
    Path(phone): Path<String>,
) -> ApiResult<UserDto> {
    caller.require_staff()?;
    let user = state.accounts.find_by_phone(&phone).await?;
    ok(user.into())
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/balance",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Prepaid minutes", body = ApiResponse<BalanceDto>)
    )
)]
pub async fn get_balance(
    State(state): State<UserHandlerState>,
    caller: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<BalanceDto> {
    caller.require_self_or_staff(&id)?;
    let balance_minutes = state.accounts.balance(&id).await?;
    ok(BalanceDto {
        user_id: id,
        balance_minutes,
    })
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/active",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    request_body = SetActiveRequest,
    responses(
        (status = 200, description = "User updated", body = ApiResponse<UserDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn set_active(
    State(state): State<UserHandlerState>,
    caller: AuthenticatedUser,
    Path(id): Path<String>,
    Json(request): Json<SetActiveRequest>,
) -> ApiResult<UserDto> {
    caller.require_admin()?;
    let user = state.accounts.set_active(&id, request.is_active).await?;
    ok(user.into())
}
