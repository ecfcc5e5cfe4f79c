//! Package API handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::dto::{CreatePackageRequest, ListPackagesParams, PackageDto};
use crate::application::services::PackageService;
use crate::interfaces::http::common::{ok, ApiError, ApiResponse, ApiResult, ValidatedJson};
use crate::interfaces::http::middleware::AuthenticatedUser;

#[derive(Clone)]
pub struct PackageHandlerState {
    pub packages: Arc<PackageService>,
}

#[utoipa::path(
    get,
    path = "/api/v1/packages",
    tag = "Packages",
    security(("bearer_auth" = [])),
    params(ListPackagesParams),
    responses((status = 200, description = "Purchasable packages", body = ApiResponse<Vec<PackageDto>>))
)]
pub async fn list_packages(
    State(state): State<PackageHandlerState>,
    caller: AuthenticatedUser,
    Query(params): Query<ListPackagesParams>,
) -> ApiResult<Vec<PackageDto>> {
    let packages = if params.include_inactive {
        caller.require_admin()?;
        state.packages.list_all().await?
    } else {
        state.packages.list_active().await?
    };
    ok(packages.into_iter().map(PackageDto::from).collect())
}

#[utoipa::path(
    get,
    path = "/api/v1/packages/{id}",
    tag = "Packages",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Package ID")),
    responses(
        (status = 200, description = "Package", body = ApiResponse<PackageDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_package(
    State(state): State<PackageHandlerState>,
    _caller: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<PackageDto> {
    let package = state.packages.get_package(&id).await?;
    ok(package.into())
}

#[utoipa::path(
    post,
    path = "/api/v1/packages",
    tag = "Packages",
    security(("bearer_auth" = [])),
    request_body = CreatePackageRequest,
    responses(
        (status = 201, description = "Package created", body = ApiResponse<PackageDto>),
        (status = 422, description = "Validation error")
    )
)]
pub async fn create_package(
    State(state): State<PackageHandlerState>,
    caller: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<CreatePackageRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PackageDto>>), ApiError> {
    caller.require_admin()?;
    let package = state
        .packages
        .create_package(&request.name, request.minutes, request.price_cents, request.currency)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(package.into()))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/packages/{id}",
    tag = "Packages",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Package ID")),
    responses(
        (status = 200, description = "Package deactivated", body = ApiResponse<PackageDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn deactivate_package(
    State(state): State<PackageHandlerState>,
    caller: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<PackageDto> {
    caller.require_admin()?;
    let package = state.packages.deactivate(&id).await?;
    ok(package.into())
}
