//! Spot API handlers. Reads are open to any authenticated user.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::dto::{CreateSpotRequest, SetSpotStatusRequest, SpotDto};
use crate::application::services::SpotService;
use crate::interfaces::http::common::{ok, ApiError, ApiResponse, ApiResult, ValidatedJson};
use crate::interfaces::http::middleware::AuthenticatedUser;

#[derive(Clone)]
pub struct SpotHandlerState {
    pub spots: Arc<SpotService>,
}

#[utoipa::path(
    post,
    path = "/api/v1/spots",
    tag = "Spots",
    security(("bearer_auth" = [])),
    request_body = CreateSpotRequest,
    responses(
        (status = 201, description = "Spot created", body = ApiResponse<SpotDto>),
        (status = 409, description = "Spot number already exists")
    )
)]
pub async fn create_spot(
    State(state): State<SpotHandlerState>,
    caller: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<CreateSpotRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SpotDto>>), ApiError> {
    caller.require_admin()?;
    let spot_type = request.spot_type()?;
    let spot = state
        .spots
        .create_spot(&request.number, &request.location, spot_type)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(spot.into()))))
}

#[utoipa::path(
    get,
    path = "/api/v1/spots",
    tag = "Spots",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "All spots", body = ApiResponse<Vec<SpotDto>>))
)]
pub async fn list_spots(
    State(state): State<SpotHandlerState>,
    _caller: AuthenticatedUser,
) -> ApiResult<Vec<SpotDto>> {
    let spots = state.spots.list_spots().await?;
    ok(spots.into_iter().map(SpotDto::from).collect())
}

#[utoipa::path(
    get,
    path = "/api/v1/spots/available",
    tag = "Spots",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Spots a session can open on", body = ApiResponse<Vec<SpotDto>>))
)]
pub async fn available_spots(
    State(state): State<SpotHandlerState>,
    _caller: AuthenticatedUser,
) -> ApiResult<Vec<SpotDto>> {
    let spots = state.spots.available_spots().await?;
    ok(spots.into_iter().map(SpotDto::from).collect())
}

#[utoipa::path(
    get,
    path = "/api/v1/spots/{id}",
    tag = "Spots",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Spot ID")),
    responses(
        (status = 200, description = "Spot", body = ApiResponse<SpotDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_spot(
    State(state): State<SpotHandlerState>,
    _caller: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<SpotDto> {
    let spot = state.spots.get_spot(&id).await?;
    ok(spot.into())
}

#[utoipa::path(
    put,
    path = "/api/v1/spots/{id}/status",
    tag = "Spots",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Spot ID")),
    request_body = SetSpotStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<SpotDto>),
        (status = 409, description = "Spot is occupied"),
        (status = 422, description = "occupied cannot be set by hand")
    )
)]
pub async fn set_spot_status(
    State(state): State<SpotHandlerState>,
    caller: AuthenticatedUser,
    Path(id): Path<String>,
    Json(request): Json<SetSpotStatusRequest>,
) -> ApiResult<SpotDto> {
    caller.require_admin()?;
    let spot = state.spots.set_status(&id, request.status()?).await?;
    ok(spot.into())
}
