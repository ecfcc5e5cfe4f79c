//! Session API handlers
//!
//! Guards and admins drive the gate: scan, end and list active sessions.
//! Clients may start a session for themselves and read their own sessions.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::dto::{
    CancelSessionRequest, CostPreviewDto, EndSessionRequest, ScanRequest, ScanResponse,
    SessionDto, StartSessionRequest,
};
use crate::application::services::{SessionManager, StartSession};
use crate::interfaces::http::common::{
    ok, ApiError, ApiResponse, ApiResult, PageQuery, PaginatedResponse, ValidatedJson,
};
use crate::interfaces::http::middleware::AuthenticatedUser;

#[derive(Clone)]
pub struct SessionHandlerState {
    pub sessions: Arc<SessionManager>,
}

#[utoipa::path(
    post,
    path = "/api/v1/sessions",
    tag = "Sessions",
    security(("bearer_auth" = [])),
    request_body = StartSessionRequest,
    responses(
        (status = 201, description = "Session started", body = ApiResponse<SessionDto>),
        (status = 404, description = "User or spot not found"),
        (status = 409, description = "User already parked or spot unavailable")
    )
)]
pub async fn start_session(
    State(state): State<SessionHandlerState>,
    caller: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<StartSessionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SessionDto>>), ApiError> {
    let user_id = request.user_id.unwrap_or_else(|| caller.user_id.clone());
    caller.require_self_or_staff(&user_id)?;

    let session = state
        .sessions
        .start_session(StartSession {
            user_id,
            location: request.location,
            spot_id: request.spot_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(session.into()))))
}

#[utoipa::path(
    post,
    path = "/api/v1/sessions/{id}/end",
    tag = "Sessions",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Session ID")),
    request_body(content = EndSessionRequest, description = "Optional, defaults to balance"),
    responses(
        (status = 200, description = "Session completed", body = ApiResponse<SessionDto>),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Session is not active")
    )
)]
pub async fn end_session(
    State(state): State<SessionHandlerState>,
    caller: AuthenticatedUser,
    Path(id): Path<String>,
    body: Option<Json<EndSessionRequest>>,
) -> ApiResult<SessionDto> {
    caller.require_staff()?;
    let request = body.map(|Json(b)| b).unwrap_or_default();
    let method = request.payment_method()?;

    let session = state
        .sessions
        .end_session(&id, Some(caller.user_id), method)
        .await?;
    ok(session.into())
}

#[utoipa::path(
    post,
    path = "/api/v1/sessions/{id}/cancel",
    tag = "Sessions",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Session ID")),
    request_body(content = CancelSessionRequest, description = "Optional reason"),
    responses(
        (status = 200, description = "Session cancelled", body = ApiResponse<SessionDto>),
        (status = 403, description = "Admin role required"),
        (status = 409, description = "Session is not active")
    )
)]
pub async fn cancel_session(
    State(state): State<SessionHandlerState>,
    caller: AuthenticatedUser,
    Path(id): Path<String>,
    body: Option<Json<CancelSessionRequest>>,
) -> ApiResult<SessionDto> {
    caller.require_admin()?;
    let reason = body.and_then(|Json(b)| b.reason);
    let session = state.sessions.cancel_session(&id, reason).await?;
    ok(session.into())
}

#[utoipa::path(
    post,
    path = "/api/v1/sessions/scan",
    tag = "Sessions",
    security(("bearer_auth" = [])),
    request_body = ScanRequest,
    responses(
        (status = 200, description = "Session started or ended", body = ApiResponse<ScanResponse>),
        (status = 404, description = "No user with that QR code"),
        (status = 422, description = "Payload is not a user QR code")
    )
)]
pub async fn scan(
    State(state): State<SessionHandlerState>,
    caller: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<ScanRequest>,
) -> ApiResult<ScanResponse> {
    caller.require_staff()?;
    let outcome = state
        .sessions
        .handle_scan(&request.qr_code, &caller.user_id, &request.location, request.spot_id)
        .await?;
    ok(outcome.into())
}

#[utoipa::path(
    get,
    path = "/api/v1/sessions/{id}",
    tag = "Sessions",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session", body = ApiResponse<SessionDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_session(
    State(state): State<SessionHandlerState>,
    caller: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<SessionDto> {
    let session = state.sessions.get_session(&id).await?;
    caller.require_self_or_staff(&session.user_id)?;
    ok(session.into())
}

#[utoipa::path(
    get,
    path = "/api/v1/sessions/qr/{code}",
    tag = "Sessions",
    security(("bearer_auth" = [])),
    params(("code" = String, Path, description = "Session QR code")),
    responses(
        (status = 200, description = "Session", body = ApiResponse<SessionDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_session_by_qr(
    State(state): State<SessionHandlerState>,
    caller: AuthenticatedUser,
    Path(code): Path<String>,
) -> ApiResult<SessionDto> {
    caller.require_staff()?;
    let session = state.sessions.find_by_qr_code(&code).await?;
    ok(session.into())
}

#[utoipa::path(
    get,
    path = "/api/v1/sessions/{id}/cost-preview",
    tag = "Sessions",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Running cost", body = ApiResponse<CostPreviewDto>),
        (status = 409, description = "Session is not active")
    )
)]
pub async fn cost_preview(
    State(state): State<SessionHandlerState>,
    caller: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<CostPreviewDto> {
    let session = state.sessions.get_session(&id).await?;
    caller.require_self_or_staff(&session.user_id)?;
    let preview = state.sessions.preview_cost(&id).await?;
    ok(preview.into())
}

#[utoipa::path(
    get,
    path = "/api/v1/sessions/active",
    tag = "Sessions",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All active sessions", body = ApiResponse<Vec<SessionDto>>),
        (status = 403, description = "Guard or admin role required")
    )
)]
pub async fn active_sessions(
    State(state): State<SessionHandlerState>,
    caller: AuthenticatedUser,
) -> ApiResult<Vec<SessionDto>> {
    caller.require_staff()?;
    let sessions = state.sessions.active_sessions().await?;
    ok(sessions.into_iter().map(SessionDto::from).collect())
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/sessions",
    tag = "Sessions",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID"), PageQuery),
    responses(
        (status = 200, description = "Session history, newest first", body = ApiResponse<PaginatedResponse<SessionDto>>)
    )
)]
pub async fn user_sessions(
    State(state): State<SessionHandlerState>,
    caller: AuthenticatedUser,
    Path(user_id): Path<String>,
    Query(page): Query<PageQuery>,
) -> ApiResult<PaginatedResponse<SessionDto>> {
    caller.require_self_or_staff(&user_id)?;
    let result = state.sessions.sessions_for_user(&user_id, page.into()).await?;
    ok(PaginatedResponse::from_result(result))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/sessions/active",
    tag = "Sessions",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Active session or null", body = ApiResponse<SessionDto>)
    )
)]
pub async fn user_active_session(
    State(state): State<SessionHandlerState>,
    caller: AuthenticatedUser,
    Path(user_id): Path<String>,
) -> ApiResult<Option<SessionDto>> {
    caller.require_self_or_staff(&user_id)?;
    let session = state.sessions.active_session_for_user(&user_id).await?;
    ok(session.map(SessionDto::from))
}
