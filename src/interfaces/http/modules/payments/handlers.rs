//! Payment API handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::dto::{
    CardPaymentRequestDto, PurchaseRequestDto, ReasonRequest, RefundRequest, TransactionDto,
};
use crate::application::services::{CardPaymentRequest, PaymentManager, PurchaseRequest};
use crate::domain::PurchaseMethod;
use crate::interfaces::http::common::{
    ok, ApiError, ApiResponse, ApiResult, PageQuery, PaginatedResponse, ValidatedJson,
};
use crate::interfaces::http::middleware::AuthenticatedUser;

#[derive(Clone)]
pub struct PaymentHandlerState {
    pub payments: Arc<PaymentManager>,
}

type Created<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

#[utoipa::path(
    post,
    path = "/api/v1/transactions/purchase",
    tag = "Transactions",
    security(("bearer_auth" = [])),
    request_body = PurchaseRequestDto,
    responses(
        (status = 201, description = "Purchase recorded; cash is credited at once, transfer waits for confirmation", body = ApiResponse<TransactionDto>),
        (status = 404, description = "User or package not found")
    )
)]
pub async fn purchase(
    State(state): State<PaymentHandlerState>,
    caller: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<PurchaseRequestDto>,
) -> Created<TransactionDto> {
    let method = request.purchase_method()?;
    let user_id = request.user_id.unwrap_or_else(|| caller.user_id.clone());
    caller.require_self_or_staff(&user_id)?;
    if method == PurchaseMethod::Cash {
        caller.require_staff()?;
    }

    let processed_by = caller.role.is_staff().then(|| caller.user_id.clone());
    let tx = state
        .payments
        .process_purchase(PurchaseRequest {
            user_id,
            package_id: request.package_id,
            method,
            reference: request.reference,
            processed_by,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(tx.into()))))
}

#[utoipa::path(
    post,
    path = "/api/v1/transactions/{id}/confirm",
    tag = "Transactions",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Transaction ID")),
    responses(
        (status = 200, description = "Completed and credited (idempotent)", body = ApiResponse<TransactionDto>),
        (status = 409, description = "Transaction was cancelled or failed")
    )
)]
pub async fn confirm(
    State(state): State<PaymentHandlerState>,
    caller: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<TransactionDto> {
    caller.require_admin()?;
    let tx = state.payments.confirm_transaction(&id, &caller.user_id).await?;
    ok(tx.into())
}

#[utoipa::path(
    post,
    path = "/api/v1/transactions/{id}/cancel",
    tag = "Transactions",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Transaction ID")),
    request_body(content = ReasonRequest, description = "Optional reason"),
    responses(
        (status = 200, description = "Cancelled", body = ApiResponse<TransactionDto>),
        (status = 409, description = "Completed transactions cannot be cancelled")
    )
)]
pub async fn cancel(
    State(state): State<PaymentHandlerState>,
    caller: AuthenticatedUser,
    Path(id): Path<String>,
    body: Option<Json<ReasonRequest>>,
) -> ApiResult<TransactionDto> {
    let existing = state.payments.get_transaction(&id).await?;
    caller.require_self_or_staff(&existing.user_id)?;

    let reason = body.and_then(|Json(b)| b.reason);
    let tx = state.payments.cancel_transaction(&id, reason).await?;
    ok(tx.into())
}

#[utoipa::path(
    get,
    path = "/api/v1/transactions/{id}",
    tag = "Transactions",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Transaction ID")),
    responses(
        (status = 200, description = "Transaction", body = ApiResponse<TransactionDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_transaction(
    State(state): State<PaymentHandlerState>,
    caller: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<TransactionDto> {
    let tx = state.payments.get_transaction(&id).await?;
    caller.require_self_or_staff(&tx.user_id)?;
    ok(tx.into())
}

#[utoipa::path(
    get,
    path = "/api/v1/transactions/pending",
    tag = "Transactions",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Pending transactions, oldest first", body = ApiResponse<Vec<TransactionDto>>)
    )
)]
pub async fn pending(
    State(state): State<PaymentHandlerState>,
    caller: AuthenticatedUser,
) -> ApiResult<Vec<TransactionDto>> {
    caller.require_admin()?;
    let txs = state.payments.pending_transactions().await?;
    ok(txs.into_iter().map(TransactionDto::from).collect())
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/transactions",
    tag = "Transactions",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID"), PageQuery),
    responses(
        (status = 200, description = "Transaction history, newest first", body = ApiResponse<PaginatedResponse<TransactionDto>>)
    )
)]
pub async fn user_transactions(
    State(state): State<PaymentHandlerState>,
    caller: AuthenticatedUser,
    Path(user_id): Path<String>,
    Query(page): Query<PageQuery>,
) -> ApiResult<PaginatedResponse<TransactionDto>> {
    caller.require_self_or_staff(&user_id)?;
    let result = state.payments.transactions_for_user(&user_id, page.into()).await?;
    ok(PaginatedResponse::from_result(result))
}

#[utoipa::path(
    post,
    path = "/api/v1/transactions/card",
    tag = "Transactions",
    security(("bearer_auth" = [])),
    request_body = CardPaymentRequestDto,
    responses(
        (status = 201, description = "Pending card transaction", body = ApiResponse<TransactionDto>),
        (status = 409, description = "Payment intent already registered")
    )
)]
pub async fn create_card_payment(
    State(state): State<PaymentHandlerState>,
    caller: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<CardPaymentRequestDto>,
) -> Created<TransactionDto> {
    let user_id = request.user_id.unwrap_or_else(|| caller.user_id.clone());
    caller.require_self_or_staff(&user_id)?;

    let tx = state
        .payments
        .create_card_payment(CardPaymentRequest {
            user_id,
            package_id: request.package_id,
            payment_intent_id: request.payment_intent_id,
            payment_method_id: request.payment_method_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(tx.into()))))
}

#[utoipa::path(
    post,
    path = "/api/v1/transactions/card/{intent_id}/complete",
    tag = "Transactions",
    security(("bearer_auth" = [])),
    params(("intent_id" = String, Path, description = "Processor payment intent ID")),
    responses(
        (status = 200, description = "Completed and credited (idempotent)", body = ApiResponse<TransactionDto>),
        (status = 404, description = "Unknown payment intent")
    )
)]
pub async fn complete_card_payment(
    State(state): State<PaymentHandlerState>,
    caller: AuthenticatedUser,
    Path(intent_id): Path<String>,
) -> ApiResult<TransactionDto> {
    caller.require_admin()?;
    let tx = state.payments.complete_card_payment(&intent_id).await?;
    ok(tx.into())
}

#[utoipa::path(
    post,
    path = "/api/v1/transactions/card/{intent_id}/fail",
    tag = "Transactions",
    security(("bearer_auth" = [])),
    params(("intent_id" = String, Path, description = "Processor payment intent ID")),
    request_body(content = ReasonRequest, description = "Optional processor message"),
    responses(
        (status = 200, description = "Marked failed", body = ApiResponse<TransactionDto>),
        (status = 409, description = "Transaction is no longer pending")
    )
)]
pub async fn fail_card_payment(
    State(state): State<PaymentHandlerState>,
    caller: AuthenticatedUser,
    Path(intent_id): Path<String>,
    body: Option<Json<ReasonRequest>>,
) -> ApiResult<TransactionDto> {
    caller.require_admin()?;
    let reason = body.and_then(|Json(b)| b.reason);
    let tx = state.payments.fail_card_payment(&intent_id, reason).await?;
    ok(tx.into())
}

#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/refunds",
    tag = "Transactions",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    request_body = RefundRequest,
    responses(
        (status = 201, description = "Minutes credited", body = ApiResponse<TransactionDto>),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn grant_refund(
    State(state): State<PaymentHandlerState>,
    caller: AuthenticatedUser,
    Path(user_id): Path<String>,
    ValidatedJson(request): ValidatedJson<RefundRequest>,
) -> Created<TransactionDto> {
    caller.require_admin()?;
    let tx = state
        .payments
        .grant_refund(&user_id, request.minutes, request.reason, &caller.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(tx.into()))))
}
