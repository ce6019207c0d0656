use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{
    PaymentMethod, PaymentRequest, PaymentRequestDraft, PaymentTransaction, TransactionDraft,
    TransactionStatus, UserRole,
};
use crate::error::AppError;
use crate::handlers::caller::Caller;
use crate::services::{PaymentStats, RequestSettlement};
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct PayRequest {
    pub method: PaymentMethod,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StatusUpdateRequest {
    pub status: TransactionStatus,
    pub gateway_transaction_id: Option<String>,
    pub failure_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RequestDirection {
    Sent,
    #[default]
    Received,
}

#[derive(Debug, Deserialize)]
pub struct RequestListQuery {
    #[serde(default)]
    pub direction: RequestDirection,
}

#[utoipa::path(
    post,
    path = "/applications/{id}/pay",
    params(("id" = Uuid, Path, description = "Application id")),
    request_body = PayRequest,
    responses(
        (status = 200, description = "Application fee settled", body = PaymentTransaction),
        (status = 403, description = "Not the applicant"),
        (status = 409, description = "Fee already paid")
    ),
    tag = "Payments"
)]
pub async fn pay_application_fee(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(body): Json<PayRequest>,
) -> Result<Json<PaymentTransaction>, AppError> {
    let tx = state
        .services
        .payments
        .process_application_fee_payment(id, caller.identifier(), body.method)
        .await?;
    Ok(Json(tx))
}

#[utoipa::path(
    post,
    path = "/payments/transactions",
    request_body = TransactionDraft,
    responses(
        (status = 201, description = "Transaction created", body = PaymentTransaction),
        (status = 400, description = "Invalid amount or currency"),
        (status = 404, description = "Franchise not found")
    ),
    tag = "Payments"
)]
pub async fn create_transaction(
    State(state): State<AppState>,
    caller: Caller,
    Json(draft): Json<TransactionDraft>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = caller.user_id(&state).await?;
    let tx = state
        .services
        .payments
        .create_transaction(draft, user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(tx)))
}

#[utoipa::path(
    get,
    path = "/payments/transactions",
    responses((status = 200, description = "Caller's transactions", body = [PaymentTransaction])),
    tag = "Payments"
)]
pub async fn list_transactions(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<PaymentTransaction>>, AppError> {
    let user_id = caller.user_id(&state).await?;
    Ok(Json(
        state
            .services
            .payments
            .list_transactions_for_user(user_id)
            .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/payments/transactions/{id}",
    params(("id" = Uuid, Path, description = "Transaction id")),
    responses(
        (status = 200, description = "Transaction found", body = PaymentTransaction),
        (status = 403, description = "Caller is neither the payer nor an admin"),
        (status = 404, description = "Transaction not found")
    ),
    tag = "Payments"
)]
pub async fn get_transaction(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<PaymentTransaction>, AppError> {
    let user = caller.user(&state).await?;
    let tx = state.services.payments.get_transaction(id).await?;
    if tx.user_id != user.id && user.role != UserRole::Admin {
        return Err(AppError::Forbidden(
            "You do not have access to this transaction".to_string(),
        ));
    }
    Ok(Json(tx))
}

#[utoipa::path(
    put,
    path = "/payments/transactions/{id}/status",
    params(("id" = Uuid, Path, description = "Transaction id")),
    request_body = StatusUpdateRequest,
    responses(
        (status = 200, description = "Status updated", body = PaymentTransaction),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Transaction not found")
    ),
    tag = "Payments"
)]
pub async fn update_transaction_status(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(body): Json<StatusUpdateRequest>,
) -> Result<Json<PaymentTransaction>, AppError> {
    let admin = caller.admin(&state).await?;
    tracing::debug!(transaction_id = %id, admin_id = %admin.id, "Admin status update");
    let tx = state
        .services
        .payments
        .update_transaction_status(id, body.status, body.gateway_transaction_id, body.failure_reason)
        .await?;
    Ok(Json(tx))
}

#[utoipa::path(
    post,
    path = "/payments/requests",
    request_body = PaymentRequestDraft,
    responses(
        (status = 201, description = "Payment request created", body = PaymentRequest),
        (status = 400, description = "Invalid amount or title"),
        (status = 404, description = "Recipient or franchise not found")
    ),
    tag = "Payments"
)]
pub async fn create_payment_request(
    State(state): State<AppState>,
    caller: Caller,
    Json(draft): Json<PaymentRequestDraft>,
) -> Result<impl IntoResponse, AppError> {
    let from_user_id = caller.user_id(&state).await?;
    let request = state
        .services
        .payments
        .create_payment_request(draft, from_user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

#[utoipa::path(
    get,
    path = "/payments/requests",
    params(("direction" = Option<String>, Query, description = "`sent` or `received` (default)")),
    responses((status = 200, description = "Payment requests", body = [PaymentRequest])),
    tag = "Payments"
)]
pub async fn list_payment_requests(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<RequestListQuery>,
) -> Result<Json<Vec<PaymentRequest>>, AppError> {
    let user_id = caller.user_id(&state).await?;
    let payments = &state.services.payments;
    let requests = match query.direction {
        RequestDirection::Sent => payments.list_sent_requests(user_id).await?,
        RequestDirection::Received => payments.list_received_requests(user_id).await?,
    };
    Ok(Json(requests))
}

#[utoipa::path(
    get,
    path = "/payments/requests/{id}",
    params(("id" = Uuid, Path, description = "Payment request id")),
    responses(
        (status = 200, description = "Payment request found", body = PaymentRequest),
        (status = 403, description = "Caller is neither sender nor recipient")
    ),
    tag = "Payments"
)]
pub async fn get_payment_request(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<PaymentRequest>, AppError> {
    let user_id = caller.user_id(&state).await?;
    let request = state.services.payments.get_payment_request(id).await?;
    if request.from_user_id != user_id && request.to_user_id != user_id {
        return Err(AppError::Forbidden(
            "You are not a party to this payment request".to_string(),
        ));
    }
    Ok(Json(request))
}

#[utoipa::path(
    post,
    path = "/payments/requests/{id}/pay",
    params(("id" = Uuid, Path, description = "Payment request id")),
    request_body = PayRequest,
    responses(
        (status = 200, description = "Request paid", body = RequestSettlement),
        (status = 403, description = "Request not addressed to caller"),
        (status = 409, description = "Request already paid"),
        (status = 422, description = "Request cancelled")
    ),
    tag = "Payments"
)]
pub async fn pay_payment_request(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(body): Json<PayRequest>,
) -> Result<Json<RequestSettlement>, AppError> {
    let user_id = caller.user_id(&state).await?;
    let settlement = state
        .services
        .payments
        .pay_payment_request(id, user_id, body.method)
        .await?;
    Ok(Json(settlement))
}

#[utoipa::path(
    post,
    path = "/payments/requests/{id}/cancel",
    params(("id" = Uuid, Path, description = "Payment request id")),
    responses(
        (status = 200, description = "Request cancelled", body = PaymentRequest),
        (status = 403, description = "Caller did not send the request"),
        (status = 409, description = "Request already paid or cancelled")
    ),
    tag = "Payments"
)]
pub async fn cancel_payment_request(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<PaymentRequest>, AppError> {
    let user_id = caller.user_id(&state).await?;
    let request = state
        .services
        .payments
        .cancel_payment_request(id, user_id)
        .await?;
    Ok(Json(request))
}

#[utoipa::path(
    get,
    path = "/payments/stats",
    responses(
        (status = 200, description = "Transaction counts and settled volume", body = PaymentStats),
        (status = 403, description = "Caller is not an admin")
    ),
    tag = "Payments"
)]
pub async fn payment_stats(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<PaymentStats>, AppError> {
    caller.admin(&state).await?;
    Ok(Json(state.services.stats.payment_stats().await?))
}
