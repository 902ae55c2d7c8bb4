use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use super::common::{created_response, owner_scope, success_response, Enveloped};
use crate::{
    auth::AuthUser,
    entities::payment::Model as Payment,
    errors::ServiceError,
    services::payments::CreatePaymentRequest,
    ApiResponse, AppState,
};

/// Record the payment for an existing order
#[utoipa::path(
    post,
    path = "/api/v1/payments/{order_id}",
    summary = "Create payment",
    description = "Stores pricing and delivery details for an order. The payment starts unpaid and expires after the configured window.",
    params(("order_id" = Uuid, Path, description = "Order id returned by order creation")),
    request_body = CreatePaymentRequest,
    responses(
        (status = 201, description = "Payment recorded", body = ApiResponse<Payment>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Order already has an active payment", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "payments"
)]
pub async fn create_payment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(order_id): Path<Uuid>,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<Enveloped<Payment>, ServiceError> {
    let payment = state
        .services
        .payments
        .create_payment(order_id, auth_user.user_id, request)
        .await?;
    Ok(created_response(payment))
}

#[utoipa::path(
    get,
    path = "/api/v1/payments",
    summary = "List payments",
    responses(
        (status = 200, description = "Payments retrieved successfully", body = ApiResponse<Vec<Payment>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "payments"
)]
pub async fn list_payments(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Enveloped<Vec<Payment>>, ServiceError> {
    let payments = state
        .services
        .payments
        .list_payments(auth_user.user_id)
        .await?;
    Ok(success_response(payments))
}

#[utoipa::path(
    get,
    path = "/api/v1/payments/{order_id}",
    summary = "Get payment",
    params(("order_id" = Uuid, Path, description = "Order id the payment belongs to")),
    responses(
        (status = 200, description = "Payment retrieved successfully", body = ApiResponse<Payment>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Payment not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "payments"
)]
pub async fn get_payment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(order_id): Path<Uuid>,
) -> Result<Enveloped<Payment>, ServiceError> {
    let payment = state
        .services
        .payments
        .get_payment(order_id, owner_scope(&auth_user))
        .await?;
    Ok(success_response(payment))
}
