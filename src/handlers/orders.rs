use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use super::common::{created_response, owner_scope, success_response, Enveloped};
use crate::{
    auth::AuthUser,
    entities::order::Model as OrderLine,
    errors::ServiceError,
    services::orders::CreateOrderRequest,
    ApiResponse, AppState,
};

/// Create order
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    summary = "Create order",
    description = "Writes one row per requested item. Every row shares a freshly generated orderId.",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created successfully", body = ApiResponse<Vec<OrderLine>>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown item", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CreateOrderRequest>,
) -> Result<Enveloped<Vec<OrderLine>>, ServiceError> {
    let rows = state
        .services
        .orders
        .create_order(auth_user.user_id, request)
        .await?;
    Ok(created_response(rows))
}

/// Order rows of the calling user
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    summary = "List orders",
    responses(
        (status = 200, description = "Orders retrieved successfully", body = ApiResponse<Vec<OrderLine>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Enveloped<Vec<OrderLine>>, ServiceError> {
    let rows = state.services.orders.list_orders(auth_user.user_id).await?;
    Ok(success_response(rows))
}

/// Rows sharing one order id
#[utoipa::path(
    get,
    path = "/api/v1/orders/{order_id}",
    summary = "Get order",
    params(("order_id" = Uuid, Path, description = "Shared order id")),
    responses(
        (status = 200, description = "Order retrieved successfully", body = ApiResponse<Vec<OrderLine>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(order_id): Path<Uuid>,
) -> Result<Enveloped<Vec<OrderLine>>, ServiceError> {
    let rows = state
        .services
        .orders
        .get_order(order_id, owner_scope(&auth_user))
        .await?;
    Ok(success_response(rows))
}
