use axum::{extract::State, Json};
use tracing::debug;

use super::common::{created_response, Enveloped};
use crate::{
    auth::AuthUser,
    errors::ServiceError,
    services::commerce::checkout::{CheckoutRequest, CheckoutResult},
    ApiResponse, AppState,
};

/// Order and payment in one step
#[utoipa::path(
    post,
    path = "/api/v1/checkout",
    summary = "Checkout",
    description = "Creates the order rows and their payment in a single transaction; either both are stored or neither is.",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Order and payment created", body = ApiResponse<CheckoutResult>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown item", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "checkout"
)]
pub async fn checkout(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CheckoutRequest>,
) -> Result<Enveloped<CheckoutResult>, ServiceError> {
    let result = state
        .services
        .checkout
        .checkout(auth_user.user_id, request)
        .await?;

    state.services.carts.clear(auth_user.user_id);
    debug!(user_id = auth_user.user_id, "Server-side cart cleared after checkout");

    Ok(created_response(result))
}
