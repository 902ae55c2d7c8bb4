use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::common::{no_content_response, success_response, Enveloped};
use crate::{
    auth::AuthUser,
    errors::ServiceError,
    services::commerce::{
        cart::CartView,
        cart_sessions::{AddCartItemRequest, UpdateCartItemRequest},
    },
    ApiResponse, AppState,
};

#[utoipa::path(
    get,
    path = "/api/v1/cart",
    summary = "Get cart",
    responses(
        (status = 200, description = "Current cart with totals", body = ApiResponse<CartView>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Enveloped<CartView>, ServiceError> {
    Ok(success_response(state.services.carts.view(auth_user.user_id)))
}

/// Add an item, merging with an existing line for the same item
#[utoipa::path(
    post,
    path = "/api/v1/cart/items",
    summary = "Add cart item",
    request_body = AddCartItemRequest,
    responses(
        (status = 200, description = "Updated cart", body = ApiResponse<CartView>),
        (status = 400, description = "Invalid quantity", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown item", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "cart"
)]
pub async fn add_item(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<AddCartItemRequest>,
) -> Result<Enveloped<CartView>, ServiceError> {
    let view = state
        .services
        .carts
        .add_item(auth_user.user_id, request)
        .await?;
    Ok(success_response(view))
}

/// Step a line's quantity up or down by one
#[utoipa::path(
    patch,
    path = "/api/v1/cart/items/{item_id}",
    summary = "Change cart item quantity",
    params(("item_id" = i32, Path, description = "Item id of the cart line")),
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Updated cart", body = ApiResponse<CartView>),
        (status = 400, description = "Quantity cannot go below one", body = crate::errors::ErrorResponse),
        (status = 404, description = "Item is not in the cart", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "cart"
)]
pub async fn update_item(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(item_id): Path<i32>,
    Json(request): Json<UpdateCartItemRequest>,
) -> Result<Enveloped<CartView>, ServiceError> {
    let view = state
        .services
        .carts
        .update_item(auth_user.user_id, item_id, request.change)?;
    Ok(success_response(view))
}

#[utoipa::path(
    delete,
    path = "/api/v1/cart/items/{item_id}",
    summary = "Remove cart item",
    params(("item_id" = i32, Path, description = "Item id of the cart line")),
    responses(
        (status = 200, description = "Updated cart", body = ApiResponse<CartView>),
        (status = 404, description = "Item is not in the cart", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "cart"
)]
pub async fn remove_item(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(item_id): Path<i32>,
) -> Result<Enveloped<CartView>, ServiceError> {
    let view = state
        .services
        .carts
        .remove_item(auth_user.user_id, item_id)?;
    Ok(success_response(view))
}

#[utoipa::path(
    delete,
    path = "/api/v1/cart",
    summary = "Clear cart",
    responses((status = 204, description = "Cart emptied")),
    security(("Bearer" = [])),
    tag = "cart"
)]
pub async fn clear_cart(State(state): State<AppState>, auth_user: AuthUser) -> StatusCode {
    state.services.carts.clear(auth_user.user_id);
    no_content_response()
}
