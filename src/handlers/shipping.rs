use axum::{extract::State, Json};

use super::common::{success_response, Enveloped};
use crate::{
    errors::ServiceError,
    services::shipping::{CityOption, CourierCostRequest, CourierOption},
    ApiResponse, AppState,
};

/// Destination cities for the checkout select box
#[utoipa::path(
    get,
    path = "/api/v1/raja-ongkir/cities",
    summary = "List destination cities",
    description = "Cities the shipping provider can deliver to, as value/label pairs",
    responses(
        (status = 200, description = "Cities retrieved successfully", body = ApiResponse<Vec<CityOption>>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 502, description = "Shipping provider failed", body = crate::errors::ErrorResponse),
    ),
    tag = "shipping"
)]
pub async fn list_cities(
    State(state): State<AppState>,
) -> Result<Enveloped<Vec<CityOption>>, ServiceError> {
    let cities = state.services.shipping.cities().await?;
    Ok(success_response(cities))
}

/// Courier quotes for a destination and parcel weight
#[utoipa::path(
    post,
    path = "/api/v1/raja-ongkir/costs",
    summary = "Quote courier costs",
    request_body = CourierCostRequest,
    responses(
        (status = 200, description = "Courier options quoted", body = ApiResponse<Vec<CourierOption>>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 502, description = "Shipping provider failed", body = crate::errors::ErrorResponse),
    ),
    tag = "shipping"
)]
pub async fn courier_costs(
    State(state): State<AppState>,
    Json(request): Json<CourierCostRequest>,
) -> Result<Enveloped<Vec<CourierOption>>, ServiceError> {
    let options = state.services.shipping.courier_costs(request).await?;
    Ok(success_response(options))
}
