use axum::extract::{Path, State};

use super::common::{success_response, Enveloped};
use crate::{errors::ServiceError, services::vouchers::VoucherDiscount, ApiResponse, AppState};

/// Discount percentage of a redeemable voucher
#[utoipa::path(
    get,
    path = "/api/v1/vouchers/{code}",
    summary = "Look up voucher",
    params(("code" = String, Path, description = "Voucher code as typed by the shopper")),
    responses(
        (status = 200, description = "Voucher is redeemable", body = ApiResponse<VoucherDiscount>),
        (status = 400, description = "Empty voucher code", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown, inactive or expired voucher", body = crate::errors::ErrorResponse),
    ),
    tag = "vouchers"
)]
pub async fn get_voucher(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Enveloped<VoucherDiscount>, ServiceError> {
    let voucher = state.services.vouchers.find_by_code(&code).await?;
    Ok(success_response(voucher))
}
