use crate::{
    entities::voucher::{self, Entity as VoucherEntity},
    errors::ServiceError,
    metrics::{outcome, VOUCHER_LOOKUPS},
};
use chrono::Utc;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

/// What the storefront learns about a voucher code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VoucherDiscount {
    /// Percentage off the cart total
    #[schema(example = 10)]
    pub discount: i16,
}

#[derive(Clone)]
pub struct VoucherService {
    db: Arc<DatabaseConnection>,
}

impl VoucherService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Looks up a redeemable voucher by its code
    #[instrument(skip(self))]
    pub async fn find_by_code(&self, code: &str) -> Result<VoucherDiscount, ServiceError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ServiceError::ValidationError(
                "Voucher code must not be empty!".to_string(),
            ));
        }

        let found = VoucherEntity::find()
            .filter(voucher::Column::Code.eq(code))
            .one(&*self.db)
            .await?
            .filter(|v| v.is_redeemable(Utc::now()));

        VOUCHER_LOOKUPS
            .with_label_values(&[outcome(found.is_some())])
            .inc();

        match found {
            Some(v) => {
                info!(code, discount = v.discount, "Voucher applied");
                Ok(VoucherDiscount {
                    discount: v.discount,
                })
            }
            None => Err(ServiceError::NotFound(format!("Voucher {} not found", code))),
        }
    }
}
