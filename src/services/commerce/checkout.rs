use crate::{
    entities::{order::Model as OrderModel, payment::Model as PaymentModel},
    errors::ServiceError,
    metrics::{CHECKOUTS_COMPLETED, ORDERS_CREATED, ORDER_LINES_CREATED, PAYMENTS_CREATED},
    services::{
        orders::{insert_order_lines, CreateOrderRequest, OrderLineRequest},
        payments::{insert_payment, CreatePaymentRequest},
    },
};
use chrono::Duration;
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Order lines and payment details submitted together
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub items: Vec<OrderLineRequest>,
    #[serde(flatten)]
    pub payment: CreatePaymentRequest,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResult {
    pub order_id: Uuid,
    pub orders: Vec<OrderModel>,
    pub payment: PaymentModel,
}

/// Creates order rows and their payment inside one database transaction
#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<DatabaseConnection>,
    payment_expires_in: Duration,
}

impl CheckoutService {
    pub fn new(db: Arc<DatabaseConnection>, payment_expires_in: Duration) -> Self {
        Self {
            db,
            payment_expires_in,
        }
    }

    #[instrument(skip(self, request), fields(lines = request.items.len()))]
    pub async fn checkout(
        &self,
        user_id: i32,
        request: CheckoutRequest,
    ) -> Result<CheckoutResult, ServiceError> {
        let CheckoutRequest { items, payment } = request;
        let order_request = CreateOrderRequest { items };
        order_request.validate_lines()?;
        payment.validate()?;

        let order_id = Uuid::new_v4();
        let txn = self.db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start checkout transaction");
            ServiceError::DatabaseError(e)
        })?;

        // Dropping the transaction on any early return rolls both writes back
        let orders = insert_order_lines(&txn, order_id, user_id, &order_request.items).await?;
        let payment =
            insert_payment(&txn, order_id, user_id, &payment, self.payment_expires_in).await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit checkout");
            ServiceError::DatabaseError(e)
        })?;

        ORDERS_CREATED.inc();
        ORDER_LINES_CREATED.inc_by(orders.len() as u64);
        PAYMENTS_CREATED.inc();
        CHECKOUTS_COMPLETED.inc();
        info!(order_id = %order_id, user_id, payment_id = payment.id, "Checkout committed");

        Ok(CheckoutResult {
            order_id,
            orders,
            payment,
        })
    }
}
