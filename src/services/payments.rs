use crate::{
    entities::{
        order::{self, Entity as OrderEntity},
        payment::{
            self, ActiveModel as PaymentActiveModel, Entity as PaymentEntity,
            Model as PaymentModel,
        },
    },
    errors::ServiceError,
    metrics::PAYMENTS_CREATED,
};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Pricing and delivery details submitted once an order exists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    /// Voucher percentage, 0 when no voucher was applied
    #[serde(default)]
    #[validate(range(min = 0, max = 100, message = "Discount must be between 0 and 100"))]
    pub discount: i16,
    #[validate(custom = "validate_non_negative")]
    pub delivery_cost: Decimal,
    #[validate(length(min = 1, message = "Delivery address is required"))]
    pub delivery_address: String,
    #[validate(length(min = 1, message = "Courier is required"))]
    pub courier: String,
    #[validate(custom = "validate_non_negative")]
    pub final_price: Decimal,
}

fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut err = ValidationError::new("non_negative");
        err.message = Some("Amount must not be negative".into());
        return Err(err);
    }
    Ok(())
}

/// Inserts the payment row for an order owned by `user_id`. The order must
/// exist for that user and must not already carry an active payment.
pub(crate) async fn insert_payment<C>(
    conn: &C,
    order_id: Uuid,
    user_id: i32,
    request: &CreatePaymentRequest,
    expires_in: Duration,
) -> Result<PaymentModel, ServiceError>
where
    C: ConnectionTrait,
{
    let owned = OrderEntity::find()
        .filter(order::Column::OrderId.eq(order_id))
        .filter(order::Column::UserId.eq(user_id))
        .one(conn)
        .await?;
    if owned.is_none() {
        return Err(ServiceError::NotFound(format!("Order {} not found", order_id)));
    }

    let existing = PaymentEntity::find()
        .filter(payment::Column::OrderId.eq(order_id))
        .filter(payment::Column::Active.eq(true))
        .one(conn)
        .await?;
    if existing.is_some() {
        warn!(order_id = %order_id, "Rejected duplicate payment");
        return Err(duplicate_payment(order_id));
    }

    let payment = PaymentActiveModel {
        order_id: Set(order_id),
        user_id: Set(user_id),
        discount: Set(request.discount),
        delivery_cost: Set(request.delivery_cost),
        delivery_address: Set(request.delivery_address.trim().to_string()),
        courier: Set(request.courier.clone()),
        final_price: Set(request.final_price),
        expired_time: Set(Utc::now() + expires_in),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(|e| insert_error(order_id, e))?;

    Ok(payment)
}

/// A concurrent submission that slipped past the duplicate check trips the
/// unique index on active payments and is reported like the check would.
fn insert_error(order_id: Uuid, e: DbErr) -> ServiceError {
    if let Some(SqlErr::UniqueConstraintViolation(_)) = e.sql_err() {
        warn!(order_id = %order_id, "Concurrent duplicate payment rejected by the database");
        return duplicate_payment(order_id);
    }
    error!(error = %e, order_id = %order_id, "Failed to insert payment");
    ServiceError::DatabaseError(e)
}

fn duplicate_payment(order_id: Uuid) -> ServiceError {
    ServiceError::Conflict(format!("Order {} already has a payment", order_id))
}

/// Service for recording payments against orders
#[derive(Clone)]
pub struct PaymentService {
    db: Arc<DatabaseConnection>,
    expires_in: Duration,
}

impl PaymentService {
    pub fn new(db: Arc<DatabaseConnection>, expires_in: Duration) -> Self {
        Self { db, expires_in }
    }

    pub fn expires_in(&self) -> Duration {
        self.expires_in
    }

    #[instrument(skip(self, request), fields(order_id = %order_id))]
    pub async fn create_payment(
        &self,
        order_id: Uuid,
        user_id: i32,
        request: CreatePaymentRequest,
    ) -> Result<PaymentModel, ServiceError> {
        request.validate()?;

        let txn = self.db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for payment creation");
            ServiceError::DatabaseError(e)
        })?;

        let payment = insert_payment(&txn, order_id, user_id, &request, self.expires_in).await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit payment transaction");
            ServiceError::DatabaseError(e)
        })?;

        PAYMENTS_CREATED.inc();
        info!(
            order_id = %order_id,
            payment_id = payment.id,
            final_price = %payment.final_price,
            "Payment recorded"
        );

        Ok(payment)
    }

    /// Payments of one user, newest first
    #[instrument(skip(self))]
    pub async fn list_payments(&self, user_id: i32) -> Result<Vec<PaymentModel>, ServiceError> {
        let payments = PaymentEntity::find()
            .filter(payment::Column::UserId.eq(user_id))
            .order_by_desc(payment::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(payments)
    }

    /// The active payment of an order; `owner = None` skips the ownership filter
    #[instrument(skip(self))]
    pub async fn get_payment(
        &self,
        order_id: Uuid,
        owner: Option<i32>,
    ) -> Result<PaymentModel, ServiceError> {
        let mut query = PaymentEntity::find()
            .filter(payment::Column::OrderId.eq(order_id))
            .filter(payment::Column::Active.eq(true));
        if let Some(user_id) = owner {
            query = query.filter(payment::Column::UserId.eq(user_id));
        }

        query
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Payment for order {} not found", order_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        db,
        entities::{item, user},
    };
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    async fn database_with_order(order_id: Uuid) -> DatabaseConnection {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".into(),
            "p4Yx8Qm2Lr6Tz1Wn5Kb9Hc3Vd7Jf0Gs2Pe6Ru4Io8Ua1Sy5Dx9Fk3Lz7Mq0Nw2Ob6Pc4".into(),
            "127.0.0.1".into(),
            8080,
            "test".into(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        let conn = db::establish_connection_from_app_config(&cfg).await.unwrap();
        db::run_migrations(&conn).await.unwrap();

        user::ActiveModel {
            id: Set(1),
            name: Set("Sari".into()),
            email: Set("sari@example.com".into()),
            role: Set(user::ROLE_USER.into()),
            ..Default::default()
        }
        .insert(&conn)
        .await
        .unwrap();
        item::ActiveModel {
            id: Set(1),
            category_id: Set(None),
            name: Set("Batik Shirt".into()),
            description: Set(None),
            price: Set(dec!(25000)),
            stock: Set(10),
            weight: Set(1000),
            image_url: Set(None),
            ..Default::default()
        }
        .insert(&conn)
        .await
        .unwrap();
        order::ActiveModel {
            order_id: Set(order_id),
            user_id: Set(1),
            item_id: Set(1),
            quantity: Set(1),
            ..Default::default()
        }
        .insert(&conn)
        .await
        .unwrap();
        conn
    }

    fn payment_row(order_id: Uuid, active: bool) -> PaymentActiveModel {
        PaymentActiveModel {
            order_id: Set(order_id),
            user_id: Set(1),
            discount: Set(0),
            delivery_cost: Set(dec!(10000)),
            delivery_address: Set("Jl. Malioboro 1".into()),
            courier: Set("JNE REG".into()),
            final_price: Set(dec!(35000)),
            expired_time: Set(Utc::now() + Duration::hours(24)),
            active: Set(active),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn database_rejects_second_active_payment_as_conflict() {
        let order_id = Uuid::new_v4();
        let conn = database_with_order(order_id).await;

        payment_row(order_id, true).insert(&conn).await.unwrap();
        // Bypasses the duplicate check the way a concurrent request would
        let err = payment_row(order_id, true).insert(&conn).await.unwrap_err();
        assert_matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)));
        assert_matches!(insert_error(order_id, err), ServiceError::Conflict(_));
    }

    #[tokio::test]
    async fn inactive_payments_do_not_block_a_new_one() {
        let order_id = Uuid::new_v4();
        let conn = database_with_order(order_id).await;

        payment_row(order_id, false).insert(&conn).await.unwrap();
        payment_row(order_id, false).insert(&conn).await.unwrap();
        let payment = insert_payment(&conn, order_id, 1, &request(), Duration::hours(24))
            .await
            .unwrap();
        assert!(payment.active);

        let again = insert_payment(&conn, order_id, 1, &request(), Duration::hours(24)).await;
        assert_matches!(again, Err(ServiceError::Conflict(_)));
    }

    fn request() -> CreatePaymentRequest {
        CreatePaymentRequest {
            discount: 10,
            delivery_cost: dec!(20000),
            delivery_address: "Jl. Malioboro 1".into(),
            courier: "JNE REG".into(),
            final_price: dec!(110000),
        }
    }

    #[test]
    fn accepts_camel_case_body() {
        let body = r#"{"discount":10,"deliveryCost":20000,"deliveryAddress":"Jl. Malioboro 1","courier":"JNE REG","finalPrice":110000}"#;
        let parsed: CreatePaymentRequest = serde_json::from_str(body).unwrap();
        assert_eq!(parsed, request());
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn rejects_discount_above_hundred() {
        let mut req = request();
        req.discount = 101;
        assert!(req.validate().is_err());
    }

    #[test]
    fn rejects_negative_amounts_and_blank_courier() {
        let mut req = request();
        req.final_price = dec!(-1);
        assert!(req.validate().is_err());

        let mut req = request();
        req.courier.clear();
        assert!(req.validate().is_err());
    }
}
