use crate::{
    entities::{
        item::{self, Entity as ItemEntity},
        order::{self, ActiveModel as OrderActiveModel, Entity as OrderEntity, Model as OrderModel},
    },
    errors::ServiceError,
    metrics::{ORDERS_CREATED, ORDER_LINES_CREATED},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// One requested line: the item id and how many units of it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct OrderLineRequest {
    /// Item id
    pub id: i32,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "An order needs at least one item"))]
    pub items: Vec<OrderLineRequest>,
}

impl CreateOrderRequest {
    /// Validates the envelope and every line
    pub fn validate_lines(&self) -> Result<(), ServiceError> {
        self.validate()?;
        for line in &self.items {
            line.validate()?;
        }
        Ok(())
    }
}

/// Writes one row per line, all sharing `order_id`. Runs on whatever
/// connection it is given so callers can compose it into a larger transaction.
pub(crate) async fn insert_order_lines<C>(
    conn: &C,
    order_id: Uuid,
    user_id: i32,
    lines: &[OrderLineRequest],
) -> Result<Vec<OrderModel>, ServiceError>
where
    C: ConnectionTrait,
{
    let wanted: HashSet<i32> = lines.iter().map(|line| line.id).collect();
    let found: HashSet<i32> = ItemEntity::find()
        .filter(item::Column::Id.is_in(wanted.iter().copied()))
        .all(conn)
        .await?
        .into_iter()
        .map(|item| item.id)
        .collect();

    if let Some(missing) = lines.iter().find(|line| !found.contains(&line.id)) {
        return Err(ServiceError::NotFound(format!(
            "Item {} not found",
            missing.id
        )));
    }

    let mut rows = Vec::with_capacity(lines.len());
    for line in lines {
        let row = OrderActiveModel {
            order_id: Set(order_id),
            user_id: Set(user_id),
            item_id: Set(line.id),
            quantity: Set(line.quantity),
            ..Default::default()
        }
        .insert(conn)
        .await
        .map_err(|e| {
            error!(error = %e, order_id = %order_id, item_id = line.id, "Failed to insert order line");
            ServiceError::DatabaseError(e)
        })?;
        rows.push(row);
    }

    Ok(rows)
}

/// Service for managing orders
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Records a purchase for `user_id`: one generated order id, one row per line
    #[instrument(skip(self, request), fields(lines = request.items.len()))]
    pub async fn create_order(
        &self,
        user_id: i32,
        request: CreateOrderRequest,
    ) -> Result<Vec<OrderModel>, ServiceError> {
        request.validate_lines()?;

        let order_id = Uuid::new_v4();
        let txn = self.db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for order creation");
            ServiceError::DatabaseError(e)
        })?;

        let rows = insert_order_lines(&txn, order_id, user_id, &request.items).await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit order creation transaction");
            ServiceError::DatabaseError(e)
        })?;

        ORDERS_CREATED.inc();
        ORDER_LINES_CREATED.inc_by(rows.len() as u64);
        info!(order_id = %order_id, user_id, lines = rows.len(), "Order created successfully");

        Ok(rows)
    }

    /// All order rows belonging to a user, newest first
    #[instrument(skip(self))]
    pub async fn list_orders(&self, user_id: i32) -> Result<Vec<OrderModel>, ServiceError> {
        let rows = OrderEntity::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .order_by_asc(order::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(rows)
    }

    /// Rows of one order. `owner` restricts the lookup to a single user;
    /// `None` is reserved for admin callers.
    #[instrument(skip(self))]
    pub async fn get_order(
        &self,
        order_id: Uuid,
        owner: Option<i32>,
    ) -> Result<Vec<OrderModel>, ServiceError> {
        let mut query = OrderEntity::find().filter(order::Column::OrderId.eq(order_id));
        if let Some(user_id) = owner {
            query = query.filter(order::Column::UserId.eq(user_id));
        }

        let rows = query.order_by_asc(order::Column::Id).all(&*self.db).await?;
        if rows.is_empty() {
            return Err(ServiceError::NotFound(format!("Order {} not found", order_id)));
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_item_list() {
        let request = CreateOrderRequest { items: vec![] };
        assert!(matches!(
            request.validate_lines(),
            Err(ServiceError::ValidationError(_))
        ));
    }

    #[test]
    fn rejects_zero_quantity_line() {
        let request = CreateOrderRequest {
            items: vec![
                OrderLineRequest { id: 1, quantity: 2 },
                OrderLineRequest { id: 2, quantity: 0 },
            ],
        };
        assert!(matches!(
            request.validate_lines(),
            Err(ServiceError::ValidationError(_))
        ));
    }

    #[test]
    fn accepts_wire_shape() {
        let request: CreateOrderRequest =
            serde_json::from_str(r#"{"items":[{"id":1,"quantity":2},{"id":2,"quantity":1}]}"#)
                .unwrap();
        assert!(request.validate_lines().is_ok());
        assert_eq!(request.items.len(), 2);
    }
}
