use super::cart::{Cart, CartAction, CartLine, CartView, QuantityChange};
use crate::{errors::ServiceError, services::catalog::CatalogService};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItemRequest {
    pub item_id: i32,
    #[validate(range(min = 1, max = 1000, message = "Quantity must be between 1 and 1000"))]
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    pub change: QuantityChange,
}

/// One cart per signed-in user, kept in memory for the life of the process
#[derive(Clone)]
pub struct CartSessions {
    carts: Arc<DashMap<i32, Cart>>,
    catalog: CatalogService,
}

impl CartSessions {
    pub fn new(catalog: CatalogService) -> Self {
        Self {
            carts: Arc::new(DashMap::new()),
            catalog,
        }
    }

    fn apply(&self, user_id: i32, action: CartAction) -> Result<CartView, ServiceError> {
        let mut cart = self.carts.entry(user_id).or_default();
        cart.dispatch(action)?;
        Ok(CartView::from(&*cart))
    }

    pub fn view(&self, user_id: i32) -> CartView {
        self.carts
            .get(&user_id)
            .map(|cart| CartView::from(&*cart))
            .unwrap_or_else(|| CartView::from(&Cart::new()))
    }

    /// Adds an item at its current catalog price
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: i32,
        request: AddCartItemRequest,
    ) -> Result<CartView, ServiceError> {
        request.validate()?;
        let item = self.catalog.get_item(request.item_id).await?;

        let view = self.apply(
            user_id,
            CartAction::Add(CartLine {
                item_id: item.id,
                name: item.name,
                unit_price: item.price,
                quantity: request.quantity,
            }),
        )?;
        debug!(user_id, item_id = request.item_id, "Cart line added");
        Ok(view)
    }

    pub fn update_item(
        &self,
        user_id: i32,
        item_id: i32,
        change: QuantityChange,
    ) -> Result<CartView, ServiceError> {
        let view = self.apply(user_id, CartAction::Update { item_id, change })?;
        debug!(user_id, item_id, %change, "Cart line quantity changed");
        Ok(view)
    }

    pub fn remove_item(&self, user_id: i32, item_id: i32) -> Result<CartView, ServiceError> {
        self.apply(user_id, CartAction::Remove(item_id))
    }

    pub fn clear(&self, user_id: i32) {
        self.carts.remove(&user_id);
    }
}
