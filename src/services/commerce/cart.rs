//! Session-scoped shopping cart.
//!
//! The cart is plain data driven by [`CartAction`] commands. Every mutation
//! goes through [`Cart::dispatch`], which is where the line invariants live:
//! quantities never drop below one and lines only disappear through
//! [`CartAction::Remove`] or [`CartAction::Clear`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// One product in the cart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub item_id: i32,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl CartLine {
    pub fn total_price(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QuantityChange {
    Increment,
    Decrement,
}

/// Largest quantity a single line may hold; order rows store it as `i32`
pub const MAX_LINE_QUANTITY: u32 = i32::MAX as u32;

/// Every way a cart can change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    /// Adds a line, or raises the quantity of a line already present
    Add(CartLine),
    Update {
        item_id: i32,
        change: QuantityChange,
    },
    Remove(i32),
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("Item {0} is not in the cart")]
    LineNotFound(i32),

    #[error("Quantity of item {0} cannot go below 1; remove the line instead")]
    BelowMinimum(i32),

    #[error("Item {0} must be added with a quantity of at least 1")]
    ZeroQuantity(i32),

    #[error("Quantity of item {0} cannot exceed {max}", max = MAX_LINE_QUANTITY)]
    QuantityTooLarge(i32),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch(&mut self, action: CartAction) -> Result<(), CartError> {
        match action {
            CartAction::Add(line) => {
                if line.quantity == 0 {
                    return Err(CartError::ZeroQuantity(line.item_id));
                }
                match self.position(line.item_id) {
                    Some(index) => {
                        let merged = raise(line.item_id, self.lines[index].quantity, line.quantity)?;
                        self.lines[index].quantity = merged;
                    }
                    None => {
                        raise(line.item_id, 0, line.quantity)?;
                        self.lines.push(line);
                    }
                }
            }
            CartAction::Update { item_id, change } => {
                let index = self
                    .position(item_id)
                    .ok_or(CartError::LineNotFound(item_id))?;
                let line = &mut self.lines[index];
                match change {
                    QuantityChange::Increment => {
                        line.quantity = raise(item_id, line.quantity, 1)?;
                    }
                    QuantityChange::Decrement if line.quantity <= 1 => {
                        return Err(CartError::BelowMinimum(item_id))
                    }
                    QuantityChange::Decrement => line.quantity -= 1,
                }
            }
            CartAction::Remove(item_id) => {
                let index = self
                    .position(item_id)
                    .ok_or(CartError::LineNotFound(item_id))?;
                self.lines.remove(index);
            }
            CartAction::Clear => self.lines.clear(),
        }
        Ok(())
    }

    fn position(&self, item_id: i32) -> Option<usize> {
        self.lines.iter().position(|line| line.item_id == item_id)
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, item_id: i32) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.item_id == item_id)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Σ unit price × quantity
    pub fn total_price(&self) -> Decimal {
        self.lines.iter().map(CartLine::total_price).sum()
    }

    /// Σ quantity, saturating at `u32::MAX`
    pub fn total_quantity(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |total, line| total.saturating_add(line.quantity))
    }
}

fn raise(item_id: i32, current: u32, by: u32) -> Result<u32, CartError> {
    current
        .checked_add(by)
        .filter(|quantity| *quantity <= MAX_LINE_QUANTITY)
        .ok_or(CartError::QuantityTooLarge(item_id))
}

/// Wire view of a cart with derived totals filled in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub total_price: Decimal,
    pub total_quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    #[serde(flatten)]
    pub line: CartLine,
    pub total_price: Decimal,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            lines: cart
                .lines()
                .iter()
                .map(|line| CartLineView {
                    total_price: line.total_price(),
                    line: line.clone(),
                })
                .collect(),
            total_price: cart.total_price(),
            total_quantity: cart.total_quantity(),
        }
    }
}
