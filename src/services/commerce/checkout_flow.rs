//! Client-side checkout orchestration.
//!
//! [`CheckoutFlow`] owns the shopper's [`Cart`] and walks it through the
//! storefront API: destinations, voucher, courier quote, then the order and
//! payment calls. Prices are always derived from the current cart, discount
//! and courier, never cached.

use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, instrument, warn};

use super::{
    cart::{Cart, CartAction, CartError},
    checkout::{CheckoutRequest, CheckoutResult},
};
use crate::{
    client::{ClientError, StorefrontApi},
    services::{
        orders::{CreateOrderRequest, OrderLineRequest},
        payments::CreatePaymentRequest,
        shipping::{CityOption, CourierCostRequest, CourierOption},
    },
};

pub const EMPTY_VOUCHER_MESSAGE: &str = "Voucher code must not be empty!";

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("{}", EMPTY_VOUCHER_MESSAGE)]
    EmptyVoucher,

    #[error("Destination list has not been loaded yet")]
    DestinationsNotLoaded,

    #[error("Unknown destination {0}")]
    UnknownDestination(String),

    #[error("Unknown courier option {0}")]
    UnknownCourier(String),

    #[error("Cannot finish order: {0}")]
    NotReady(&'static str),

    #[error("Order response contained no rows")]
    EmptyOrder,

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Api(#[from] ClientError),
}

/// The last problem shown to the shopper
#[derive(Debug, Clone, PartialEq)]
pub enum FlowNotice {
    /// Raised locally, no request was made
    Validation(String),
    /// Error body returned by the server, verbatim
    Server { status: u16, payload: Value },
    /// The request never got an answer
    Transport(String),
}

impl From<&CheckoutError> for FlowNotice {
    fn from(err: &CheckoutError) -> Self {
        match err {
            CheckoutError::Api(ClientError::Api { status, payload }) => FlowNotice::Server {
                status: *status,
                payload: payload.clone(),
            },
            CheckoutError::Api(other) => FlowNotice::Transport(other.to_string()),
            other => FlowNotice::Validation(other.to_string()),
        }
    }
}

pub struct CheckoutFlow<A> {
    api: A,
    cart: Cart,
    item_weight_grams: u32,
    destinations: Option<Vec<CityOption>>,
    voucher_input: String,
    discount: i16,
    city: Option<CityOption>,
    address: String,
    courier_options: Vec<CourierOption>,
    courier: Option<CourierOption>,
    notice: Option<FlowNotice>,
}

impl<A: StorefrontApi> CheckoutFlow<A> {
    pub fn new(api: A, cart: Cart, item_weight_grams: u32) -> Self {
        Self {
            api,
            cart,
            item_weight_grams,
            destinations: None,
            voucher_input: String::new(),
            discount: 0,
            city: None,
            address: String::new(),
            courier_options: Vec::new(),
            courier: None,
            notice: None,
        }
    }

    fn record<T>(&mut self, result: Result<T, CheckoutError>) -> Result<T, CheckoutError> {
        if let Err(err) = &result {
            warn!(error = %err, "Checkout step failed");
            self.notice = Some(FlowNotice::from(err));
        }
        result
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Applies a cart mutation; totals follow automatically
    pub fn dispatch(&mut self, action: CartAction) -> Result<(), CheckoutError> {
        let result = self.cart.dispatch(action).map_err(CheckoutError::from);
        self.record(result)
    }

    pub fn notice(&self) -> Option<&FlowNotice> {
        self.notice.as_ref()
    }

    pub fn discount(&self) -> i16 {
        self.discount
    }

    pub fn city(&self) -> Option<&CityOption> {
        self.city.as_ref()
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn courier(&self) -> Option<&CourierOption> {
        self.courier.as_ref()
    }

    pub fn courier_options(&self) -> &[CourierOption] {
        &self.courier_options
    }

    pub fn destinations(&self) -> Option<&[CityOption]> {
        self.destinations.as_deref()
    }

    #[instrument(skip(self))]
    pub async fn load_destinations(&mut self) -> Result<&[CityOption], CheckoutError> {
        let result = self.api.cities().await.map_err(CheckoutError::from);
        let cities = self.record(result)?;
        info!(count = cities.len(), "Destinations loaded");
        let cities = self.destinations.insert(cities);
        Ok(cities.as_slice())
    }

    pub fn set_voucher_input(&mut self, code: impl Into<String>) {
        self.voucher_input = code.into();
    }

    /// Looks up the typed voucher. An empty code fails locally without a request;
    /// the input is cleared once a lookup has been attempted.
    #[instrument(skip(self))]
    pub async fn apply_voucher(&mut self) -> Result<i16, CheckoutError> {
        let code = self.voucher_input.trim().to_string();
        if code.is_empty() {
            return self.record(Err(CheckoutError::EmptyVoucher));
        }

        let result = self.api.voucher(&code).await.map_err(CheckoutError::from);
        self.voucher_input.clear();
        let voucher = self.record(result)?;

        self.notice = None;
        self.discount = voucher.discount;
        info!(code = %code, discount = voucher.discount, "Voucher applied");
        Ok(voucher.discount)
    }

    /// Picks a destination from the loaded list. Switching to another city
    /// drops the chosen courier and its quotes.
    pub fn select_destination(&mut self, city_id: &str) -> Result<&CityOption, CheckoutError> {
        let found = match &self.destinations {
            None => Err(CheckoutError::DestinationsNotLoaded),
            Some(cities) => cities
                .iter()
                .find(|city| city.value == city_id)
                .cloned()
                .ok_or_else(|| CheckoutError::UnknownDestination(city_id.to_string())),
        };
        let city = self.record(found)?;

        if self.city.as_ref() != Some(&city) {
            self.courier = None;
            self.courier_options.clear();
        }
        Ok(&*self.city.insert(city))
    }

    pub fn set_address(&mut self, address: impl Into<String>) {
        self.address = address.into();
    }

    /// Parcel weight sent to the courier quote: units in cart × weight per unit
    pub fn total_weight(&self) -> u32 {
        self.cart.total_quantity().saturating_mul(self.item_weight_grams)
    }

    #[instrument(skip(self))]
    pub async fn fetch_courier_options(&mut self) -> Result<&[CourierOption], CheckoutError> {
        let destination = match &self.city {
            Some(city) => city.value.clone(),
            None => return self.record(Err(CheckoutError::NotReady("choose a destination city"))),
        };
        if self.cart.is_empty() {
            return self.record(Err(CheckoutError::NotReady("the cart is empty")));
        }

        let request = CourierCostRequest {
            destination,
            weight: self.total_weight(),
        };
        let result = self
            .api
            .courier_costs(&request)
            .await
            .map_err(CheckoutError::from);
        self.courier_options = self.record(result)?;
        Ok(self.courier_options.as_slice())
    }

    pub fn choose_courier(&mut self, name: &str) -> Result<&CourierOption, CheckoutError> {
        let found = self
            .courier_options
            .iter()
            .find(|option| option.name == name)
            .cloned()
            .ok_or_else(|| CheckoutError::UnknownCourier(name.to_string()));
        let option = self.record(found)?;
        Ok(&*self.courier.insert(option))
    }

    /// Amount the voucher takes off the cart total
    pub fn discount_amount(&self) -> Decimal {
        self.cart.total_price() * Decimal::from(self.discount) / Decimal::from(100)
    }

    /// total × (1 − discount/100) + courier cost
    pub fn final_price(&self) -> Decimal {
        let delivery = self
            .courier
            .as_ref()
            .map_or(Decimal::ZERO, |courier| courier.cost);
        self.cart.total_price() - self.discount_amount() + delivery
    }

    /// Cart has lines and a city, address and courier are all set
    pub fn can_finish(&self) -> bool {
        self.readiness().is_ok()
    }

    fn readiness(&self) -> Result<&CourierOption, CheckoutError> {
        if self.cart.is_empty() {
            return Err(CheckoutError::NotReady("the cart is empty"));
        }
        if self.city.is_none() {
            return Err(CheckoutError::NotReady("choose a destination city"));
        }
        if self.address.trim().is_empty() {
            return Err(CheckoutError::NotReady("enter a delivery address"));
        }
        self.courier
            .as_ref()
            .ok_or(CheckoutError::NotReady("choose a courier"))
    }

    fn order_lines(&self) -> Result<Vec<OrderLineRequest>, CheckoutError> {
        self.cart
            .lines()
            .iter()
            .map(|line| {
                let quantity = i32::try_from(line.quantity)
                    .map_err(|_| CartError::QuantityTooLarge(line.item_id))?;
                Ok(OrderLineRequest {
                    id: line.item_id,
                    quantity,
                })
            })
            .collect()
    }

    fn payment_request(&self, courier: &CourierOption) -> CreatePaymentRequest {
        CreatePaymentRequest {
            discount: self.discount,
            delivery_cost: courier.cost,
            delivery_address: self.address.trim().to_string(),
            courier: courier.name.clone(),
            final_price: self.final_price(),
        }
    }

    fn complete(&mut self, receipt: CheckoutResult) -> CheckoutResult {
        info!(order_id = %receipt.order_id, "Checkout finished");
        self.cart = Cart::new();
        self.courier = None;
        self.courier_options.clear();
        self.notice = None;
        receipt
    }

    /// Creates the order, then the payment for it. When the payment call
    /// fails the order stays on the server without a payment and the cart is
    /// left as it was.
    #[instrument(skip(self))]
    pub async fn finish_order(&mut self) -> Result<CheckoutResult, CheckoutError> {
        let ready = self.readiness().cloned();
        let courier = self.record(ready)?;
        let lines = self.order_lines();
        let items = self.record(lines)?;
        let payment_request = self.payment_request(&courier);
        let order_request = CreateOrderRequest { items };

        let result = self.submit_in_two_calls(&order_request, &payment_request).await;
        let receipt = self.record(result)?;
        Ok(self.complete(receipt))
    }

    async fn submit_in_two_calls(
        &self,
        order_request: &CreateOrderRequest,
        payment_request: &CreatePaymentRequest,
    ) -> Result<CheckoutResult, CheckoutError> {
        let orders = self.api.create_order(order_request).await?;
        let order_id = orders
            .first()
            .map(|row| row.order_id)
            .ok_or(CheckoutError::EmptyOrder)?;

        let payment = self.api.create_payment(order_id, payment_request).await?;
        Ok(CheckoutResult {
            order_id,
            orders,
            payment,
        })
    }

    /// Same submission through the single transactional endpoint
    #[instrument(skip(self))]
    pub async fn finish_order_atomic(&mut self) -> Result<CheckoutResult, CheckoutError> {
        let ready = self.readiness().cloned();
        let courier = self.record(ready)?;
        let lines = self.order_lines();
        let items = self.record(lines)?;
        let request = CheckoutRequest {
            items,
            payment: self.payment_request(&courier),
        };

        let result = self.api.checkout(&request).await.map_err(CheckoutError::from);
        let receipt = self.record(result)?;
        Ok(self.complete(receipt))
    }
}
