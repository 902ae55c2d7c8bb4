pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod common;
pub mod orders;
pub mod payments;
pub mod shipping;
pub mod vouchers;

use crate::{
    config::AppConfig,
    db::DbPool,
    services::{
        catalog::CatalogService,
        commerce::{cart_sessions::CartSessions, checkout::CheckoutService},
        orders::OrderService,
        payments::PaymentService,
        shipping::{ShippingProvider, ShippingService},
        vouchers::VoucherService,
    },
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<CatalogService>,
    pub vouchers: Arc<VoucherService>,
    pub orders: Arc<OrderService>,
    pub payments: Arc<PaymentService>,
    pub checkout: Arc<CheckoutService>,
    pub shipping: Arc<ShippingService>,
    pub carts: Arc<CartSessions>,
}

impl AppServices {
    /// Wires every service onto one pool. The shipping provider is passed in
    /// so tests can swap the RajaOngkir client for a stub.
    pub fn new(
        db_pool: Arc<DbPool>,
        config: &AppConfig,
        shipping_provider: Arc<dyn ShippingProvider>,
    ) -> Self {
        let payment_expiry = config.payment_expiry();
        let catalog = CatalogService::new(db_pool.clone());

        Self {
            carts: Arc::new(CartSessions::new(catalog.clone())),
            catalog: Arc::new(catalog),
            vouchers: Arc::new(VoucherService::new(db_pool.clone())),
            orders: Arc::new(OrderService::new(db_pool.clone())),
            payments: Arc::new(PaymentService::new(db_pool.clone(), payment_expiry)),
            checkout: Arc::new(CheckoutService::new(db_pool, payment_expiry)),
            shipping: Arc::new(ShippingService::new(shipping_provider)),
        }
    }
}
