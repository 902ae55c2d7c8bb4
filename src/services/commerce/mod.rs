pub mod cart;
pub mod cart_sessions;
pub mod checkout;
pub mod checkout_flow;
