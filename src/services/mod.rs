// Catalog and storefront reads
pub mod catalog;
pub mod vouchers;

// Purchases
pub mod orders;
pub mod payments;

// External services
pub mod shipping;

// Cart, checkout flow and transactional checkout
pub mod commerce;
