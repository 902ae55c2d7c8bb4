pub mod category;
pub mod item;
pub mod order;
pub mod payment;
pub mod user;
pub mod voucher;
