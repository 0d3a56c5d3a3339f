//! Remote operations per collection. Services own no local state; they map
//! rows to entities and log failures before returning them.

pub mod cart;
pub mod coupon;
pub mod order;
pub mod product;

pub use cart::CartService;
pub use coupon::{CouponService, apply_coupon_discount};
pub use order::OrderService;
pub use product::ProductService;
