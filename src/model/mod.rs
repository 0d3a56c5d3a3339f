//! Entities mirrored from the remote store.

pub mod cart;
pub mod coupon;
pub mod order;
pub mod product;

use serde::{Deserialize, Deserializer};

pub use cart::{AdminCartItem, CartGroup, CartProduct, group_by_customer};
pub use coupon::{
    Coupon, CouponDraft, CouponPatch, CouponRejection, CouponValidation, DiscountType,
};
pub use order::{AddressSnapshot, CustomerInfo, Order, OrderItem};
pub use product::{Category, Product, ProductDraft, StockOption};

/// Treats an explicit JSON `null` like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
