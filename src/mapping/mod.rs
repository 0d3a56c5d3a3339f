//! Translation between remote rows and entities.
//!
//! Every read path normalizes through here: renamed columns are mapped back,
//! missing scalars get fixed fallbacks and loosely typed arrays are coerced.

pub mod order;
pub mod product;

pub use order::{cart_item_from_row, customer_from_profile, order_from_row};
pub use product::{
    ProductField, draft_to_row, parse_stock, product_from_row, product_from_written_row,
    stock_to_value,
};
