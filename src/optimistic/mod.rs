//! Optimistic product mutations and the local collection they act on.

pub mod collection;
pub mod controller;

pub use collection::ProductCollection;
pub use controller::{
    MutationOutcome, PendingWrite, ProductController, ProductFlag, begin_flag, begin_inventory,
    begin_price,
};
