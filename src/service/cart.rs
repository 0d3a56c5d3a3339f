use super::order::{PROFILE_COLUMNS, PROFILES};
use super::product::PRODUCTS;
use crate::core::Result;
use crate::mapping::order::{PRODUCT_ALIAS, PROFILE_ALIAS, cart_item_from_row};
use crate::model::cart::{AdminCartItem, CartGroup, group_by_customer};
use crate::remote::{Embed, RemoteStore, SelectQuery};
use std::sync::Arc;
use tracing::{debug, error};

pub const CART: &str = "cart";

/// Read-only view over every customer's cart.
#[derive(Clone)]
pub struct CartService {
    store: Arc<dyn RemoteStore>,
}

impl CartService {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    /// All cart lines, newest first, with customer profile and product.
    pub async fn fetch_all_carts(&self) -> Result<Vec<AdminCartItem>> {
        let query = SelectQuery::from(CART)
            .embed(Embed::one(PROFILE_ALIAS, PROFILES, "user_id").columns(&PROFILE_COLUMNS))
            .embed(Embed::one(PRODUCT_ALIAS, PRODUCTS, "product_id"))
            .order_desc("created_at");

        let rows = self
            .store
            .select(&query)
            .await
            .inspect_err(|e| error!(error = %e, "error fetching carts"))?;

        rows.iter().map(cart_item_from_row).collect()
    }

    /// [`CartService::fetch_all_carts`] grouped by customer e-mail.
    pub async fn fetch_grouped(&self) -> Result<Vec<CartGroup>> {
        let groups = group_by_customer(self.fetch_all_carts().await?);
        debug!(customers = groups.len(), "carts grouped");
        Ok(groups)
    }
}
