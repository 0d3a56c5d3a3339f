use crate::core::{EntityId, Result, Row, StoreError, ValidationError};
use crate::mapping::order::{ITEMS_ALIAS, PROFILE_ALIAS, order_from_row};
use crate::model::order::Order;
use crate::remote::{Embed, RemoteStore, SelectQuery};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

pub const ORDERS: &str = "orders";
pub const ORDER_ITEMS: &str = "order_items";
pub const PROFILES: &str = "profiles";

/// Profile columns joined into orders and carts.
pub const PROFILE_COLUMNS: [&str; 3] = ["full_name", "email", "phone"];

#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn RemoteStore>,
}

impl OrderService {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    /// Orders newest first, each with its customer profile and line items.
    pub async fn fetch_orders(&self) -> Result<Vec<Order>> {
        let query = SelectQuery::from(ORDERS)
            .embed(Embed::one(PROFILE_ALIAS, PROFILES, "user_id").columns(&PROFILE_COLUMNS))
            .embed(Embed::many(ITEMS_ALIAS, ORDER_ITEMS, "order_id"))
            .order_desc("created_at");

        let rows = self
            .store
            .select(&query)
            .await
            .inspect_err(|e| error!(error = %e, "error fetching orders"))?;

        rows.iter().map(order_from_row).collect()
    }

    /// Sets the shipment tracking code. The code is trimmed and must not be
    /// empty.
    pub async fn update_tracking_code(&self, id: &EntityId, code: &str) -> Result<()> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ValidationError::Required("tracking_code").into());
        }

        let mut patch = Row::new();
        patch.insert("tracking_code".to_string(), Value::from(code));
        let updated = self
            .store
            .update(ORDERS, id, patch)
            .await
            .inspect_err(|e| error!(%id, error = %e, "error updating tracking code"))?;

        if updated.is_none() {
            return Err(StoreError::not_found(ORDERS, format!("id = {}", id)));
        }
        info!(%id, tracking_code = code, "tracking code saved");
        Ok(())
    }
}
