use super::null_as_default;
use crate::core::EntityId;
use serde::{Deserialize, Serialize};

/// Shown when a joined profile has no name.
pub const UNKNOWN_CUSTOMER_NAME: &str = "Nome não disponível";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AddressSnapshot {
    #[serde(default, deserialize_with = "null_as_default")]
    pub cep: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub city: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub state: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub number: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub street: String,
    #[serde(default)]
    pub complement: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub neighborhood: String,
}

impl AddressSnapshot {
    /// One-line rendering: "street, number - complement, neighborhood, city/state, cep".
    pub fn one_line(&self) -> String {
        let mut line = format!("{}, {}", self.street, self.number);
        if let Some(complement) = self.complement.as_deref().filter(|c| !c.is_empty()) {
            line.push_str(" - ");
            line.push_str(complement);
        }
        line.push_str(&format!(
            ", {}, {}/{}, {}",
            self.neighborhood, self.city, self.state, self.cep
        ));
        line
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: EntityId,
    pub product_id: Option<EntityId>,
    pub name: String,
    pub quantity: u32,
    pub price_at_purchase: f64,
    pub selected_size: String,
    pub selected_color: String,
}

impl OrderItem {
    pub fn line_total(&self) -> f64 {
        self.price_at_purchase * f64::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: EntityId,
    pub user_id: String,
    pub status: String,
    pub total_amount: f64,
    pub address_snapshot: AddressSnapshot,
    pub tracking_code: Option<String>,
    pub created_at: String,
    pub customer: Option<CustomerInfo>,
    pub items: Vec<OrderItem>,
}

impl Order {
    pub fn has_tracking_code(&self) -> bool {
        self.tracking_code
            .as_deref()
            .is_some_and(|code| !code.trim().is_empty())
    }

    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, item| acc.saturating_add(item.quantity))
    }
}
