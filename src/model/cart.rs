use super::order::CustomerInfo;
use crate::core::EntityId;
use serde::{Deserialize, Serialize};

/// Group key for cart rows without a customer e-mail.
pub const UNKNOWN_CUSTOMER_EMAIL: &str = "Desconhecido";

/// The product columns the cart view needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartProduct {
    pub id: Option<EntityId>,
    pub name: String,
    pub price: f64,
    pub image_url: String,
}

/// One cart line of some customer, as seen by an administrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminCartItem {
    pub id: EntityId,
    pub user_id: String,
    pub product_id: Option<EntityId>,
    pub quantity: u32,
    pub selected_size: String,
    pub selected_color: String,
    pub created_at: String,
    pub customer: Option<CustomerInfo>,
    pub product: Option<CartProduct>,
}

impl AdminCartItem {
    /// Product price times quantity; a missing product counts as free.
    pub fn line_total(&self) -> f64 {
        self.product.as_ref().map(|p| p.price).unwrap_or(0.0) * f64::from(self.quantity)
    }
}

/// All cart lines sharing one customer e-mail.
#[derive(Debug, Clone, PartialEq)]
pub struct CartGroup {
    pub email: String,
    pub customer: Option<CustomerInfo>,
    pub items: Vec<AdminCartItem>,
}

impl CartGroup {
    pub fn total(&self) -> f64 {
        self.items.iter().map(AdminCartItem::line_total).sum()
    }
}

/// Groups cart lines by customer e-mail, keeping the order in which each
/// e-mail first appears. The first item of a group supplies its customer.
pub fn group_by_customer(items: Vec<AdminCartItem>) -> Vec<CartGroup> {
    let mut groups: Vec<CartGroup> = Vec::new();

    for item in items {
        let email = item
            .customer
            .as_ref()
            .map(|c| c.email.as_str())
            .filter(|e| !e.is_empty())
            .unwrap_or(UNKNOWN_CUSTOMER_EMAIL)
            .to_string();

        match groups.iter_mut().find(|g| g.email == email) {
            Some(group) => group.items.push(item),
            None => groups.push(CartGroup {
                email,
                customer: item.customer.clone(),
                items: vec![item],
            }),
        }
    }

    groups
}
