use crate::core::types::{coerce_count, number_or_zero, opt_text, text_or};
use crate::core::{EntityId, Result, Row, StoreError};
use crate::model::cart::{AdminCartItem, CartProduct};
use crate::model::order::{
    AddressSnapshot, CustomerInfo, Order, OrderItem, UNKNOWN_CUSTOMER_NAME,
};
use serde_json::Value;

/// Alias under which the joined profile arrives.
pub const PROFILE_ALIAS: &str = "profiles";
pub const ITEMS_ALIAS: &str = "items";
pub const PRODUCT_ALIAS: &str = "product";

fn required_id(row: &Row, collection: &str) -> Result<EntityId> {
    row.get("id")
        .and_then(EntityId::from_value)
        .ok_or_else(|| StoreError::Decode(format!("{} row without a usable id", collection)))
}

fn optional_id(row: &Row, key: &str) -> Option<EntityId> {
    row.get(key).and_then(EntityId::from_value)
}

/// Folds a joined profile record into customer info. A null join is `None`.
pub fn customer_from_profile(value: Option<&Value>) -> Option<CustomerInfo> {
    let profile = value?.as_object()?;
    Some(CustomerInfo {
        name: text_or(profile, "full_name", UNKNOWN_CUSTOMER_NAME),
        email: text_or(profile, "email", ""),
        phone: text_or(profile, "phone", ""),
    })
}

fn item_from_row(row: &Row) -> Option<OrderItem> {
    Some(OrderItem {
        id: optional_id(row, "id")?,
        product_id: optional_id(row, "product_id"),
        name: text_or(row, "name", ""),
        quantity: row.get("quantity").map(coerce_count).unwrap_or(0),
        price_at_purchase: number_or_zero(row, "price_at_purchase"),
        selected_size: text_or(row, "selected_size", ""),
        selected_color: text_or(row, "selected_color", ""),
    })
}

pub fn order_from_row(row: &Row) -> Result<Order> {
    let address_snapshot = row
        .get("address_snapshot")
        .filter(|v| v.is_object())
        .and_then(|v| serde_json::from_value::<AddressSnapshot>(v.clone()).ok())
        .unwrap_or_default();

    let items = match row.get(ITEMS_ALIAS) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_object)
            .filter_map(item_from_row)
            .collect(),
        _ => Vec::new(),
    };

    Ok(Order {
        id: required_id(row, "orders")?,
        user_id: text_or(row, "user_id", ""),
        status: text_or(row, "status", ""),
        total_amount: number_or_zero(row, "total_amount"),
        address_snapshot,
        tracking_code: opt_text(row, "tracking_code"),
        created_at: text_or(row, "created_at", ""),
        customer: customer_from_profile(row.get(PROFILE_ALIAS)),
        items,
    })
}

fn cart_product(value: Option<&Value>) -> Option<CartProduct> {
    let product = value?.as_object()?;
    Some(CartProduct {
        id: optional_id(product, "id"),
        name: text_or(product, "name", ""),
        price: number_or_zero(product, "price"),
        image_url: text_or(product, "image", ""),
    })
}

pub fn cart_item_from_row(row: &Row) -> Result<AdminCartItem> {
    Ok(AdminCartItem {
        id: required_id(row, "cart")?,
        user_id: text_or(row, "user_id", ""),
        product_id: optional_id(row, "product_id"),
        quantity: row.get("quantity").map(coerce_count).unwrap_or(0),
        selected_size: text_or(row, "selected_size", ""),
        selected_color: text_or(row, "selected_color", ""),
        created_at: text_or(row, "created_at", ""),
        customer: customer_from_profile(row.get(PROFILE_ALIAS)),
        product: cart_product(row.get(PRODUCT_ALIAS)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_order_with_profile_and_items() {
        let order = order_from_row(&row(json!({
            "id": 31,
            "user_id": "u1",
            "status": "paid",
            "total_amount": 420.5,
            "tracking_code": null,
            "created_at": "2026-05-01T10:00:00Z",
            "address_snapshot": {
                "cep": "01001-000", "city": "São Paulo", "state": "SP",
                "number": "10", "street": "Praça da Sé", "neighborhood": "Sé"
            },
            "profiles": {"full_name": null, "email": "ana@x.com"},
            "items": [
                {"id": 1, "product_id": 7, "name": "Boot", "quantity": 2,
                 "price_at_purchase": 210.25, "selected_size": "40", "selected_color": "Preto"},
                {"name": "no id"}
            ]
        })))
        .unwrap();

        assert_eq!(order.id, EntityId::Int(31));
        assert_eq!(order.tracking_code, None);
        assert!(!order.has_tracking_code());
        assert_eq!(order.address_snapshot.city, "São Paulo");
        assert_eq!(order.address_snapshot.complement, None);

        let customer = order.customer.unwrap();
        assert_eq!(customer.name, "Nome não disponível");
        assert_eq!(customer.email, "ana@x.com");
        assert_eq!(customer.phone, "");

        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].line_total(), 420.5);
    }

    #[test]
    fn test_order_without_join() {
        let order = order_from_row(&row(json!({"id": 1, "profiles": null}))).unwrap();
        assert!(order.customer.is_none());
        assert!(order.items.is_empty());
        assert_eq!(order.address_snapshot, AddressSnapshot::default());
    }

    #[test]
    fn test_cart_item() {
        let item = cart_item_from_row(&row(json!({
            "id": 5,
            "user_id": "u2",
            "product_id": 9,
            "quantity": 3,
            "profiles": {"full_name": "Bia", "email": "bia@x.com", "phone": "11 9999"},
            "product": {"id": 9, "name": "Boot", "price": 100, "image": "i.png"}
        })))
        .unwrap();

        assert_eq!(item.line_total(), 300.0);
        assert_eq!(item.customer.unwrap().name, "Bia");
        assert_eq!(item.product.unwrap().image_url, "i.png");
    }
}
