use shopdesk::model::order::UNKNOWN_CUSTOMER_NAME;
use shopdesk::{CartGroup, Coupon, CouponValidation, DashboardStats, MutationOutcome, Order, Product};

pub fn print_products<'a>(products: impl IntoIterator<Item = &'a Product>, stats: DashboardStats) {
    println!(
        "{:<10} {:<32} {:<16} {:>10} {:>7}  FLAGS",
        "ID", "NAME", "BRAND", "PRICE", "STOCK"
    );
    for product in products {
        let mut flags = Vec::new();
        if product.is_promotion {
            flags.push("promo");
        }
        if product.free_shipping {
            flags.push("free-shipping");
        }
        if product.is_featured {
            flags.push("featured");
        }
        if product.is_low_stock() {
            flags.push("LOW");
        }
        println!(
            "{:<10} {:<32} {:<16} {:>10.2} {:>7}  {}",
            product.id.to_string(),
            truncate(&product.name, 32),
            truncate(&product.sku, 16),
            product.price,
            product.inventory,
            flags.join(",")
        );
    }
    println!(
        "\n{} products, {} units in stock, {} low on stock",
        stats.product_count, stats.total_items, stats.low_stock_count
    );
}

pub fn print_outcome(what: &str, outcome: &MutationOutcome) {
    match outcome {
        MutationOutcome::Applied => println!("{}: saved", what),
        MutationOutcome::Skipped => println!("{}: no such product", what),
        MutationOutcome::Reconciled { error } => {
            println!("{}: failed ({}); product list reloaded from the store", what, error)
        }
        MutationOutcome::ReloadFailed {
            error,
            reload_error,
        } => println!(
            "{}: failed ({}); reload failed too ({})",
            what, error, reload_error
        ),
        MutationOutcome::Restored { error } => {
            println!("{}: failed ({}); nothing was removed", what, error)
        }
    }
}

pub fn print_orders<'a>(orders: impl IntoIterator<Item = &'a Order>) {
    for order in orders {
        let customer = order
            .customer
            .as_ref()
            .map(|c| c.name.as_str())
            .unwrap_or(UNKNOWN_CUSTOMER_NAME);
        println!(
            "#{} {} [{}] {:.2} - {} item(s) - {}",
            order.id,
            order.created_at,
            order.status,
            order.total_amount,
            order.item_count(),
            customer
        );
        println!("    ship to: {}", order.address_snapshot.one_line());
        match &order.tracking_code {
            Some(code) if order.has_tracking_code() => println!("    tracking: {}", code),
            _ => println!("    tracking: -"),
        }
        for item in &order.items {
            println!(
                "    {} x {} ({} / {}) {:.2}",
                item.quantity,
                item.name,
                item.selected_size,
                item.selected_color,
                item.line_total()
            );
        }
    }
}

pub fn print_coupons<'a>(coupons: impl IntoIterator<Item = &'a Coupon>) {
    println!(
        "{:<38} {:<20} {:<11} {:>8} {:<12} {:>7}  ACTIVE",
        "ID", "CODE", "TYPE", "VALUE", "EXPIRES", "USED"
    );
    for coupon in coupons {
        println!(
            "{:<38} {:<20} {:<11} {:>8.2} {:<12} {:>3}/{:<3}  {}",
            coupon.id.to_string(),
            coupon.code,
            coupon.discount_type.as_str(),
            coupon.discount_value,
            coupon.expiration_date.as_deref().unwrap_or("-"),
            coupon.used_count,
            coupon.usage_limit_user,
            if coupon.is_active { "yes" } else { "no" }
        );
    }
}

pub fn print_validation(code: &str, validation: &CouponValidation, total: Option<f64>) {
    match validation {
        CouponValidation::Valid(coupon) => {
            println!("{}: valid, {} use(s) left", code, coupon.remaining_uses());
            if let Some(total) = total {
                let discount = coupon.discount_for(total);
                println!("discount on {:.2}: {:.2} (pay {:.2})", total, discount, total - discount);
            }
        }
        CouponValidation::Rejected(reason) => println!("{}: {}", code, reason),
    }
}

pub fn print_carts(groups: &[CartGroup]) {
    if groups.is_empty() {
        println!("No items in any cart");
        return;
    }
    for group in groups {
        let name = group
            .customer
            .as_ref()
            .map(|c| c.name.as_str())
            .unwrap_or(UNKNOWN_CUSTOMER_NAME);
        println!("{} <{}> total {:.2}", name, group.email, group.total());
        for item in &group.items {
            let product = item.product.as_ref().map(|p| p.name.as_str()).unwrap_or("?");
            println!(
                "    {} x {} ({} / {}) {:.2}",
                item.quantity,
                product,
                item.selected_size,
                item.selected_color,
                item.line_total()
            );
        }
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("Chuteira", 32), "Chuteira");
        assert_eq!(truncate("Único Padrão", 6), "Único…");
    }
}
