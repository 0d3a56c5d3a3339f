use crate::core::EntityId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Size used when a product has no explicit variants.
pub const DEFAULT_VARIANT_SIZE: &str = "Único";
/// Color used when a product has no explicit variants and no colors.
pub const DEFAULT_VARIANT_COLOR: &str = "Padrão";
/// Name shown for rows without one.
pub const UNNAMED_PRODUCT: &str = "Sem nome";
/// Products below this many units count as low stock.
pub const LOW_STOCK_THRESHOLD: u32 = 10;
/// Name given to a submitted draft left blank.
pub const NEW_PRODUCT_NAME: &str = "Novo Produto";
/// Brand given to a submitted draft left blank.
pub const DEFAULT_BRAND: &str = "Marca Padrão";

/// Playing surface the boot is made for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Futsal,
    Campo,
    Society,
    /// Any other label found in the store, kept verbatim.
    Other(String),
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Futsal, Category::Campo, Category::Society];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Futsal => "Futsal",
            Self::Campo => "Campo",
            Self::Society => "Society",
            Self::Other(label) => label,
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::Futsal
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Futsal" => Self::Futsal,
            "Campo" => Self::Campo,
            "Society" => Self::Society,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stock of one size/color combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockOption {
    pub size: String,
    pub color: String,
    pub quantity: u32,
}

impl StockOption {
    pub fn new(size: &str, color: &str, quantity: u32) -> Self {
        Self {
            size: size.to_string(),
            color: color.to_string(),
            quantity,
        }
    }
}

/// A product as the dashboard sees it.
///
/// `inventory` is derived from `stock` by the mapping layer; it is carried as a
/// field so optimistic updates can move it ahead of the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: EntityId,
    pub name: String,
    /// Stored remotely as `brand`.
    pub sku: String,
    pub image_url: String,
    pub price: f64,
    pub category: Category,
    pub colors: Vec<String>,
    pub is_promotion: bool,
    pub is_featured: bool,
    pub free_shipping: bool,
    pub technologies: Vec<String>,
    pub material: String,
    pub weight: String,
    pub description: String,
    pub stock: Vec<StockOption>,
    pub inventory: u32,
}

impl Product {
    pub fn is_low_stock(&self) -> bool {
        self.inventory < LOW_STOCK_THRESHOLD
    }

    /// Case-insensitive match on name or sku.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.name.to_lowercase().contains(&query) || self.sku.to_lowercase().contains(&query)
    }

    /// The editable part of the product, e.g. to prefill an edit form.
    pub fn to_draft(&self) -> ProductDraft {
        ProductDraft {
            name: self.name.clone(),
            sku: self.sku.clone(),
            image_url: self.image_url.clone(),
            price: self.price,
            category: self.category.clone(),
            colors: self.colors.clone(),
            is_promotion: self.is_promotion,
            is_featured: self.is_featured,
            free_shipping: self.free_shipping,
            technologies: self.technologies.clone(),
            material: self.material.clone(),
            weight: self.weight.clone(),
            description: self.description.clone(),
            stock: self.stock.clone(),
            inventory: self.inventory,
        }
    }
}

/// A product before the store has assigned it an id.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub sku: String,
    pub image_url: String,
    pub price: f64,
    pub category: Category,
    pub colors: Vec<String>,
    pub is_promotion: bool,
    pub is_featured: bool,
    pub free_shipping: bool,
    pub technologies: Vec<String>,
    pub material: String,
    pub weight: String,
    pub description: String,
    pub stock: Vec<StockOption>,
    /// Used only when `stock` is empty.
    pub inventory: u32,
}

impl ProductDraft {
    pub fn new(name: &str, price: f64) -> Self {
        Self {
            name: name.to_string(),
            price,
            ..Self::default()
        }
    }

    /// Fills the blanks a submitted form may leave: name and brand get
    /// placeholders, a non-finite or negative price becomes zero, blank
    /// colors and technologies are dropped and, when variants are given,
    /// `inventory` is their total.
    pub fn normalized(mut self) -> Self {
        if self.name.trim().is_empty() {
            self.name = NEW_PRODUCT_NAME.to_string();
        }
        if self.sku.trim().is_empty() {
            self.sku = DEFAULT_BRAND.to_string();
        }
        if !self.price.is_finite() || self.price < 0.0 {
            self.price = 0.0;
        }
        self.colors = trimmed_non_empty(self.colors);
        self.technologies = trimmed_non_empty(self.technologies);
        if !self.stock.is_empty() {
            self.inventory = total_inventory(&self.stock);
        }
        self
    }

    pub fn with_id(self, id: EntityId) -> Product {
        Product {
            id,
            name: self.name,
            sku: self.sku,
            image_url: self.image_url,
            price: self.price,
            category: self.category,
            colors: self.colors,
            is_promotion: self.is_promotion,
            is_featured: self.is_featured,
            free_shipping: self.free_shipping,
            technologies: self.technologies,
            material: self.material,
            weight: self.weight,
            description: self.description,
            stock: self.stock,
            inventory: self.inventory,
        }
    }
}

fn trimmed_non_empty(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Sum of variant quantities, saturating at `u32::MAX`.
pub fn total_inventory(stock: &[StockOption]) -> u32 {
    stock
        .iter()
        .fold(0u32, |acc, option| acc.saturating_add(option.quantity))
}

/// `max(0, current + delta)`, saturating at `u32::MAX`.
pub fn apply_delta(current: u32, delta: i64) -> u32 {
    let next = i64::from(current).saturating_add(delta);
    next.clamp(0, i64::from(u32::MAX)) as u32
}

/// Single fallback variant carrying the whole count.
pub fn default_stock(colors: &[String], inventory: u32) -> Vec<StockOption> {
    let color = colors
        .first()
        .map(String::as_str)
        .unwrap_or(DEFAULT_VARIANT_COLOR);
    vec![StockOption::new(DEFAULT_VARIANT_SIZE, color, inventory)]
}

/// The variants to write: the given ones, or the fallback when there are none.
pub fn stock_or_default(stock: &[StockOption], colors: &[String], inventory: u32) -> Vec<StockOption> {
    if stock.is_empty() {
        default_stock(colors, inventory)
    } else {
        stock.to_vec()
    }
}

/// Moves a variant sequence by `delta` units so that its total becomes
/// `apply_delta(total, delta)`.
///
/// Additions go to the first variant. Removals drain variants in order until
/// the delta is absorbed or every variant is empty. An empty sequence becomes
/// one default variant holding the new total.
pub fn shift_stock(stock: &[StockOption], current_total: u32, delta: i64) -> Vec<StockOption> {
    if stock.is_empty() {
        let target = apply_delta(current_total, delta);
        return vec![StockOption::new(DEFAULT_VARIANT_SIZE, DEFAULT_VARIANT_COLOR, target)];
    }

    let mut shifted = stock.to_vec();
    if delta >= 0 {
        let first = &mut shifted[0];
        first.quantity = apply_delta(first.quantity, delta);
        return shifted;
    }

    let mut remaining = delta.unsigned_abs();
    for option in shifted.iter_mut() {
        if remaining == 0 {
            break;
        }
        let taken = remaining.min(u64::from(option.quantity));
        option.quantity -= taken as u32;
        remaining -= taken;
    }
    shifted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_delta_clamps_at_zero() {
        for current in [0u32, 1, 5, 10, 1000] {
            for delta in [-2000i64, -11, -10, -1, 0, 1, 7, 2000] {
                let expected = (i64::from(current) + delta).max(0) as u32;
                assert_eq!(apply_delta(current, delta), expected, "c={current} d={delta}");
            }
        }
        assert_eq!(apply_delta(u32::MAX, 1), u32::MAX);
        assert_eq!(apply_delta(0, i64::MIN), 0);
    }

    #[test]
    fn test_normalized_draft_fills_form_blanks() {
        let draft = ProductDraft {
            price: f64::NAN,
            colors: vec![" Preto ".into(), "  ".into()],
            stock: vec![StockOption::new("40", "Preto", 2), StockOption::new("41", "Preto", 1)],
            inventory: 99,
            ..ProductDraft::default()
        }
        .normalized();

        assert_eq!(draft.name, "Novo Produto");
        assert_eq!(draft.sku, "Marca Padrão");
        assert_eq!(draft.price, 0.0);
        assert_eq!(draft.colors, vec!["Preto".to_string()]);
        assert_eq!(draft.inventory, 3);
    }

    #[test]
    fn test_total_inventory() {
        assert_eq!(total_inventory(&[]), 0);
        let stock = vec![
            StockOption::new("39", "Preto", 3),
            StockOption::new("40", "Preto", 4),
        ];
        assert_eq!(total_inventory(&stock), 7);
    }

    #[test]
    fn test_default_stock_uses_first_color() {
        assert_eq!(
            default_stock(&[], 5),
            vec![StockOption::new("Único", "Padrão", 5)]
        );
        assert_eq!(
            default_stock(&["Azul".to_string(), "Rosa".to_string()], 2),
            vec![StockOption::new("Único", "Azul", 2)]
        );
        let explicit = vec![StockOption::new("41", "Verde", 1)];
        assert_eq!(stock_or_default(&explicit, &[], 9), explicit);
    }

    #[test]
    fn test_shift_stock_keeps_total_in_step_with_delta() {
        let stock = vec![
            StockOption::new("39", "Preto", 1),
            StockOption::new("40", "Preto", 5),
        ];
        let total = total_inventory(&stock);

        for delta in [-10i64, -6, -3, -1, 0, 2] {
            let shifted = shift_stock(&stock, total, delta);
            assert_eq!(total_inventory(&shifted), apply_delta(total, delta), "delta={delta}");
        }

        let drained = shift_stock(&stock, total, -3);
        assert_eq!(drained[0].quantity, 0);
        assert_eq!(drained[1].quantity, 3);

        let added = shift_stock(&stock, total, 4);
        assert_eq!(added[0].quantity, 5);
        assert_eq!(added[1].quantity, 5);
    }

    #[test]
    fn test_shift_empty_stock_synthesizes_default() {
        assert_eq!(
            shift_stock(&[], 5, -2),
            vec![StockOption::new("Único", "Padrão", 3)]
        );
        assert_eq!(
            shift_stock(&[], 0, -2),
            vec![StockOption::new("Único", "Padrão", 0)]
        );
    }

    #[test]
    fn test_category_round_trip() {
        assert_eq!(Category::from("Campo"), Category::Campo);
        assert_eq!(Category::from("Beach"), Category::Other("Beach".into()));
        let json = serde_json::to_value(Category::Society).unwrap();
        assert_eq!(json, serde_json::json!("Society"));
    }

    #[test]
    fn test_matches_name_or_sku() {
        let mut product = ProductDraft::new("Chuteira Predator", 299.9).with_id(EntityId::Int(1));
        product.sku = "Adidas".into();
        assert!(product.matches("predator"));
        assert!(product.matches("ADI"));
        assert!(!product.matches("nike"));
    }
}
