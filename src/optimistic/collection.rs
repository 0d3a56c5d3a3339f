use crate::core::EntityId;
use crate::model::product::Product;

/// The locally held product list, newest first.
///
/// This is what the dashboard renders, but it is not authoritative: between an
/// optimistic apply and the remote answer it may be ahead of the store, and a
/// failed write replaces it wholesale with a fresh fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductCollection {
    products: Vec<Product>,
    last_error: Option<String>,
}

impl ProductCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_products(products: Vec<Product>) -> Self {
        Self {
            products,
            last_error: None,
        }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn get(&self, id: &EntityId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == id)
    }

    /// Rewrites the product with `id` in place and returns it.
    ///
    /// Other products are untouched. An unknown id is a no-op and yields
    /// `None`.
    pub fn apply<F>(&mut self, id: &EntityId, transform: F) -> Option<&Product>
    where
        F: FnOnce(&mut Product),
    {
        let product = self.products.iter_mut().find(|p| &p.id == id)?;
        transform(product);
        Some(&*product)
    }

    /// Replaces every product, e.g. with the result of a full fetch.
    pub fn replace_all(&mut self, products: Vec<Product>) {
        self.products = products;
    }

    pub fn prepend(&mut self, product: Product) {
        self.products.insert(0, product);
    }

    /// Swaps in `product` for the entry with the same id. Returns false when
    /// there is none.
    pub fn replace(&mut self, product: Product) -> bool {
        match self.products.iter_mut().find(|p| p.id == product.id) {
            Some(slot) => {
                *slot = product;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &EntityId) -> Option<Product> {
        let index = self.products.iter().position(|p| &p.id == id)?;
        Some(self.products.remove(index))
    }

    pub fn snapshot(&self) -> Vec<Product> {
        self.products.clone()
    }

    pub fn restore(&mut self, snapshot: Vec<Product>) {
        self.products = snapshot;
    }

    /// Products whose name or sku contains `query`, case-insensitively. A
    /// blank query matches everything.
    pub fn filter(&self, query: &str) -> Vec<&Product> {
        let query = query.trim();
        if query.is_empty() {
            return self.products.iter().collect();
        }
        self.products.iter().filter(|p| p.matches(query)).collect()
    }

    /// Units across the whole catalogue.
    pub fn total_items(&self) -> u64 {
        self.products.iter().map(|p| u64::from(p.inventory)).sum()
    }

    pub fn low_stock_count(&self) -> usize {
        self.products.iter().filter(|p| p.is_low_stock()).count()
    }

    /// Message of the most recent failed operation, if it was not cleared.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }
}
