use crate::core::{EntityId, Result, Row, StoreError};
use crate::mapping::product::{
    ProductField, draft_to_row, product_from_row, product_from_written_row,
};
use crate::model::product::{Product, ProductDraft};
use crate::remote::{RemoteStore, SelectQuery};
use std::sync::Arc;
use tracing::{debug, error};

pub const PRODUCTS: &str = "products";

/// Remote operations on the product catalogue.
#[derive(Clone)]
pub struct ProductService {
    store: Arc<dyn RemoteStore>,
}

impl ProductService {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    /// The whole catalogue, newest first.
    pub async fn fetch_products(&self) -> Result<Vec<Product>> {
        let query = SelectQuery::from(PRODUCTS).order_desc("created_at");
        let rows = self.store.select(&query).await.inspect_err(|e| {
            error!(error = %e, "error fetching products");
        })?;

        rows.iter().map(product_from_row).collect()
    }

    /// Inserts a product. Without explicit variants a default one carries
    /// `draft.inventory`.
    pub async fn add_product(&self, draft: &ProductDraft) -> Result<Product> {
        let row = self
            .store
            .insert(PRODUCTS, draft_to_row(draft))
            .await
            .inspect_err(|e| error!(error = %e, "error adding product"))?;

        let product = product_from_written_row(&row, draft.inventory)?;
        debug!(id = %product.id, "product added");
        Ok(product)
    }

    /// Rewrites every editable column of `product`.
    pub async fn update_product(&self, product: &Product) -> Result<Product> {
        let row = self
            .store
            .update(PRODUCTS, &product.id, draft_to_row(&product.to_draft()))
            .await
            .inspect_err(|e| error!(id = %product.id, error = %e, "error updating product"))?
            .ok_or_else(|| StoreError::not_found(PRODUCTS, format!("id = {}", product.id)))?;

        product_from_written_row(&row, product.inventory)
    }

    /// Writes the current value of one field of `product`.
    pub async fn write_field(&self, product: &Product, field: ProductField) -> Result<()> {
        self.write_patch(&product.id, field, field.patch_from(product)).await
    }

    async fn write_patch(
        &self,
        id: &EntityId,
        field: ProductField,
        patch: Row,
    ) -> Result<()> {
        let updated = self
            .store
            .update(PRODUCTS, id, patch)
            .await
            .inspect_err(|e| error!(%id, field = field.label(), error = %e, "error writing product field"))?;

        if updated.is_none() {
            debug!(%id, field = field.label(), "no product matched field write");
        }
        Ok(())
    }

    pub async fn delete_product(&self, id: &EntityId) -> Result<()> {
        self.store
            .delete(PRODUCTS, id)
            .await
            .inspect_err(|e| error!(%id, error = %e, "error deleting product"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::product::StockOption;
    use crate::remote::MemoryStore;
    use serde_json::json;

    fn service() -> (Arc<MemoryStore>, ProductService) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), ProductService::new(store))
    }

    #[tokio::test]
    async fn test_add_then_fetch_newest_first() {
        let (_, products) = service();
        products.add_product(&ProductDraft::new("First", 10.0)).await.unwrap();
        let second = products
            .add_product(&ProductDraft {
                inventory: 4,
                ..ProductDraft::new("Second", 20.0)
            })
            .await
            .unwrap();

        assert_eq!(second.inventory, 4);
        assert_eq!(second.stock, vec![StockOption::new("Único", "Padrão", 4)]);

        let fetched = products.fetch_products().await.unwrap();
        let names: Vec<_> = fetched.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Second", "First"]);
    }

    #[tokio::test]
    async fn test_update_product_without_stock_synthesizes_variant() {
        let (store, products) = service();
        store
            .seed(PRODUCTS, vec![json!({"id": 1, "name": "Boot", "stock": null})
                .as_object()
                .cloned()
                .unwrap()])
            .await;

        let mut product = products.fetch_products().await.unwrap().remove(0);
        assert_eq!(product.inventory, 0);
        assert!(product.stock.is_empty());

        product.inventory = 5;
        let updated = products.update_product(&product).await.unwrap();
        assert_eq!(updated.stock, vec![StockOption::new("Único", "Padrão", 5)]);
        assert_eq!(updated.inventory, 5);
    }

    #[tokio::test]
    async fn test_update_missing_product_is_not_found() {
        let (_, products) = service();
        let ghost = ProductDraft::new("Ghost", 1.0).with_id(EntityId::Int(99));
        assert!(matches!(
            products.update_product(&ghost).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_write_field_and_delete() {
        let (store, products) = service();
        let mut product = products.add_product(&ProductDraft::new("Boot", 10.0)).await.unwrap();

        product.free_shipping = true;
        product.price = 12.5;
        products.write_field(&product, ProductField::FreeShipping).await.unwrap();
        products.write_field(&product, ProductField::Price).await.unwrap();

        let row = store.rows(PRODUCTS).await.remove(0);
        assert_eq!(row["free_shipping"], json!(true));
        assert_eq!(row["price"], json!(12.5));

        products.delete_product(&product.id).await.unwrap();
        assert!(products.fetch_products().await.unwrap().is_empty());
    }
}
