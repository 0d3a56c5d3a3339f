use super::collection::ProductCollection;
use crate::core::{EntityId, Result, StoreError, ValidationError};
use crate::mapping::product::ProductField;
use crate::model::product::{Product, ProductDraft, apply_delta, shift_stock};
use crate::service::ProductService;
use tracing::{debug, error, warn};

/// Boolean product columns that are toggled from the product list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductFlag {
    Promotion,
    FreeShipping,
    Featured,
}

impl ProductFlag {
    pub fn field(&self) -> ProductField {
        match self {
            Self::Promotion => ProductField::Promotion,
            Self::FreeShipping => ProductField::FreeShipping,
            Self::Featured => ProductField::Featured,
        }
    }

    pub fn get(&self, product: &Product) -> bool {
        match self {
            Self::Promotion => product.is_promotion,
            Self::FreeShipping => product.free_shipping,
            Self::Featured => product.is_featured,
        }
    }

    fn set(&self, product: &mut Product, value: bool) {
        match self {
            Self::Promotion => product.is_promotion = value,
            Self::FreeShipping => product.free_shipping = value,
            Self::Featured => product.is_featured = value,
        }
    }
}

/// A local change that has been applied and still has to reach the store.
///
/// Holds the product as it was right after the apply, so the remote write
/// carries the new value rather than the change that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingWrite {
    product: Product,
    field: ProductField,
}

impl PendingWrite {
    pub fn id(&self) -> &EntityId {
        &self.product.id
    }

    pub fn field(&self) -> ProductField {
        self.field
    }

    pub fn product(&self) -> &Product {
        &self.product
    }
}

/// How an optimistic mutation ended.
#[derive(Debug, Clone)]
pub enum MutationOutcome {
    /// The store accepted the write; local state already matched it.
    Applied,
    /// No local product had the id, so nothing was written.
    Skipped,
    /// The write failed and the collection was replaced by a fresh fetch.
    Reconciled { error: StoreError },
    /// The write failed and so did the reload; local state is left as it was.
    ReloadFailed {
        error: StoreError,
        reload_error: StoreError,
    },
    /// The delete failed and the collection was put back as it was before.
    Restored { error: StoreError },
}

impl MutationOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }

    /// The failure of the remote write, if there was one.
    pub fn error(&self) -> Option<&StoreError> {
        match self {
            Self::Applied | Self::Skipped => None,
            Self::Reconciled { error }
            | Self::ReloadFailed { error, .. }
            | Self::Restored { error } => Some(error),
        }
    }
}

fn begin(
    products: &mut ProductCollection,
    id: &EntityId,
    field: ProductField,
    transform: impl FnOnce(&mut Product),
) -> Option<PendingWrite> {
    let product = products.apply(id, transform)?.clone();
    Some(PendingWrite { product, field })
}

/// Moves the product's stock by `delta` units, never below zero.
///
/// The variant quantities are shifted along with the aggregate so that the
/// stock written remotely sums to the clamped inventory.
pub fn begin_inventory(
    products: &mut ProductCollection,
    id: &EntityId,
    delta: i64,
) -> Option<PendingWrite> {
    begin(products, id, ProductField::Inventory, |product| {
        product.stock = shift_stock(&product.stock, product.inventory, delta);
        product.inventory = apply_delta(product.inventory, delta);
    })
}

/// Sets the price; negative values are clamped to zero.
pub fn begin_price(
    products: &mut ProductCollection,
    id: &EntityId,
    price: f64,
) -> std::result::Result<Option<PendingWrite>, ValidationError> {
    if !price.is_finite() {
        return Err(ValidationError::Invalid {
            field: "price",
            reason: format!("{} is not a number", price),
        });
    }
    let price = price.max(0.0);
    Ok(begin(products, id, ProductField::Price, |product| {
        product.price = price
    }))
}

pub fn begin_flag(
    products: &mut ProductCollection,
    id: &EntityId,
    flag: ProductFlag,
    value: bool,
) -> Option<PendingWrite> {
    begin(products, id, flag.field(), |product| flag.set(product, value))
}

/// Product mutations that show up locally before the store confirms them.
///
/// Each mutation runs in three phases: a synchronous `begin_*` that edits the
/// collection, [`ProductController::commit`] that only talks to the store, and
/// [`ProductController::settle`] that reconciles on failure. Callers that do
/// not interleave other work use the `*_optimistic` methods which chain the
/// three.
///
/// A failed write is never undone field by field; the whole collection is
/// refetched. A reload triggered by one failure can therefore overwrite the
/// optimistic effect of another mutation still in flight.
#[derive(Clone)]
pub struct ProductController {
    service: ProductService,
}

impl ProductController {
    pub fn new(service: ProductService) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &ProductService {
        &self.service
    }

    /// Sends the new value of the pending field to the store.
    pub async fn commit(&self, pending: &PendingWrite) -> Result<()> {
        debug!(id = %pending.id(), field = pending.field.label(), "committing optimistic write");
        self.service.write_field(&pending.product, pending.field).await
    }

    /// Reconciles the collection with the outcome of [`ProductController::commit`].
    pub async fn settle(
        &self,
        products: &mut ProductCollection,
        pending: &PendingWrite,
        result: Result<()>,
    ) -> MutationOutcome {
        let Err(error) = result else {
            return MutationOutcome::Applied;
        };

        warn!(
            id = %pending.id(),
            field = pending.field.label(),
            error = %error,
            "optimistic write failed, reloading products"
        );
        products.set_error(format!("Failed to update {}: {}", pending.field.label(), error));

        match self.service.fetch_products().await {
            Ok(fresh) => {
                products.replace_all(fresh);
                MutationOutcome::Reconciled { error }
            }
            Err(reload_error) => {
                error!(error = %reload_error, "reload after failed write failed");
                MutationOutcome::ReloadFailed {
                    error,
                    reload_error,
                }
            }
        }
    }

    async fn run(&self, products: &mut ProductCollection, pending: Option<PendingWrite>) -> MutationOutcome {
        let Some(pending) = pending else {
            return MutationOutcome::Skipped;
        };
        let result = self.commit(&pending).await;
        self.settle(products, &pending, result).await
    }

    pub async fn update_inventory_optimistic(
        &self,
        products: &mut ProductCollection,
        id: &EntityId,
        delta: i64,
    ) -> MutationOutcome {
        let pending = begin_inventory(products, id, delta);
        self.run(products, pending).await
    }

    /// Fails only when `price` is not a finite number; nothing is changed then.
    pub async fn update_price_optimistic(
        &self,
        products: &mut ProductCollection,
        id: &EntityId,
        price: f64,
    ) -> Result<MutationOutcome> {
        let pending = begin_price(products, id, price)?;
        Ok(self.run(products, pending).await)
    }

    pub async fn set_flag_optimistic(
        &self,
        products: &mut ProductCollection,
        id: &EntityId,
        flag: ProductFlag,
        value: bool,
    ) -> MutationOutcome {
        let pending = begin_flag(products, id, flag, value);
        self.run(products, pending).await
    }

    /// Flips the flag from its current local value.
    pub async fn toggle_flag_optimistic(
        &self,
        products: &mut ProductCollection,
        id: &EntityId,
        flag: ProductFlag,
    ) -> MutationOutcome {
        let Some(current) = products.get(id).map(|p| flag.get(p)) else {
            return MutationOutcome::Skipped;
        };
        self.set_flag_optimistic(products, id, flag, !current).await
    }

    /// Removes the product locally, then remotely. A failed remote delete puts
    /// the collection back exactly as it was before the call.
    pub async fn delete_optimistic(
        &self,
        products: &mut ProductCollection,
        id: &EntityId,
    ) -> MutationOutcome {
        let snapshot = products.snapshot();
        if products.remove(id).is_none() {
            return MutationOutcome::Skipped;
        }

        match self.service.delete_product(id).await {
            Ok(()) => MutationOutcome::Applied,
            Err(error) => {
                warn!(%id, error = %error, "delete failed, restoring products");
                products.restore(snapshot);
                products.set_error(format!("Failed to delete product: {}", error));
                MutationOutcome::Restored { error }
            }
        }
    }

    /// Creates the product remotely and prepends what the store returned.
    pub async fn add_product(
        &self,
        products: &mut ProductCollection,
        draft: ProductDraft,
    ) -> Result<Product> {
        let draft = draft.normalized();
        match self.service.add_product(&draft).await {
            Ok(product) => {
                products.prepend(product.clone());
                Ok(product)
            }
            Err(error) => {
                products.set_error(format!("Failed to add product: {}", error));
                Err(error)
            }
        }
    }

    /// Saves every editable field of `product` and swaps in the stored row.
    pub async fn edit_product(
        &self,
        products: &mut ProductCollection,
        product: Product,
    ) -> Result<Product> {
        let id = product.id.clone();
        let product = product.to_draft().normalized().with_id(id);
        match self.service.update_product(&product).await {
            Ok(saved) => {
                if !products.replace(saved.clone()) {
                    debug!(id = %saved.id, "edited product was not in the local list");
                }
                Ok(saved)
            }
            Err(error) => {
                products.set_error(format!("Failed to update product: {}", error));
                Err(error)
            }
        }
    }

    /// Replaces the collection with a fresh fetch and clears the last error.
    pub async fn reload(&self, products: &mut ProductCollection) -> Result<()> {
        match self.service.fetch_products().await {
            Ok(fresh) => {
                products.replace_all(fresh);
                products.clear_error();
                Ok(())
            }
            Err(error) => {
                products.set_error(format!("Failed to load products: {}", error));
                Err(error)
            }
        }
    }
}

impl From<ProductService> for ProductController {
    fn from(service: ProductService) -> Self {
        Self::new(service)
    }
}
