// ============================================================================
// shopdesk library
// ============================================================================

pub mod cache;
pub mod core;
pub mod facade;
pub mod mapping;
pub mod model;
pub mod optimistic;
pub mod remote;
pub mod service;

// Re-export main types for convenience
pub use cache::ProductCache;
pub use core::{EntityId, Result, Row, StoreError, ValidationError};
pub use facade::{Dashboard, DashboardStats, friendly_message};
pub use model::{
    AdminCartItem, CartGroup, Category, Coupon, CouponDraft, CouponPatch, CouponRejection,
    CouponValidation, DiscountType, Order, Product, ProductDraft, StockOption,
};
pub use optimistic::{MutationOutcome, ProductCollection, ProductController, ProductFlag};

// Re-export the store seams and backends
pub use remote::{AuthProvider, MemoryStore, RemoteStore, RestStore, Session, StoreConfig};

// ============================================================================
// Connecting
// ============================================================================

/// Opens a dashboard against the hosted store described by `config`.
///
/// The dashboard starts signed out; call [`Dashboard::sign_in`] before any
/// data operation.
///
/// # Examples
///
/// ```no_run
/// # async fn run() -> shopdesk::Result<()> {
/// let config = shopdesk::StoreConfig::from_env()?;
/// let mut dashboard = shopdesk::connect(config)?;
/// dashboard.sign_in("admin@shop.com", "secret").await?;
/// dashboard.refresh_all().await?;
/// println!("{} products", dashboard.stats().product_count);
/// # Ok(())
/// # }
/// ```
pub fn connect(config: StoreConfig) -> Result<Dashboard> {
    let store = std::sync::Arc::new(RestStore::new(config)?);
    Ok(Dashboard::with_backend(store))
}

/// A dashboard over a fresh in-process store, for demos and tests.
///
/// # Examples
///
/// ```
/// # tokio_test::block_on(async {
/// let (store, mut dashboard) = shopdesk::connect_in_memory();
/// store.register_account("admin@shop.com", "secret1").await.unwrap();
///
/// dashboard.sign_in("admin@shop.com", "secret1").await.unwrap();
/// assert!(dashboard.is_authenticated());
/// # });
/// ```
pub fn connect_in_memory() -> (std::sync::Arc<MemoryStore>, Dashboard) {
    let store = std::sync::Arc::new(MemoryStore::new());
    let dashboard = Dashboard::with_backend(store.clone());
    (store, dashboard)
}
