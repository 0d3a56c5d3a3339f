use crate::cache::ProductCache;
use crate::core::{EntityId, Result, StoreError, ValidationError};
use crate::model::cart::CartGroup;
use crate::model::coupon::{Coupon, CouponDraft, CouponPatch, CouponValidation};
use crate::model::order::Order;
use crate::model::product::{Product, ProductDraft};
use crate::optimistic::{MutationOutcome, ProductCollection, ProductController, ProductFlag};
use crate::remote::{AuthProvider, RemoteStore, Session};
use crate::service::{CartService, CouponService, OrderService, ProductService};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

/// Shown instead of the store's wording when the credentials are wrong.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Incorrect e-mail or password.";

/// Message to show an operator for a failed call.
pub fn friendly_message(error: &StoreError) -> String {
    match error {
        StoreError::InvalidCredentials => INVALID_CREDENTIALS_MESSAGE.to_string(),
        other => other.to_string(),
    }
}

/// Header figures of the product list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardStats {
    pub product_count: usize,
    pub total_items: u64,
    pub low_stock_count: usize,
}

/// One operator session over the back office.
///
/// Owns the local product, order and coupon lists. Every data operation
/// requires a live session and fails with [`StoreError::Unauthenticated`]
/// otherwise.
pub struct Dashboard {
    auth: Arc<dyn AuthProvider>,
    session: Option<Session>,
    controller: ProductController,
    orders_service: OrderService,
    coupons_service: CouponService,
    carts_service: CartService,
    cache: Option<ProductCache>,
    products: ProductCollection,
    orders: Vec<Order>,
    coupons: Vec<Coupon>,
    search: String,
}

impl Dashboard {
    pub fn new(store: Arc<dyn RemoteStore>, auth: Arc<dyn AuthProvider>) -> Self {
        Self {
            auth,
            session: None,
            controller: ProductController::new(ProductService::new(store.clone())),
            orders_service: OrderService::new(store.clone()),
            coupons_service: CouponService::new(store.clone()),
            carts_service: CartService::new(store),
            cache: None,
            products: ProductCollection::new(),
            orders: Vec::new(),
            coupons: Vec::new(),
            search: String::new(),
        }
    }

    /// A dashboard whose store also handles sign-in.
    pub fn with_backend<B>(backend: Arc<B>) -> Self
    where
        B: RemoteStore + AuthProvider + 'static,
    {
        Self::new(backend.clone(), backend)
    }

    /// Keeps a disk snapshot of the product list in step with every refresh.
    pub fn with_cache(mut self, cache: ProductCache) -> Self {
        self.cache = Some(cache);
        self
    }

    // Session

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| !s.is_expired_at(Utc::now()))
    }

    /// Both fields are required before anything is sent.
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<&Session> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ValidationError::Required("email").into());
        }
        if password.is_empty() {
            return Err(ValidationError::Required("password").into());
        }

        let session = self
            .auth
            .sign_in(email, password)
            .await
            .inspect_err(|e| warn!(email, error = %e, "sign-in failed"))?;
        info!(email = %session.email, "signed in");
        Ok(&*self.session.insert(session))
    }

    /// Ends the session and drops all local state, even if the remote
    /// sign-out fails.
    pub async fn sign_out(&mut self) -> Result<()> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };
        self.products = ProductCollection::new();
        self.orders.clear();
        self.coupons.clear();
        self.search.clear();
        self.auth.sign_out(&session).await
    }

    fn require_session(&self) -> Result<()> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(StoreError::Unauthenticated)
        }
    }

    /// Fetches products, orders and coupons concurrently. Nothing local
    /// changes unless all three succeed.
    pub async fn refresh_all(&mut self) -> Result<()> {
        self.require_session()?;
        let products = self.controller.service();
        let (fresh_products, orders, coupons) = futures::try_join!(
            products.fetch_products(),
            self.orders_service.fetch_orders(),
            self.coupons_service.fetch_coupons()
        )?;

        self.products.replace_all(fresh_products);
        self.products.clear_error();
        self.orders = orders;
        self.coupons = coupons;
        self.save_cache().await;
        Ok(())
    }

    // Products

    pub fn products(&self) -> &ProductCollection {
        &self.products
    }

    /// Prefills the product list from the disk cache, if one is configured.
    pub async fn load_cached_products(&mut self) -> usize {
        let Some(cache) = &self.cache else {
            return 0;
        };
        let cached = cache.load().await;
        let count = cached.len();
        self.products.replace_all(cached);
        count
    }

    async fn save_cache(&self) {
        if let Some(cache) = &self.cache {
            // Cache failures are logged by the cache and never fail the caller.
            let _ = cache.save(self.products.products()).await;
        }
    }

    pub fn set_search(&mut self, query: &str) {
        self.search = query.to_string();
    }

    /// Products matching the current search.
    pub fn visible_products(&self) -> Vec<&Product> {
        self.products.filter(&self.search)
    }

    pub fn stats(&self) -> DashboardStats {
        DashboardStats {
            product_count: self.products.len(),
            total_items: self.products.total_items(),
            low_stock_count: self.products.low_stock_count(),
        }
    }

    pub async fn reload_products(&mut self) -> Result<()> {
        self.require_session()?;
        self.controller.reload(&mut self.products).await?;
        self.save_cache().await;
        Ok(())
    }

    pub async fn adjust_inventory(&mut self, id: &EntityId, delta: i64) -> Result<MutationOutcome> {
        self.require_session()?;
        Ok(self
            .controller
            .update_inventory_optimistic(&mut self.products, id, delta)
            .await)
    }

    pub async fn update_price(&mut self, id: &EntityId, price: f64) -> Result<MutationOutcome> {
        self.require_session()?;
        self.controller
            .update_price_optimistic(&mut self.products, id, price)
            .await
    }

    pub async fn set_flag(
        &mut self,
        id: &EntityId,
        flag: ProductFlag,
        value: bool,
    ) -> Result<MutationOutcome> {
        self.require_session()?;
        Ok(self
            .controller
            .set_flag_optimistic(&mut self.products, id, flag, value)
            .await)
    }

    pub async fn toggle_flag(&mut self, id: &EntityId, flag: ProductFlag) -> Result<MutationOutcome> {
        self.require_session()?;
        Ok(self
            .controller
            .toggle_flag_optimistic(&mut self.products, id, flag)
            .await)
    }

    pub async fn delete_product(&mut self, id: &EntityId) -> Result<MutationOutcome> {
        self.require_session()?;
        Ok(self.controller.delete_optimistic(&mut self.products, id).await)
    }

    pub async fn add_product(&mut self, draft: ProductDraft) -> Result<Product> {
        self.require_session()?;
        self.controller.add_product(&mut self.products, draft).await
    }

    pub async fn edit_product(&mut self, product: Product) -> Result<Product> {
        self.require_session()?;
        self.controller.edit_product(&mut self.products, product).await
    }

    // Orders

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub async fn reload_orders(&mut self) -> Result<&[Order]> {
        self.require_session()?;
        self.orders = self.orders_service.fetch_orders().await?;
        Ok(&self.orders)
    }

    /// Saves the code remotely, then mirrors it on the local order.
    pub async fn update_tracking_code(&mut self, id: &EntityId, code: &str) -> Result<()> {
        self.require_session()?;
        self.orders_service.update_tracking_code(id, code).await?;
        if let Some(order) = self.orders.iter_mut().find(|o| &o.id == id) {
            order.tracking_code = Some(code.trim().to_string());
        }
        Ok(())
    }

    // Coupons

    pub fn coupons(&self) -> &[Coupon] {
        &self.coupons
    }

    pub async fn reload_coupons(&mut self) -> Result<&[Coupon]> {
        self.require_session()?;
        self.coupons = self.coupons_service.fetch_coupons().await?;
        Ok(&self.coupons)
    }

    pub async fn create_coupon(&mut self, draft: CouponDraft) -> Result<Coupon> {
        self.require_session()?;
        let coupon = self.coupons_service.create_coupon(draft).await?;
        self.coupons.insert(0, coupon.clone());
        Ok(coupon)
    }

    /// Saves the edit and mirrors the written fields onto the local coupon.
    pub async fn update_coupon(&mut self, id: &EntityId, draft: CouponDraft) -> Result<()> {
        self.require_session()?;
        let written = self.coupons_service.update_coupon(id, draft).await?;
        if let Some(coupon) = self.coupons.iter_mut().find(|c| &c.id == id) {
            coupon.apply_draft(written);
        }
        Ok(())
    }

    pub async fn set_coupon_active(&mut self, id: &EntityId, active: bool) -> Result<()> {
        self.require_session()?;
        let patch = CouponPatch {
            is_active: Some(active),
            ..CouponPatch::default()
        };
        self.coupons_service.patch_coupon(id, patch).await?;
        if let Some(coupon) = self.coupons.iter_mut().find(|c| &c.id == id) {
            coupon.is_active = active;
        }
        Ok(())
    }

    pub async fn delete_coupon(&mut self, id: &EntityId) -> Result<()> {
        self.require_session()?;
        self.coupons_service.delete_coupon(id).await?;
        self.coupons.retain(|c| &c.id != id);
        Ok(())
    }

    pub async fn validate_coupon(&self, code: &str) -> Result<CouponValidation> {
        self.require_session()?;
        self.coupons_service.validate_coupon(code).await
    }

    pub async fn redeem_coupon(&self, id: &EntityId) -> Result<u32> {
        self.require_session()?;
        self.coupons_service.increment_usage(id).await
    }

    // Carts

    pub async fn cart_groups(&self) -> Result<Vec<CartGroup>> {
        self.require_session()?;
        self.carts_service.fetch_grouped().await
    }
}
