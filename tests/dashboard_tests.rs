use serde_json::{Value, json};
use shopdesk::facade::INVALID_CREDENTIALS_MESSAGE;
use shopdesk::remote::{FaultTarget, IdKind};
use shopdesk::service::cart::CART;
use shopdesk::service::coupon::COUPONS;
use shopdesk::service::order::{ORDERS, ORDER_ITEMS, PROFILES};
use shopdesk::service::product::PRODUCTS;
use shopdesk::{
    CouponDraft, Dashboard, DiscountType, EntityId, MemoryStore, ProductCache, ProductDraft,
    ProductFlag, Row, StoreError, ValidationError, friendly_message,
};
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

const EMAIL: &str = "admin@loja.com";
const PASSWORD: &str = "chuteira123";

fn row(value: Value) -> Row {
    value.as_object().cloned().unwrap()
}

async fn shop() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.register_account(EMAIL, PASSWORD).await.unwrap();
    store.define_collection(COUPONS, IdKind::Uuid).await;

    store
        .seed(
            PRODUCTS,
            vec![
                row(json!({"id": 1, "name": "Mercurial Vapor", "brand": "Nike", "price": 899.9,
                           "surface": "Campo",
                           "stock": [{"size": "40", "color": "Preto", "quantity": 12}]})),
                row(json!({"id": 2, "name": "Predator Edge", "brand": "Adidas", "price": 749.0,
                           "surface": "Society",
                           "stock": [{"size": "41", "color": "Branco", "quantity": 3}]})),
                row(json!({"id": 3, "name": "Future Play", "brand": "Puma", "price": 399.0,
                           "stock": null})),
            ],
        )
        .await;
    store
        .seed(PROFILES, vec![row(json!({"id": "u1", "full_name": "Bia", "email": "bia@x.com"}))])
        .await;
    store
        .seed(
            ORDERS,
            vec![row(json!({"id": 10, "user_id": "u1", "status": "paid", "total_amount": 899.9,
                            "address_snapshot": {"street": "Rua A", "number": "1", "city": "Recife",
                                                 "state": "PE", "cep": "50000-000", "neighborhood": "Boa Vista"}}))],
        )
        .await;
    store
        .seed(
            ORDER_ITEMS,
            vec![row(json!({"id": 100, "order_id": 10, "product_id": 1, "name": "Mercurial Vapor",
                            "quantity": 1, "price_at_purchase": 899.9}))],
        )
        .await;
    store
        .seed(CART, vec![row(json!({"id": 1, "user_id": "u1", "product_id": 2, "quantity": 2}))])
        .await;
    store
}

async fn signed_in() -> (Arc<MemoryStore>, Dashboard) {
    let store = shop().await;
    let mut dashboard = Dashboard::with_backend(store.clone());
    assert_ok!(dashboard.sign_in(EMAIL, PASSWORD).await);
    (store, dashboard)
}

#[tokio::test]
async fn test_data_operations_require_session() {
    let store = shop().await;
    let mut dashboard = Dashboard::with_backend(store.clone());

    assert!(matches!(dashboard.refresh_all().await, Err(StoreError::Unauthenticated)));
    assert!(matches!(
        dashboard.adjust_inventory(&EntityId::Int(1), 1).await,
        Err(StoreError::Unauthenticated)
    ));
    assert!(matches!(dashboard.cart_groups().await, Err(StoreError::Unauthenticated)));
    assert!(store.write_log().await.is_empty());
}

#[tokio::test]
async fn test_sign_in_validates_locally_and_maps_bad_credentials() {
    let store = shop().await;
    let mut dashboard = Dashboard::with_backend(store);

    assert!(matches!(
        dashboard.sign_in("  ", PASSWORD).await,
        Err(StoreError::Validation(ValidationError::Required("email")))
    ));
    assert!(matches!(
        dashboard.sign_in(EMAIL, "").await,
        Err(StoreError::Validation(ValidationError::Required("password")))
    ));

    let err = dashboard.sign_in(EMAIL, "wrong-password").await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidCredentials));
    assert_eq!(friendly_message(&err), INVALID_CREDENTIALS_MESSAGE);
    assert!(!dashboard.is_authenticated());

    let session = dashboard.sign_in(EMAIL, PASSWORD).await.unwrap();
    assert_eq!(session.email, EMAIL);
    assert!(dashboard.is_authenticated());
}

#[tokio::test]
async fn test_refresh_all_loads_every_list() {
    let (_, mut dashboard) = signed_in().await;
    assert_ok!(dashboard.refresh_all().await);

    let stats = dashboard.stats();
    assert_eq!(stats.product_count, 3);
    assert_eq!(stats.total_items, 15);
    assert_eq!(stats.low_stock_count, 2);

    assert_eq!(dashboard.orders().len(), 1);
    assert_eq!(dashboard.orders()[0].items.len(), 1);
    assert_eq!(dashboard.orders()[0].customer.as_ref().unwrap().name, "Bia");
    assert!(dashboard.coupons().is_empty());

    let groups = dashboard.cart_groups().await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].email, "bia@x.com");
    assert_eq!(groups[0].total(), 1498.0);
}

#[tokio::test]
async fn test_refresh_all_is_all_or_nothing() {
    let (store, mut dashboard) = signed_in().await;
    assert_ok!(dashboard.refresh_all().await);
    let before = dashboard.products().clone();

    store
        .seed(PRODUCTS, vec![row(json!({"id": 4, "name": "Phantom", "stock": []}))])
        .await;
    store.fail_next(FaultTarget::Reads, 1).await;
    assert_err!(dashboard.refresh_all().await);

    assert_eq!(dashboard.products(), &before);
}

#[tokio::test]
async fn test_search_and_mutations_through_the_dashboard() {
    let (store, mut dashboard) = signed_in().await;
    assert_ok!(dashboard.reload_products().await);

    dashboard.set_search("adi");
    let visible: Vec<_> = dashboard.visible_products().iter().map(|p| p.id.clone()).collect();
    assert_eq!(visible, vec![EntityId::Int(2)]);

    let outcome = dashboard.adjust_inventory(&EntityId::Int(2), 10).await.unwrap();
    assert!(outcome.is_applied());
    let outcome = dashboard
        .toggle_flag(&EntityId::Int(2), ProductFlag::FreeShipping)
        .await
        .unwrap();
    assert!(outcome.is_applied());
    assert_eq!(dashboard.stats().low_stock_count, 1);

    let stored = store.rows(PRODUCTS).await;
    assert_eq!(stored[1]["stock"][0]["quantity"], json!(13));
    assert_eq!(stored[1]["free_shipping"], json!(true));

    let added = dashboard
        .add_product(ProductDraft {
            inventory: 20,
            ..ProductDraft::new("Tiempo Legend", 499.0)
        })
        .await
        .unwrap();
    assert_eq!(dashboard.products().products()[0].id, added.id);

    let outcome = dashboard.delete_product(&added.id).await.unwrap();
    assert!(outcome.is_applied());
    assert_eq!(dashboard.stats().product_count, 3);
}

#[tokio::test]
async fn test_tracking_code_is_mirrored_locally() {
    let (_, mut dashboard) = signed_in().await;
    assert_ok!(dashboard.reload_orders().await);
    let id = EntityId::Int(10);

    assert_err!(dashboard.update_tracking_code(&id, "   ").await);
    assert!(!dashboard.orders()[0].has_tracking_code());

    assert_ok!(dashboard.update_tracking_code(&id, " QB123456789BR ").await);
    assert_eq!(dashboard.orders()[0].tracking_code.as_deref(), Some("QB123456789BR"));

    let reloaded = dashboard.reload_orders().await.unwrap();
    assert_eq!(reloaded[0].tracking_code.as_deref(), Some("QB123456789BR"));
}

#[tokio::test]
async fn test_coupon_lifecycle() {
    let (_, mut dashboard) = signed_in().await;
    let draft = CouponDraft {
        code: "frete10".into(),
        discount_type: DiscountType::Fixed,
        discount_value: 10.0,
        expiration_date: "2099-01-01".into(),
        usage_limit_user: 1,
        is_active: true,
        first_purchase_only: false,
    };

    let created = dashboard.create_coupon(draft.clone()).await.unwrap();
    assert_eq!(dashboard.coupons()[0].code, "FRETE10");
    assert!(dashboard.validate_coupon("Frete10").await.unwrap().is_valid());

    assert_ok!(dashboard.set_coupon_active(&created.id, false).await);
    assert!(!dashboard.coupons()[0].is_active);
    assert!(!dashboard.validate_coupon("FRETE10").await.unwrap().is_valid());

    let edited = CouponDraft {
        discount_value: 15.0,
        is_active: true,
        ..draft
    };
    assert_ok!(dashboard.update_coupon(&created.id, edited).await);
    assert_eq!(dashboard.coupons()[0].discount_value, 15.0);

    assert_eq!(dashboard.redeem_coupon(&created.id).await.unwrap(), 1);
    assert!(!dashboard.validate_coupon("FRETE10").await.unwrap().is_valid());

    assert_ok!(dashboard.delete_coupon(&created.id).await);
    assert!(dashboard.coupons().is_empty());
}

#[tokio::test]
async fn test_coupon_edit_is_kept_when_reads_fail() {
    let (store, mut dashboard) = signed_in().await;
    let draft = CouponDraft {
        code: "PIX5".into(),
        discount_type: DiscountType::Fixed,
        discount_value: 5.0,
        expiration_date: "2099-01-01".into(),
        usage_limit_user: 10,
        is_active: true,
        first_purchase_only: false,
    };
    let created = dashboard.create_coupon(draft.clone()).await.unwrap();

    store.fail_next(FaultTarget::Reads, 1).await;
    let edited = CouponDraft { discount_value: 9.0, ..draft };
    assert_ok!(dashboard.update_coupon(&created.id, edited).await);

    assert_eq!(dashboard.coupons()[0].discount_value, 9.0);
    assert_eq!(store.rows(COUPONS).await[0]["discount_value"], json!(9.0));
}

#[tokio::test]
async fn test_sign_out_drops_local_state() {
    let (_, mut dashboard) = signed_in().await;
    assert_ok!(dashboard.refresh_all().await);

    assert_ok!(dashboard.sign_out().await);
    assert!(!dashboard.is_authenticated());
    assert!(dashboard.products().is_empty());
    assert!(dashboard.orders().is_empty());
    assert!(matches!(dashboard.reload_products().await, Err(StoreError::Unauthenticated)));
}

#[tokio::test]
async fn test_cache_follows_refresh() {
    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("products.json");

    let (_, mut dashboard) = signed_in().await;
    dashboard = dashboard.with_cache(ProductCache::new(&cache_path));
    assert_ok!(dashboard.refresh_all().await);

    let cached = ProductCache::new(&cache_path).load().await;
    assert_eq!(cached.as_slice(), dashboard.products().products());

    let store = shop().await;
    let mut offline = Dashboard::with_backend(store).with_cache(ProductCache::new(&cache_path));
    assert_eq!(offline.load_cached_products().await, 3);
    assert_eq!(offline.stats().total_items, 15);
}
