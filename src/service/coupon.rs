use crate::core::{EntityId, Result, Row, StoreError};
use crate::model::coupon::{
    Coupon, CouponDraft, CouponPatch, CouponRejection, CouponValidation,
};
use crate::remote::{RemoteStore, SelectQuery};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error};

pub const COUPONS: &str = "coupons";

fn to_row<T: serde::Serialize>(value: &T) -> Result<Row> {
    match serde_json::to_value(value)? {
        Value::Object(row) => Ok(row),
        other => Err(StoreError::Decode(format!("expected an object, got {}", other))),
    }
}

fn coupon_from_row(row: Row) -> Result<Coupon> {
    Ok(serde_json::from_value(Value::Object(row))?)
}

/// Remote operations on discount coupons.
#[derive(Clone)]
pub struct CouponService {
    store: Arc<dyn RemoteStore>,
}

impl CouponService {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    /// All coupons, newest first.
    pub async fn fetch_coupons(&self) -> Result<Vec<Coupon>> {
        let query = SelectQuery::from(COUPONS).order_desc("created_at");
        let rows = self
            .store
            .select(&query)
            .await
            .inspect_err(|e| error!(error = %e, "error fetching coupons"))?;

        rows.into_iter().map(coupon_from_row).collect()
    }

    /// Validates the draft locally, then inserts it with `used_count = 0`.
    pub async fn create_coupon(&self, draft: CouponDraft) -> Result<Coupon> {
        let draft = draft.validated()?;
        let mut row = to_row(&draft)?;
        row.insert("used_count".to_string(), Value::from(0));

        let created = self
            .store
            .insert(COUPONS, row)
            .await
            .inspect_err(|e| error!(code = %draft.code, error = %e, "error creating coupon"))?;

        coupon_from_row(created)
    }

    /// Replaces the operator-editable fields after local validation and
    /// returns the draft as it was written.
    pub async fn update_coupon(&self, id: &EntityId, draft: CouponDraft) -> Result<CouponDraft> {
        let draft = draft.validated()?;
        self.patch_coupon(id, CouponPatch::from(draft.clone())).await?;
        Ok(draft)
    }

    /// Writes only the fields set in `patch`.
    pub async fn patch_coupon(&self, id: &EntityId, patch: CouponPatch) -> Result<()> {
        self.store
            .update(COUPONS, id, to_row(&patch)?)
            .await
            .inspect_err(|e| error!(%id, error = %e, "error updating coupon"))?;
        Ok(())
    }

    pub async fn delete_coupon(&self, id: &EntityId) -> Result<()> {
        self.store
            .delete(COUPONS, id)
            .await
            .inspect_err(|e| error!(%id, error = %e, "error deleting coupon"))
    }

    /// Looks the code up (case-insensitively) and checks it against the clock.
    pub async fn validate_coupon(&self, code: &str) -> Result<CouponValidation> {
        self.validate_coupon_at(code, Utc::now()).await
    }

    /// [`CouponService::validate_coupon`] against an explicit instant.
    ///
    /// A code that matches no row is a rejection, not an error; transport
    /// failures are still returned as errors.
    pub async fn validate_coupon_at(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<CouponValidation> {
        let code = code.trim().to_uppercase();
        if code.is_empty() {
            return Ok(CouponValidation::Rejected(CouponRejection::NotFound));
        }

        let query = SelectQuery::from(COUPONS).eq("code", code.as_str());
        let row = match self.store.select_single(&query).await {
            Ok(row) => row,
            Err(StoreError::NotFound { .. }) => {
                return Ok(CouponValidation::Rejected(CouponRejection::NotFound));
            }
            Err(e) => {
                error!(%code, error = %e, "error validating coupon");
                return Err(e);
            }
        };

        let coupon = coupon_from_row(row)?;
        let validation = match coupon.check(now) {
            Ok(()) => CouponValidation::Valid(coupon),
            Err(reason) => CouponValidation::Rejected(reason),
        };
        debug!(%code, valid = validation.is_valid(), "coupon validated");
        Ok(validation)
    }

    /// Reads the current `used_count` and writes it back plus one.
    // Not atomic: two concurrent redemptions can both read the same count.
    pub async fn increment_usage(&self, id: &EntityId) -> Result<u32> {
        let query = SelectQuery::from(COUPONS).columns(&["used_count"]).eq_id(id);
        let row = self.store.select_single(&query).await?;
        let used = row
            .get("used_count")
            .map(crate::core::types::coerce_count)
            .unwrap_or(0)
            .saturating_add(1);

        let mut patch = Row::new();
        patch.insert("used_count".to_string(), Value::from(used));
        self.store
            .update(COUPONS, id, patch)
            .await
            .inspect_err(|e| error!(%id, error = %e, "error incrementing coupon usage"))?;
        Ok(used)
    }
}

/// Discount granted by `coupon` on `cart_total`.
pub fn apply_coupon_discount(coupon: &Coupon, cart_total: f64) -> f64 {
    coupon.discount_for(cart_total)
}
