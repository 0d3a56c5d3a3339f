use super::null_as_default;
use crate::core::{EntityId, ValidationError};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MAX_CODE_LEN: usize = 20;

lazy_static! {
    static ref CODE_PATTERN: Regex = Regex::new(r"^\S+$").expect("coupon code pattern is valid");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::Fixed => "fixed",
        }
    }
}

// A null or missing type is treated like any other non-percentage value.
impl Default for DiscountType {
    fn default() -> Self {
        Self::Fixed
    }
}

// Anything that is not explicitly a percentage discounts a fixed amount.
impl From<String> for DiscountType {
    fn from(value: String) -> Self {
        if value == "percentage" {
            Self::Percentage
        } else {
            Self::Fixed
        }
    }
}

impl From<DiscountType> for String {
    fn from(value: DiscountType) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: EntityId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub discount_type: DiscountType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub discount_value: f64,
    #[serde(default)]
    pub expiration_date: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub usage_limit_user: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub used_count: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub first_purchase_only: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Coupon {
    /// A null expiry reads as the epoch, so the coupon is already expired.
    /// An unparseable one never expires.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        match &self.expiration_date {
            Some(raw) => parse_expiration(raw),
            None => Some(DateTime::<Utc>::UNIX_EPOCH),
        }
    }

    /// Overwrites the operator-editable fields with `draft`.
    pub fn apply_draft(&mut self, draft: CouponDraft) {
        self.code = draft.code;
        self.discount_type = draft.discount_type;
        self.discount_value = draft.discount_value;
        self.expiration_date = Some(draft.expiration_date);
        self.usage_limit_user = draft.usage_limit_user;
        self.is_active = draft.is_active;
        self.first_purchase_only = draft.first_purchase_only;
    }

    pub fn remaining_uses(&self) -> u32 {
        self.usage_limit_user.saturating_sub(self.used_count)
    }

    /// Runs the acceptance checks in their fixed order; the first failure wins.
    pub fn check(&self, now: DateTime<Utc>) -> Result<(), CouponRejection> {
        if !self.is_active {
            return Err(CouponRejection::Inactive);
        }
        if self.expires_at().is_some_and(|at| at < now) {
            return Err(CouponRejection::Expired);
        }
        if self.used_count >= self.usage_limit_user {
            return Err(CouponRejection::UsageLimitReached);
        }
        Ok(())
    }

    /// Amount taken off `cart_total`.
    ///
    /// Percentage coupons scale the total; fixed coupons never exceed it.
    pub fn discount_for(&self, cart_total: f64) -> f64 {
        match self.discount_type {
            DiscountType::Percentage => cart_total * (self.discount_value / 100.0),
            DiscountType::Fixed => self.discount_value.min(cart_total),
        }
    }
}

/// Accepts RFC 3339, naive date-times (read as UTC) and bare dates
/// (midnight UTC). Unparseable input has no expiry.
pub fn parse_expiration(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(at) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(at.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|at| at.and_utc())
}

/// Why a coupon code was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CouponRejection {
    NotFound,
    Inactive,
    Expired,
    UsageLimitReached,
}

impl CouponRejection {
    pub fn message(&self) -> &'static str {
        match self {
            Self::NotFound => "Coupon not found",
            Self::Inactive => "This coupon is inactive",
            Self::Expired => "This coupon has expired",
            Self::UsageLimitReached => "This coupon has reached its usage limit",
        }
    }
}

impl fmt::Display for CouponRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CouponValidation {
    Valid(Coupon),
    Rejected(CouponRejection),
}

impl CouponValidation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    pub fn coupon(&self) -> Option<&Coupon> {
        match self {
            Self::Valid(coupon) => Some(coupon),
            Self::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<CouponRejection> {
        match self {
            Self::Valid(_) => None,
            Self::Rejected(reason) => Some(*reason),
        }
    }
}

/// Coupon fields an operator fills in. The store assigns `id`,
/// `created_at` and starts `used_count` at zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CouponDraft {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    pub expiration_date: String,
    pub usage_limit_user: u32,
    pub is_active: bool,
    pub first_purchase_only: bool,
}

impl CouponDraft {
    /// Checks required fields and normalizes the code to trimmed upper case.
    pub fn validated(mut self) -> Result<Self, ValidationError> {
        let code = self.code.trim().to_uppercase();
        if code.is_empty() {
            return Err(ValidationError::Required("code"));
        }
        if code.chars().count() > MAX_CODE_LEN || !CODE_PATTERN.is_match(&code) {
            return Err(ValidationError::Invalid {
                field: "code",
                reason: format!("must be a single word of at most {} characters", MAX_CODE_LEN),
            });
        }
        if !(self.discount_value.is_finite() && self.discount_value > 0.0) {
            return Err(ValidationError::Invalid {
                field: "discount_value",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.expiration_date.trim().is_empty() {
            return Err(ValidationError::Required("expiration_date"));
        }
        if parse_expiration(&self.expiration_date).is_none() {
            return Err(ValidationError::Invalid {
                field: "expiration_date",
                reason: format!("'{}' is not a date", self.expiration_date),
            });
        }
        if self.usage_limit_user == 0 {
            return Err(ValidationError::Invalid {
                field: "usage_limit_user",
                reason: "must be greater than zero".to_string(),
            });
        }

        self.code = code;
        self.expiration_date = self.expiration_date.trim().to_string();
        Ok(self)
    }
}

/// Partial coupon update; `None` fields are left untouched remotely.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CouponPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_type: Option<DiscountType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_limit_user: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_purchase_only: Option<bool>,
}

impl From<CouponDraft> for CouponPatch {
    fn from(draft: CouponDraft) -> Self {
        Self {
            code: Some(draft.code),
            discount_type: Some(draft.discount_type),
            discount_value: Some(draft.discount_value),
            expiration_date: Some(draft.expiration_date),
            usage_limit_user: Some(draft.usage_limit_user),
            is_active: Some(draft.is_active),
            first_purchase_only: Some(draft.first_purchase_only),
        }
    }
}
