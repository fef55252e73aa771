//! # Promotions & Discount Codes
//!
//! Domain types for promotional campaigns and their redeemable codes, plus
//! the stateless discount-code validator.
//!
//! ## Entity Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Promotion (campaign)                                                   │
//! │    └── DiscountCode (redeemable string, own usage ceiling)             │
//! │          └── CodeUsage (append-only usage ledger, immutable rows)      │
//! │                                                                         │
//! │  Aggregate fields (used_count on code AND promotion) are updated in    │
//! │  the same store transaction as the CodeUsage insert. The rows          │
//! │  themselves are never mutated after creation.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Validation Is Read-Only
//! [`validate_code`] computes a discount or returns the first violated
//! condition. It never writes; recording a usage is a separate operation on
//! the store so the two concerns cannot be accidentally fused.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreResult, PromoError};
use crate::money::Money;

// =============================================================================
// Status & Kind Enums
// =============================================================================

/// Lifecycle status of a promotion.
///
/// Transitions are restricted: `scheduled → active → expired`, plus the
/// administrative toggle `active ↔ inactive`. See [`PromoStatus::can_transition_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum PromoStatus {
    /// Start date is in the future; not yet redeemable.
    Scheduled,
    /// Live and redeemable (subject to the validity window).
    Active,
    /// Administratively paused.
    Inactive,
    /// Past its end date; terminal.
    Expired,
}

impl PromoStatus {
    /// Checks whether an administrative status change is allowed.
    ///
    /// ## Allowed Transitions
    /// ```text
    /// scheduled ──► active ──► expired     (lifecycle)
    ///                 ▲
    ///                 ▼
    ///              inactive                (pause / resume)
    /// ```
    /// A no-op transition (same status) is always allowed.
    pub fn can_transition_to(self, next: PromoStatus) -> bool {
        use PromoStatus::*;
        match (self, next) {
            (a, b) if a == b => true,
            (Scheduled, Active) => true,
            (Active, Expired) => true,
            (Active, Inactive) => true,
            (Inactive, Active) => true,
            _ => false,
        }
    }
}

/// What kind of campaign a promotion is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PromoKind {
    Discount,
    Bogo,
    FreeShipping,
    Volume,
    GiftCard,
    LoyaltyPoints,
}

/// Status of a discount code, independent of its parent promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum CodeStatus {
    Active,
    Inactive,
    Expired,
}

/// How a promotion's discount is distributed across eligible line items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum AllocationMethod {
    /// Applied to each eligible item individually.
    Each,
    /// Split proportionally across eligible items.
    Across,
    /// Applied once at the customer/order level.
    Customer,
}

// =============================================================================
// Target & Prerequisites (tagged variants)
// =============================================================================

/// What the discount is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Order,
    Product,
    Shipping,
    Customer,
}

/// The discount value, as a tagged variant.
///
/// ## Why Not value + value_type Fields?
/// A kind + payload enum makes every match exhaustive: adding a new value
/// kind is a compile error at every computation site instead of a silently
/// ignored branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiscountValue {
    /// Percentage of the order amount, in basis points (1000 = 10%).
    Percentage { bps: u32 },
    /// Fixed amount in cents. Deliberately NOT clamped to the order amount;
    /// capping is caller-side policy.
    Fixed { cents: i64 },
    /// The full order amount.
    Free,
}

/// The target of a promotion: a discount value aimed at a target kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromoTarget {
    pub kind: TargetKind,
    pub value: DiscountValue,
}

impl PromoTarget {
    /// Computes the discount amount for an order amount.
    ///
    /// ## Example
    /// ```rust
    /// use promo_core::money::Money;
    /// use promo_core::promotion::{DiscountValue, PromoTarget, TargetKind};
    ///
    /// let target = PromoTarget {
    ///     kind: TargetKind::Order,
    ///     value: DiscountValue::Percentage { bps: 1000 },
    /// };
    /// assert_eq!(target.discount_amount(Money::from_cents(10_000)).cents(), 1_000);
    /// ```
    pub fn discount_amount(&self, order_amount: Money) -> Money {
        match self.value {
            DiscountValue::Percentage { bps } => order_amount.percent_of(bps),
            DiscountValue::Fixed { cents } => Money::from_cents(cents),
            DiscountValue::Free => order_amount,
        }
    }
}

/// A condition gating promotion eligibility, as a tagged variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Prerequisite {
    /// Order subtotal must be at least this many cents.
    MinimumOrderAmount { cents: i64 },
    /// Order must contain at least this many units.
    MinimumQuantity { quantity: i64 },
    /// Customer must belong to the named group.
    CustomerGroup { group_id: String },
    /// Customer must previously have purchased the named product.
    PriorPurchase { product_id: String },
}

/// Eligibility scope: which products a promotion applies to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppliesTo {
    /// When true, the scope lists are ignored and everything is eligible.
    #[serde(default)]
    pub all_products: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub products: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub collections: Vec<String>,
}

// =============================================================================
// Entities
// =============================================================================

/// A merchant-defined promotional campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Promotion {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Merchant this promotion belongs to.
    pub merchant_id: String,

    pub name: String,
    pub description: Option<String>,
    pub status: PromoStatus,
    pub kind: PromoKind,

    /// Ordering weight when multiple promotions are eligible (higher wins).
    pub priority: i64,

    /// Validity window start.
    pub starts_at: DateTime<Utc>,
    /// Optional validity window end.
    pub ends_at: Option<DateTime<Utc>>,

    /// Optional ceiling on total redemptions across all codes.
    pub usage_limit: Option<i64>,
    /// Running redemption count. Invariant: never exceeds `usage_limit`.
    pub used_count: i64,

    pub applies_to: AppliesTo,
    pub target: PromoTarget,
    pub allocation: AllocationMethod,
    /// Ordered list of eligibility conditions.
    pub prerequisites: Vec<Prerequisite>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Promotion {
    /// Checks whether `now` falls inside the validity window.
    pub fn in_window(&self, now: DateTime<Utc>) -> bool {
        if self.starts_at > now {
            return false;
        }
        match self.ends_at {
            Some(end) => end >= now,
            None => true,
        }
    }

    /// Checks whether the promotion-level usage ceiling has been reached.
    pub fn usage_exhausted(&self) -> bool {
        matches!(self.usage_limit, Some(limit) if self.used_count >= limit)
    }
}

/// A redeemable code tied to exactly one promotion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscountCode {
    pub id: String,
    pub promotion_id: String,

    /// Unique code string presented by the customer (e.g., "SAVE10").
    pub code: String,

    pub status: CodeStatus,

    /// Optional ceiling on total uses of this code.
    pub usage_limit: Option<i64>,
    /// Running use count. Invariant: equals count(usages), never exceeds
    /// `usage_limit`.
    pub used_count: i64,

    /// Per-customer use ceiling (default 1).
    pub customer_use_limit: i64,

    pub expires_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DiscountCode {
    /// Checks whether the code's own expiry has passed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(at) if at < now)
    }

    /// Checks whether the code-level usage ceiling has been reached.
    pub fn usage_exhausted(&self) -> bool {
        matches!(self.usage_limit, Some(limit) if self.used_count >= limit)
    }
}

/// One use of a discount code. Immutable once created; this is the
/// append-only usage ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeUsage {
    pub id: String,
    pub discount_code_id: String,
    pub customer_id: Option<String>,
    pub order_id: Option<String>,
    /// Discount amount applied, in cents.
    pub amount_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl CodeUsage {
    /// Returns the applied amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Discount Code Validator
// =============================================================================

/// Validates a discount code against its parent promotion and computes the
/// discount amount. Read-only: recording the usage is a separate operation.
///
/// ## Check Order (first failing check wins)
/// ```text
/// 1. code status active?             → CodeInactive
/// 2. code expiry passed?             → CodeExpired
/// 3. promotion status active?        → CodeInactive
/// 4. promotion started?              → CodeInactive
/// 5. promotion end date passed?      → CodeExpired
/// 6. code usage ceiling reached?     → UsageLimitExceeded
/// 7. customer ceiling reached?       → CustomerUsageLimitExceeded
/// 8. compute discount from target
/// ```
/// The code lookup itself (not-found → InvalidCode) happens in the engine,
/// which also supplies the customer's prior usage count when a customer
/// identity accompanies the request.
pub fn validate_code(
    code: &DiscountCode,
    promotion: &Promotion,
    customer_usage_count: Option<i64>,
    order_amount: Money,
    now: DateTime<Utc>,
) -> CoreResult<Money> {
    if code.status != CodeStatus::Active {
        return Err(PromoError::CodeInactive(code.code.clone()));
    }

    if code.is_expired(now) {
        return Err(PromoError::CodeExpired(code.code.clone()));
    }

    if promotion.status != PromoStatus::Active {
        return Err(PromoError::CodeInactive(code.code.clone()));
    }

    if promotion.starts_at > now {
        return Err(PromoError::CodeInactive(code.code.clone()));
    }

    // A promotion past its end date expires every code under it, even codes
    // with no expiry of their own.
    if matches!(promotion.ends_at, Some(end) if end < now) {
        return Err(PromoError::CodeExpired(code.code.clone()));
    }

    if let Some(limit) = code.usage_limit {
        if code.used_count >= limit {
            return Err(PromoError::UsageLimitExceeded {
                code: code.code.clone(),
                limit,
            });
        }
    }

    if let Some(prior_uses) = customer_usage_count {
        if prior_uses >= code.customer_use_limit {
            return Err(PromoError::CustomerUsageLimitExceeded {
                code: code.code.clone(),
                limit: code.customer_use_limit,
            });
        }
    }

    Ok(promotion.target.discount_amount(order_amount))
}

// =============================================================================
// Unit Tests
// =============================================================================
