//! # Loyalty Points
//!
//! Loyalty programs, members, tiers, and the append-only activity ledger.
//!
//! ## The Ledger Invariant
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  member.points          == Σ(activity.points)      (signed deltas)     │
//! │  member.lifetime_points == Σ(positive deltas)      never decreases     │
//! │                                                                         │
//! │  earned    +120  ──► points 120, lifetime 120                          │
//! │  redeemed  -100  ──► points  20, lifetime 120                          │
//! │  earned     +50  ──► points  70, lifetime 170                          │
//! │                                                                         │
//! │  Activity rows carry the SIGNED delta, so the balance is a plain sum.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreResult, PromoError};
use crate::money::Money;

// =============================================================================
// Status & Kind Enums
// =============================================================================

/// Status of a loyalty program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum ProgramStatus {
    Active,
    Inactive,
}

/// Status of a loyalty member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    Active,
    Inactive,
    Suspended,
}

/// Kind of a loyalty ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// Enrollment marker written when a member joins (zero delta).
    Enrolled,
    /// Points earned (positive delta; counts toward lifetime points).
    Earned,
    /// Points spent (negative delta).
    Redeemed,
    /// Points lapsed past the program's expiration window (negative delta).
    Expired,
    /// Manual correction (either sign; positive corrections do NOT count
    /// toward lifetime points).
    Adjusted,
    /// Tier change marker (zero delta).
    TierChanged,
}

/// How fractional point computations are resolved.
///
/// Each mode has real semantics (see [`compute_points`]); `Exact` is a
/// "no partial credit" policy that only awards whole-number results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    Up,
    Down,
    Half,
    Exact,
}

impl Default for RoundingMode {
    fn default() -> Self {
        RoundingMode::Down
    }
}

// =============================================================================
// Settings
// =============================================================================

/// Per-program behavioral settings, stored as a JSON column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoyaltySettings {
    #[serde(default)]
    pub earn_on_purchase: bool,
    #[serde(default)]
    pub earn_on_referral: bool,
    #[serde(default)]
    pub earn_on_review: bool,

    /// Purchases below this amount earn nothing.
    #[serde(default)]
    pub minimum_purchase_cents: i64,

    /// Points lapse this many days after being earned, when set.
    #[serde(default)]
    pub points_expiration_days: Option<i64>,

    #[serde(default)]
    pub rounding: RoundingMode,

    #[serde(default)]
    pub redemption_enabled: bool,

    /// Cash value of one point when redeeming, in cents.
    #[serde(default = "default_redemption_value_cents")]
    pub redemption_value_cents: i64,

    /// Smallest redemption a member may request.
    #[serde(default = "default_minimum_redemption_points")]
    pub minimum_redemption_points: i64,
}

fn default_redemption_value_cents() -> i64 {
    1
}

fn default_minimum_redemption_points() -> i64 {
    100
}

impl Default for LoyaltySettings {
    fn default() -> Self {
        LoyaltySettings {
            earn_on_purchase: true,
            earn_on_referral: false,
            earn_on_review: false,
            minimum_purchase_cents: 0,
            points_expiration_days: None,
            rounding: RoundingMode::default(),
            redemption_enabled: true,
            redemption_value_cents: default_redemption_value_cents(),
            minimum_redemption_points: default_minimum_redemption_points(),
        }
    }
}

// =============================================================================
// Entities
// =============================================================================

/// A merchant's loyalty program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoyaltyProgram {
    pub id: String,
    pub merchant_id: String,
    pub name: String,
    pub description: Option<String>,
    pub status: ProgramStatus,

    /// Spend required to earn one point, in cents (default 100 = $1/point).
    pub point_value_cents: i64,
    /// Earn multiplier in basis points (10000 = 100%).
    pub reward_ratio_bps: u32,

    pub settings: LoyaltySettings,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A customer enrolled in a loyalty program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoyaltyMember {
    pub id: String,
    pub program_id: String,
    pub customer_id: String,

    /// Current redeemable balance. Invariant: Σ(activity deltas).
    pub points: i64,
    /// Sum of earn-type deltas only; never decreases.
    pub lifetime_points: i64,

    pub tier_id: Option<String>,
    pub status: MemberStatus,

    pub enrolled_at: DateTime<Utc>,
    pub last_activity_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A reward level inside a program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoyaltyTier {
    pub id: String,
    pub program_id: String,
    pub name: String,
    pub description: Option<String>,
    /// Lifetime points needed to qualify.
    pub minimum_points: i64,
    /// Ordered benefit list, stored as a JSON column.
    pub benefits: Vec<Benefit>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One benefit a tier grants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Benefit {
    pub kind: BenefitKind,
    /// Kind-dependent magnitude: bps for `Discount`, points for
    /// `BonusPoints`, unused otherwise.
    #[serde(default)]
    pub value: i64,
    #[serde(default)]
    pub description: String,
}

/// Kind of tier benefit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenefitKind {
    Discount,
    FreeShipping,
    BonusPoints,
    ExclusiveItems,
}

/// One entry in a member's activity ledger. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoyaltyActivity {
    pub id: String,
    pub member_id: String,
    pub kind: ActivityKind,
    /// Signed point delta (earn positive, redeem/expire negative).
    pub points: i64,
    pub description: String,
    /// Optional external reference (order, review, referral).
    pub reference_id: Option<String>,
    /// Free-form context, stored as a JSON column.
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Point Computation
// =============================================================================

/// Computes the points earned for a purchase under a program's rules.
///
/// Returns 0 when earn-on-purchase is disabled or the purchase is below the
/// program minimum. Otherwise:
/// ```text
/// raw = purchase_cents × reward_ratio_bps / (point_value_cents × 10000)
/// ```
/// resolved to an integer by the program's rounding mode:
/// - `Down`  — floor
/// - `Up`    — ceiling
/// - `Half`  — round half up
/// - `Exact` — the raw value only when it is already whole, else 0
///   (no partial credit)
///
/// ## Example
/// ```rust
/// use promo_core::loyalty::{LoyaltyProgram, compute_points};
/// # use promo_core::loyalty::{LoyaltySettings, ProgramStatus};
/// use promo_core::money::Money;
/// # use chrono::Utc;
/// # let now = Utc::now();
/// # let program = LoyaltyProgram {
/// #     id: "p".into(), merchant_id: "m".into(), name: "Rewards".into(),
/// #     description: None, status: ProgramStatus::Active,
/// #     point_value_cents: 100, reward_ratio_bps: 10_000,
/// #     settings: LoyaltySettings::default(), created_at: now, updated_at: now,
/// # };
/// // $1 per point at 100%: a $25.00 purchase earns 25 points
/// assert_eq!(compute_points(&program, Money::from_cents(2_500)), 25);
/// ```
pub fn compute_points(program: &LoyaltyProgram, purchase_amount: Money) -> i64 {
    if !program.settings.earn_on_purchase {
        return 0;
    }

    if purchase_amount.cents() < program.settings.minimum_purchase_cents {
        return 0;
    }

    if program.point_value_cents <= 0 {
        return 0;
    }

    let numerator = purchase_amount.cents() as i128 * program.reward_ratio_bps as i128;
    let denominator = program.point_value_cents as i128 * 10_000;

    let points = match program.settings.rounding {
        RoundingMode::Down => numerator / denominator,
        RoundingMode::Up => (numerator + denominator - 1) / denominator,
        RoundingMode::Half => (numerator + denominator / 2) / denominator,
        RoundingMode::Exact => {
            if numerator % denominator == 0 {
                numerator / denominator
            } else {
                0
            }
        }
    };

    points as i64
}

// =============================================================================
// Precondition Checks
// =============================================================================

/// Checks that a member may earn points.
pub fn check_earnable(member: &LoyaltyMember, points: i64) -> CoreResult<()> {
    if member.status != MemberStatus::Active {
        return Err(PromoError::MemberInactive(member.id.clone()));
    }

    if points <= 0 {
        return Err(PromoError::InvalidAmount {
            reason: "earned points must be positive".to_string(),
        });
    }

    Ok(())
}

/// Checks that a member may redeem `points`.
///
/// Read-only; the store re-enforces `points <= member.points` atomically
/// when the redemption is recorded.
pub fn check_redeemable_points(member: &LoyaltyMember, points: i64) -> CoreResult<()> {
    if member.status != MemberStatus::Active {
        return Err(PromoError::MemberInactive(member.id.clone()));
    }

    if points <= 0 {
        return Err(PromoError::InvalidAmount {
            reason: "redeemed points must be positive".to_string(),
        });
    }

    if member.points < points {
        return Err(PromoError::InsufficientPoints {
            available: member.points,
            requested: points,
        });
    }

    Ok(())
}

/// Picks the highest tier whose threshold the member's lifetime points meet.
pub fn tier_for_points<'a>(tiers: &'a [LoyaltyTier], lifetime_points: i64) -> Option<&'a LoyaltyTier> {
    tiers
        .iter()
        .filter(|t| t.minimum_points <= lifetime_points)
        .max_by_key(|t| t.minimum_points)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn program(rounding: RoundingMode) -> LoyaltyProgram {
        let now = Utc::now();
        LoyaltyProgram {
            id: "program-1".to_string(),
            merchant_id: "merchant-1".to_string(),
            name: "Rewards".to_string(),
            description: None,
            status: ProgramStatus::Active,
            point_value_cents: 100,  // $1 per point
            reward_ratio_bps: 10_000, // 100%
            settings: LoyaltySettings {
                rounding,
                ..Default::default()
            },
            created_at: now,
            updated_at: now,
        }
    }

    fn member(points: i64) -> LoyaltyMember {
        let now = Utc::now();
        LoyaltyMember {
            id: "member-1".to_string(),
            program_id: "program-1".to_string(),
            customer_id: "customer-1".to_string(),
            points,
            lifetime_points: points,
            tier_id: None,
            status: MemberStatus::Active,
            enrolled_at: now,
            last_activity_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_compute_points_whole_amount() {
        // $25.00 at $1/point, 100% ratio → 25 points under every mode
        for mode in [
            RoundingMode::Down,
            RoundingMode::Up,
            RoundingMode::Half,
            RoundingMode::Exact,
        ] {
            assert_eq!(compute_points(&program(mode), Money::from_cents(2_500)), 25);
        }
    }

    #[test]
    fn test_rounding_modes_differ_on_fractions() {
        // $25.50 at $1/point → raw 25.5
        let amount = Money::from_cents(2_550);
        assert_eq!(compute_points(&program(RoundingMode::Down), amount), 25);
        assert_eq!(compute_points(&program(RoundingMode::Up), amount), 26);
        assert_eq!(compute_points(&program(RoundingMode::Half), amount), 26);
        assert_eq!(compute_points(&program(RoundingMode::Exact), amount), 0);

        // $25.25 → raw 25.25; Half rounds down here
        let amount = Money::from_cents(2_525);
        assert_eq!(compute_points(&program(RoundingMode::Half), amount), 25);
    }

    #[test]
    fn test_earn_on_purchase_disabled() {
        let mut p = program(RoundingMode::Down);
        p.settings.earn_on_purchase = false;
        assert_eq!(compute_points(&p, Money::from_cents(10_000)), 0);
    }

    #[test]
    fn test_minimum_purchase_amount() {
        let mut p = program(RoundingMode::Down);
        p.settings.minimum_purchase_cents = 5_000;
        assert_eq!(compute_points(&p, Money::from_cents(4_999)), 0);
        assert_eq!(compute_points(&p, Money::from_cents(5_000)), 50);
    }

    #[test]
    fn test_reward_ratio_scales_points() {
        let mut p = program(RoundingMode::Down);
        p.reward_ratio_bps = 20_000; // 200%: double points event
        assert_eq!(compute_points(&p, Money::from_cents(2_500)), 50);
    }

    #[test]
    fn test_check_redeemable_points() {
        assert!(check_redeemable_points(&member(100), 100).is_ok());

        let err = check_redeemable_points(&member(50), 100).unwrap_err();
        assert!(matches!(
            err,
            PromoError::InsufficientPoints {
                available: 50,
                requested: 100,
            }
        ));
    }

    #[test]
    fn test_inactive_member_cannot_earn_or_redeem() {
        let mut m = member(100);
        m.status = MemberStatus::Suspended;
        assert!(matches!(
            check_earnable(&m, 10).unwrap_err(),
            PromoError::MemberInactive(_)
        ));
        assert!(matches!(
            check_redeemable_points(&m, 10).unwrap_err(),
            PromoError::MemberInactive(_)
        ));
    }

    #[test]
    fn test_non_positive_deltas_rejected() {
        assert!(check_earnable(&member(0), 0).is_err());
        assert!(check_redeemable_points(&member(100), -5).is_err());
    }

    #[test]
    fn test_tier_for_points_picks_highest_met_threshold() {
        let now = Utc::now();
        let tier = |name: &str, min: i64| LoyaltyTier {
            id: name.to_string(),
            program_id: "program-1".to_string(),
            name: name.to_string(),
            description: None,
            minimum_points: min,
            benefits: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        let tiers = vec![tier("bronze", 0), tier("silver", 500), tier("gold", 2000)];

        assert_eq!(tier_for_points(&tiers, 100).unwrap().name, "bronze");
        assert_eq!(tier_for_points(&tiers, 500).unwrap().name, "silver");
        assert_eq!(tier_for_points(&tiers, 9999).unwrap().name, "gold");
        assert!(tier_for_points(&[], 100).is_none());
    }
}
