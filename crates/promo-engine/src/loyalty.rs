//! # Loyalty Operations
//!
//! Program management, enrollment, point accrual and redemption, and tier
//! placement.
//!
//! ## Accrual Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  earn_points_for_purchase(member, $25.50 order)                         │
//! │       │                                                                 │
//! │       ├── load member + program                                         │
//! │       ├── compute_points()  ← program ratio, minimum, rounding mode     │
//! │       │       └── 0 points? return None, no ledger write                │
//! │       ├── check_earnable()  ← member must be active                     │
//! │       └── repo.earn_points  ← aggregate + ledger row in one tx          │
//! │                                                                         │
//! │  Tier placement is driven by lifetime points, which only earn-type      │
//! │  entries feed; redemptions never demote a member.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use chrono::Utc;
use promo_core::loyalty::{
    check_earnable, check_redeemable_points, compute_points, tier_for_points, ActivityKind,
    Benefit, LoyaltyActivity, LoyaltyMember, LoyaltyProgram, LoyaltySettings, LoyaltyTier,
    MemberStatus, ProgramStatus,
};
use promo_core::{
    validation, Money, PromoError, DEFAULT_POINT_VALUE_CENTS, DEFAULT_REWARD_RATIO_BPS,
};

use promo_db::Page;

use crate::error::EngineResult;
use crate::PromotionEngine;

// =============================================================================
// Request Types
// =============================================================================

/// Request to create a loyalty program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLoyaltyProgram {
    pub merchant_id: String,
    pub name: String,
    pub description: Option<String>,
    /// Spend per point in cents; defaults to 100 ($1 per point).
    pub point_value_cents: Option<i64>,
    /// Earn multiplier in basis points; defaults to 10000 (100%).
    pub reward_ratio_bps: Option<u32>,
    pub settings: Option<LoyaltySettings>,
}

/// Partial update of a loyalty program. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateLoyaltyProgram {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProgramStatus>,
    pub point_value_cents: Option<i64>,
    pub reward_ratio_bps: Option<u32>,
    pub settings: Option<LoyaltySettings>,
}

/// Request to create a tier inside a program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTier {
    pub program_id: String,
    pub name: String,
    pub description: Option<String>,
    pub minimum_points: i64,
    #[serde(default)]
    pub benefits: Vec<Benefit>,
}

/// Partial update of a tier. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTier {
    pub name: Option<String>,
    pub description: Option<String>,
    pub minimum_points: Option<i64>,
    pub benefits: Option<Vec<Benefit>>,
}

// =============================================================================
// Operations
// =============================================================================

impl PromotionEngine {
    /// Creates a loyalty program with defaulted economics.
    pub async fn create_loyalty_program(
        &self,
        req: CreateLoyaltyProgram,
    ) -> EngineResult<LoyaltyProgram> {
        validation::validate_name(&req.name)?;

        let point_value_cents = req.point_value_cents.unwrap_or(DEFAULT_POINT_VALUE_CENTS);
        validation::validate_positive_amount("point_value", point_value_cents)?;

        let now = Utc::now();
        let program = LoyaltyProgram {
            id: Uuid::new_v4().to_string(),
            merchant_id: req.merchant_id,
            name: req.name.trim().to_string(),
            description: req.description,
            status: ProgramStatus::Active,
            point_value_cents,
            reward_ratio_bps: req.reward_ratio_bps.unwrap_or(DEFAULT_REWARD_RATIO_BPS),
            settings: req.settings.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };

        self.db().loyalty().insert_program(&program).await?;

        info!(id = %program.id, name = %program.name, "Loyalty program created");
        Ok(program)
    }

    /// Gets a program by ID.
    pub async fn get_loyalty_program(&self, id: &str) -> EngineResult<LoyaltyProgram> {
        self.db()
            .loyalty()
            .get_program(id)
            .await?
            .ok_or_else(|| PromoError::ProgramNotFound(id.to_string()).into())
    }

    /// Lists a merchant's programs.
    pub async fn list_loyalty_programs(
        &self,
        merchant_id: &str,
    ) -> EngineResult<Vec<LoyaltyProgram>> {
        Ok(self.db().loyalty().list_programs(merchant_id).await?)
    }

    /// Applies a partial update to a program. `None` fields are left
    /// unchanged; the updated program is returned.
    pub async fn update_loyalty_program(
        &self,
        id: &str,
        req: UpdateLoyaltyProgram,
    ) -> EngineResult<LoyaltyProgram> {
        let mut program = self.get_loyalty_program(id).await?;

        if let Some(name) = req.name {
            program.name = name.trim().to_string();
        }
        if let Some(description) = req.description {
            program.description = Some(description);
        }
        if let Some(status) = req.status {
            program.status = status;
        }
        if let Some(point_value_cents) = req.point_value_cents {
            program.point_value_cents = point_value_cents;
        }
        if let Some(reward_ratio_bps) = req.reward_ratio_bps {
            program.reward_ratio_bps = reward_ratio_bps;
        }
        if let Some(settings) = req.settings {
            program.settings = settings;
        }

        validation::validate_name(&program.name)?;
        validation::validate_positive_amount("point_value", program.point_value_cents)?;

        program.updated_at = Utc::now();
        self.db().loyalty().update_program(&program).await?;

        info!(id = %id, "Loyalty program updated");
        Ok(program)
    }

    // =========================================================================
    // Tiers
    // =========================================================================

    /// Creates a tier inside a program.
    pub async fn create_tier(&self, req: CreateTier) -> EngineResult<LoyaltyTier> {
        validation::validate_name(&req.name)?;
        self.get_loyalty_program(&req.program_id).await?;

        let now = Utc::now();
        let tier = LoyaltyTier {
            id: Uuid::new_v4().to_string(),
            program_id: req.program_id,
            name: req.name.trim().to_string(),
            description: req.description,
            minimum_points: req.minimum_points.max(0),
            benefits: req.benefits,
            created_at: now,
            updated_at: now,
        };

        self.db().loyalty().insert_tier(&tier).await?;

        info!(id = %tier.id, name = %tier.name, min = tier.minimum_points, "Tier created");
        Ok(tier)
    }

    /// Gets a tier by ID.
    pub async fn get_tier(&self, id: &str) -> EngineResult<LoyaltyTier> {
        self.db()
            .loyalty()
            .get_tier(id)
            .await?
            .ok_or_else(|| PromoError::TierNotFound(id.to_string()).into())
    }

    /// Lists a program's tiers, lowest threshold first.
    pub async fn list_tiers(&self, program_id: &str) -> EngineResult<Vec<LoyaltyTier>> {
        Ok(self.db().loyalty().list_tiers(program_id).await?)
    }

    /// Applies a partial update to a tier.
    ///
    /// Threshold changes do not re-place existing members; placement
    /// catches up on their next [`refresh_member_tier`](Self::refresh_member_tier).
    pub async fn update_tier(&self, id: &str, req: UpdateTier) -> EngineResult<LoyaltyTier> {
        let mut tier = self.get_tier(id).await?;

        if let Some(name) = req.name {
            tier.name = name.trim().to_string();
        }
        if let Some(description) = req.description {
            tier.description = Some(description);
        }
        if let Some(minimum_points) = req.minimum_points {
            tier.minimum_points = minimum_points.max(0);
        }
        if let Some(benefits) = req.benefits {
            tier.benefits = benefits;
        }

        validation::validate_name(&tier.name)?;

        tier.updated_at = Utc::now();
        self.db().loyalty().update_tier(&tier).await?;

        info!(id = %id, "Tier updated");
        Ok(tier)
    }

    // =========================================================================
    // Members
    // =========================================================================

    /// Enrolls a customer into a program.
    ///
    /// Writes the zero-point enrollment marker into the activity ledger in
    /// the same transaction as the member row.
    pub async fn enroll_member(
        &self,
        program_id: &str,
        customer_id: &str,
    ) -> EngineResult<LoyaltyMember> {
        self.get_loyalty_program(program_id).await?;

        let now = Utc::now();
        let member = LoyaltyMember {
            id: Uuid::new_v4().to_string(),
            program_id: program_id.to_string(),
            customer_id: customer_id.to_string(),
            points: 0,
            lifetime_points: 0,
            tier_id: None,
            status: MemberStatus::Active,
            enrolled_at: now,
            last_activity_at: None,
            created_at: now,
            updated_at: now,
        };

        self.db().loyalty().insert_member(&member).await?;

        info!(id = %member.id, customer = %customer_id, "Member enrolled");
        Ok(member)
    }

    /// Gets a member by ID.
    pub async fn get_member(&self, id: &str) -> EngineResult<LoyaltyMember> {
        self.db()
            .loyalty()
            .get_member(id)
            .await?
            .ok_or_else(|| PromoError::MemberNotFound(id.to_string()).into())
    }

    /// Gets a member by program and customer.
    pub async fn get_member_by_customer(
        &self,
        program_id: &str,
        customer_id: &str,
    ) -> EngineResult<LoyaltyMember> {
        self.db()
            .loyalty()
            .get_member_by_customer(program_id, customer_id)
            .await?
            .ok_or_else(|| PromoError::MemberNotFound(customer_id.to_string()).into())
    }

    /// Sets a member's status.
    ///
    /// Inactive and suspended members keep their balance but fail the
    /// earn/redeem guards until reactivated.
    pub async fn set_member_status(
        &self,
        member_id: &str,
        status: MemberStatus,
    ) -> EngineResult<()> {
        self.get_member(member_id).await?;
        self.db()
            .loyalty()
            .set_member_status(member_id, status, Utc::now())
            .await?;

        info!(member_id = %member_id, ?status, "Member status changed");
        Ok(())
    }

    // =========================================================================
    // Points
    // =========================================================================

    /// Computes (without recording) the points a purchase would earn.
    pub async fn calculate_points(
        &self,
        program_id: &str,
        purchase_amount: Money,
    ) -> EngineResult<i64> {
        let program = self.get_loyalty_program(program_id).await?;
        Ok(compute_points(&program, purchase_amount))
    }

    /// Accrues points for a purchase.
    ///
    /// Returns the ledger entry, or `None` when the program's rules yield
    /// zero points (earn disabled, below minimum, or Exact rounding with a
    /// fractional result); zero-point purchases leave no ledger row.
    pub async fn earn_points_for_purchase(
        &self,
        member_id: &str,
        purchase_amount: Money,
        order_id: Option<&str>,
    ) -> EngineResult<Option<LoyaltyActivity>> {
        let member = self.get_member(member_id).await?;
        let program = self.get_loyalty_program(&member.program_id).await?;

        let points = compute_points(&program, purchase_amount);
        if points == 0 {
            debug!(member_id = %member_id, amount = %purchase_amount, "Purchase earned no points");
            return Ok(None);
        }

        check_earnable(&member, points)?;

        let activity = self
            .db()
            .loyalty()
            .earn_points(
                &member.id,
                points,
                ActivityKind::Earned,
                true,
                "Points earned from purchase",
                order_id,
                Utc::now(),
            )
            .await?;

        match activity {
            Some(activity) => {
                info!(member_id = %member_id, points, "Points earned");
                Ok(Some(activity))
            }
            None => Err(PromoError::MemberInactive(member.id).into()),
        }
    }

    /// Redeems points from a member's balance.
    pub async fn redeem_points(
        &self,
        member_id: &str,
        points: i64,
        description: &str,
    ) -> EngineResult<LoyaltyActivity> {
        let member = self.get_member(member_id).await?;
        let program = self.get_loyalty_program(&member.program_id).await?;

        if !program.settings.redemption_enabled {
            return Err(PromoError::InvalidAmount {
                reason: "redemption is disabled for this program".to_string(),
            }
            .into());
        }
        if points < program.settings.minimum_redemption_points {
            return Err(PromoError::InvalidAmount {
                reason: format!(
                    "minimum redemption is {} points",
                    program.settings.minimum_redemption_points
                ),
            }
            .into());
        }

        check_redeemable_points(&member, points)?;

        let activity = self
            .db()
            .loyalty()
            .redeem_points(
                &member.id,
                points,
                ActivityKind::Redeemed,
                description,
                None,
                Utc::now(),
            )
            .await?;

        match activity {
            Some(activity) => {
                info!(member_id = %member_id, points, "Points redeemed");
                Ok(activity)
            }
            // The guard lost to a concurrent redemption; re-read to report
            // the current balance
            None => {
                let current = self.get_member(member_id).await?;
                check_redeemable_points(&current, points)?;
                Err(PromoError::InsufficientPoints {
                    available: current.points,
                    requested: points,
                }
                .into())
            }
        }
    }

    /// Applies a signed manual point correction.
    ///
    /// Positive corrections restore balance without feeding lifetime points;
    /// negative ones are guarded like a redemption.
    pub async fn adjust_points(
        &self,
        member_id: &str,
        delta: i64,
        description: &str,
    ) -> EngineResult<LoyaltyActivity> {
        if delta == 0 {
            return Err(PromoError::InvalidAmount {
                reason: "adjustment must be non-zero".to_string(),
            }
            .into());
        }

        let member = self.get_member(member_id).await?;

        let activity = if delta > 0 {
            check_earnable(&member, delta)?;
            self.db()
                .loyalty()
                .earn_points(
                    &member.id,
                    delta,
                    ActivityKind::Adjusted,
                    false,
                    description,
                    None,
                    Utc::now(),
                )
                .await?
        } else {
            check_redeemable_points(&member, -delta)?;
            self.db()
                .loyalty()
                .redeem_points(
                    &member.id,
                    -delta,
                    ActivityKind::Adjusted,
                    description,
                    None,
                    Utc::now(),
                )
                .await?
        };

        match activity {
            Some(activity) => {
                info!(member_id = %member_id, delta, "Points adjusted");
                Ok(activity)
            }
            None => {
                let current = self.get_member(member_id).await?;
                Err(PromoError::InsufficientPoints {
                    available: current.points,
                    requested: -delta,
                }
                .into())
            }
        }
    }

    /// Re-places a member into the highest tier their lifetime points meet.
    ///
    /// Returns the new tier when placement changed, `None` when it didn't.
    /// Members without a qualifying tier keep `tier_id = None`.
    pub async fn refresh_member_tier(
        &self,
        member_id: &str,
    ) -> EngineResult<Option<LoyaltyTier>> {
        let member = self.get_member(member_id).await?;
        let tiers = self.list_tiers(&member.program_id).await?;

        let target = tier_for_points(&tiers, member.lifetime_points);
        let target_id = target.map(|t| t.id.as_str());

        if target_id == member.tier_id.as_deref() {
            return Ok(None);
        }

        let tier_name = target.map(|t| t.name.as_str()).unwrap_or("none");
        self.db()
            .loyalty()
            .set_member_tier(&member.id, target_id, tier_name, Utc::now())
            .await?;

        info!(member_id = %member_id, tier = ?target_id, "Member tier updated");
        Ok(target.cloned())
    }

    /// Lists a member's activity ledger, newest first.
    pub async fn list_member_activities(
        &self,
        member_id: &str,
        page: Page,
    ) -> EngineResult<Vec<LoyaltyActivity>> {
        Ok(self.db().loyalty().list_activities(member_id, page).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use promo_core::loyalty::RoundingMode;
    use promo_db::{Database, DbConfig};

    async fn engine() -> PromotionEngine {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        PromotionEngine::new(db)
    }

    fn program_req() -> CreateLoyaltyProgram {
        CreateLoyaltyProgram {
            merchant_id: "merchant-1".to_string(),
            name: "Rewards".to_string(),
            description: None,
            point_value_cents: None,
            reward_ratio_bps: None,
            settings: None,
        }
    }

    async fn enrolled(engine: &PromotionEngine) -> (LoyaltyProgram, LoyaltyMember) {
        let program = engine.create_loyalty_program(program_req()).await.unwrap();
        let member = engine.enroll_member(&program.id, "cust-1").await.unwrap();
        (program, member)
    }

    #[tokio::test]
    async fn test_program_defaults() {
        let engine = engine().await;
        let program = engine.create_loyalty_program(program_req()).await.unwrap();

        assert_eq!(program.point_value_cents, 100);
        assert_eq!(program.reward_ratio_bps, 10_000);
        assert!(program.settings.earn_on_purchase);
    }

    #[tokio::test]
    async fn test_purchase_earns_points_at_defaults() {
        let engine = engine().await;
        let (_, member) = enrolled(&engine).await;

        // $25.00 at $1/point, 100% → 25 points
        let activity = engine
            .earn_points_for_purchase(&member.id, Money::from_cents(2_500), Some("order-1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(activity.points, 25);
        assert_eq!(activity.kind, ActivityKind::Earned);

        let loaded = engine.get_member(&member.id).await.unwrap();
        assert_eq!(loaded.points, 25);
        assert_eq!(loaded.lifetime_points, 25);
    }

    #[tokio::test]
    async fn test_zero_point_purchase_writes_no_ledger_row() {
        let engine = engine().await;
        let (_, member) = enrolled(&engine).await;

        // 50 cents at $1/point floors to 0
        let activity = engine
            .earn_points_for_purchase(&member.id, Money::from_cents(50), None)
            .await
            .unwrap();
        assert!(activity.is_none());

        // Only the enrollment marker exists
        let activities = engine
            .list_member_activities(&member.id, Page::default())
            .await
            .unwrap();
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].kind, ActivityKind::Enrolled);
    }

    #[tokio::test]
    async fn test_rounding_mode_flows_from_settings() {
        let engine = engine().await;
        let mut settings = LoyaltySettings::default();
        settings.rounding = RoundingMode::Up;
        let program = engine
            .create_loyalty_program(CreateLoyaltyProgram {
                settings: Some(settings),
                ..program_req()
            })
            .await
            .unwrap();

        // $25.50 → raw 25.5 → ceiling 26
        let points = engine
            .calculate_points(&program.id, Money::from_cents(2_550))
            .await
            .unwrap();
        assert_eq!(points, 26);
    }

    #[tokio::test]
    async fn test_redeem_respects_minimum_and_balance() {
        let engine = engine().await;
        let (_, member) = enrolled(&engine).await;
        engine
            .earn_points_for_purchase(&member.id, Money::from_cents(15_000), None)
            .await
            .unwrap();

        // Below the default 100-point minimum
        let err = engine
            .redeem_points(&member.id, 50, "Reward")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "invalid_amount");

        // Within balance
        engine.redeem_points(&member.id, 100, "Reward").await.unwrap();
        let loaded = engine.get_member(&member.id).await.unwrap();
        assert_eq!(loaded.points, 50);
        assert_eq!(loaded.lifetime_points, 150);

        // Beyond remaining balance
        let err = engine
            .redeem_points(&member.id, 100, "Reward")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "insufficient_points");
    }

    #[tokio::test]
    async fn test_double_enrollment_is_duplicate() {
        let engine = engine().await;
        let (program, _) = enrolled(&engine).await;

        let err = engine.enroll_member(&program.id, "cust-1").await.unwrap_err();
        assert_eq!(err.code(), "duplicate");
    }

    #[tokio::test]
    async fn test_tier_refresh_follows_lifetime_points() {
        let engine = engine().await;
        let (program, member) = enrolled(&engine).await;

        engine
            .create_tier(CreateTier {
                program_id: program.id.clone(),
                name: "Silver".to_string(),
                description: None,
                minimum_points: 100,
                benefits: Vec::new(),
            })
            .await
            .unwrap();
        let gold = engine
            .create_tier(CreateTier {
                program_id: program.id.clone(),
                name: "Gold".to_string(),
                description: None,
                minimum_points: 500,
                benefits: Vec::new(),
            })
            .await
            .unwrap();

        // No qualifying tier yet (thresholds start above zero)
        assert!(engine.refresh_member_tier(&member.id).await.unwrap().is_none());

        engine
            .earn_points_for_purchase(&member.id, Money::from_cents(60_000), None)
            .await
            .unwrap();

        let placed = engine.refresh_member_tier(&member.id).await.unwrap().unwrap();
        assert_eq!(placed.id, gold.id);

        // Redeeming does not demote: lifetime points are untouched
        engine.redeem_points(&member.id, 500, "Reward").await.unwrap();
        assert!(engine.refresh_member_tier(&member.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_adjustment_signs_and_lifetime() {
        let engine = engine().await;
        let (_, member) = enrolled(&engine).await;

        engine.adjust_points(&member.id, 40, "Support credit").await.unwrap();
        engine.adjust_points(&member.id, -10, "Correction").await.unwrap();

        let loaded = engine.get_member(&member.id).await.unwrap();
        assert_eq!(loaded.points, 30);
        assert_eq!(loaded.lifetime_points, 0); // corrections never feed lifetime

        let err = engine.adjust_points(&member.id, 0, "No-op").await.unwrap_err();
        assert_eq!(err.code(), "invalid_amount");
    }

    #[tokio::test]
    async fn test_suspended_member_cannot_earn() {
        let engine = engine().await;
        let (_, member) = enrolled(&engine).await;

        engine
            .set_member_status(&member.id, MemberStatus::Suspended)
            .await
            .unwrap();

        let err = engine
            .earn_points_for_purchase(&member.id, Money::from_cents(2_500), None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "member_inactive");

        // Reactivation restores the earn path
        engine
            .set_member_status(&member.id, MemberStatus::Active)
            .await
            .unwrap();
        let activity = engine
            .earn_points_for_purchase(&member.id, Money::from_cents(2_500), None)
            .await
            .unwrap();
        assert!(activity.is_some());
    }

    #[tokio::test]
    async fn test_raised_tier_threshold_applies_on_refresh() {
        let engine = engine().await;
        let (program, member) = enrolled(&engine).await;

        let silver = engine
            .create_tier(CreateTier {
                program_id: program.id.clone(),
                name: "Silver".to_string(),
                description: None,
                minimum_points: 100,
                benefits: Vec::new(),
            })
            .await
            .unwrap();

        engine
            .earn_points_for_purchase(&member.id, Money::from_cents(15_000), None)
            .await
            .unwrap();
        let placed = engine.refresh_member_tier(&member.id).await.unwrap().unwrap();
        assert_eq!(placed.id, silver.id);

        engine
            .update_tier(
                &silver.id,
                UpdateTier {
                    minimum_points: Some(200),
                    ..UpdateTier::default()
                },
            )
            .await
            .unwrap();

        // 150 lifetime points no longer qualify
        assert!(engine.refresh_member_tier(&member.id).await.unwrap().is_none());
        let loaded = engine.get_member(&member.id).await.unwrap();
        assert!(loaded.tier_id.is_none());
    }
}
