//! # Loyalty Repository
//!
//! Database operations for loyalty programs, members, tiers, and the
//! activity ledger.
//!
//! ## Point Mutation Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │            earn_points() / redeem_points() - One Transaction            │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    │                                                                    │
//! │    ├── UPDATE loyalty_members                                           │
//! │    │   SET points = points ± n, [lifetime_points = lifetime + n]        │
//! │    │   WHERE id = ? [AND points >= n]     ← redeem guard                │
//! │    │        │                                                           │
//! │    │        └── 0 rows? ──► ROLLBACK, denied                            │
//! │    │                                                                    │
//! │    └── INSERT loyalty_activities (signed delta)                         │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Invariant: member.points == SUM(activity deltas), enforced by never    │
//! │  touching one side without the other.                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use crate::repository::Page;
use promo_core::loyalty::{
    ActivityKind, LoyaltyActivity, LoyaltyMember, LoyaltyProgram, LoyaltySettings, LoyaltyTier,
    MemberStatus,
};

// =============================================================================
// Row Mapping
// =============================================================================

fn map_program(row: &SqliteRow) -> DbResult<LoyaltyProgram> {
    let settings: String = row.try_get("settings")?;

    Ok(LoyaltyProgram {
        id: row.try_get("id")?,
        merchant_id: row.try_get("merchant_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        status: row.try_get("status")?,
        point_value_cents: row.try_get("point_value_cents")?,
        reward_ratio_bps: row.try_get::<i64, _>("reward_ratio_bps")? as u32,
        settings: serde_json::from_str::<LoyaltySettings>(&settings)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn map_member(row: &SqliteRow) -> DbResult<LoyaltyMember> {
    Ok(LoyaltyMember {
        id: row.try_get("id")?,
        program_id: row.try_get("program_id")?,
        customer_id: row.try_get("customer_id")?,
        points: row.try_get("points")?,
        lifetime_points: row.try_get("lifetime_points")?,
        tier_id: row.try_get("tier_id")?,
        status: row.try_get("status")?,
        enrolled_at: row.try_get("enrolled_at")?,
        last_activity_at: row.try_get("last_activity_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn map_tier(row: &SqliteRow) -> DbResult<LoyaltyTier> {
    let benefits: String = row.try_get("benefits")?;

    Ok(LoyaltyTier {
        id: row.try_get("id")?,
        program_id: row.try_get("program_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        minimum_points: row.try_get("minimum_points")?,
        benefits: serde_json::from_str(&benefits)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn map_activity(row: &SqliteRow) -> DbResult<LoyaltyActivity> {
    let metadata: String = row.try_get("metadata")?;

    Ok(LoyaltyActivity {
        id: row.try_get("id")?,
        member_id: row.try_get("member_id")?,
        kind: row.try_get("kind")?,
        points: row.try_get("points")?,
        description: row.try_get("description")?,
        reference_id: row.try_get("reference_id")?,
        metadata: serde_json::from_str(&metadata)?,
        created_at: row.try_get("created_at")?,
    })
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for loyalty program, member, tier, and activity operations.
#[derive(Debug, Clone)]
pub struct LoyaltyRepository {
    pool: SqlitePool,
}

impl LoyaltyRepository {
    /// Creates a new LoyaltyRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LoyaltyRepository { pool }
    }

    // =========================================================================
    // Programs
    // =========================================================================

    /// Inserts a loyalty program.
    pub async fn insert_program(&self, program: &LoyaltyProgram) -> DbResult<()> {
        debug!(id = %program.id, name = %program.name, "Inserting loyalty program");

        sqlx::query(
            r#"
            INSERT INTO loyalty_programs (
                id, merchant_id, name, description, status,
                point_value_cents, reward_ratio_bps, settings,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&program.id)
        .bind(&program.merchant_id)
        .bind(&program.name)
        .bind(&program.description)
        .bind(program.status)
        .bind(program.point_value_cents)
        .bind(program.reward_ratio_bps as i64)
        .bind(serde_json::to_string(&program.settings)?)
        .bind(program.created_at)
        .bind(program.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a program by ID.
    pub async fn get_program(&self, id: &str) -> DbResult<Option<LoyaltyProgram>> {
        let row = sqlx::query("SELECT * FROM loyalty_programs WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_program).transpose()
    }

    /// Lists a merchant's programs.
    pub async fn list_programs(&self, merchant_id: &str) -> DbResult<Vec<LoyaltyProgram>> {
        let rows = sqlx::query(
            "SELECT * FROM loyalty_programs WHERE merchant_id = ?1 ORDER BY created_at",
        )
        .bind(merchant_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_program).collect()
    }

    /// Updates a program's mutable fields.
    pub async fn update_program(&self, program: &LoyaltyProgram) -> DbResult<()> {
        debug!(id = %program.id, "Updating loyalty program");

        sqlx::query(
            r#"
            UPDATE loyalty_programs SET
                name = ?2,
                description = ?3,
                status = ?4,
                point_value_cents = ?5,
                reward_ratio_bps = ?6,
                settings = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(&program.id)
        .bind(&program.name)
        .bind(&program.description)
        .bind(program.status)
        .bind(program.point_value_cents)
        .bind(program.reward_ratio_bps as i64)
        .bind(serde_json::to_string(&program.settings)?)
        .bind(program.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Tiers
    // =========================================================================

    /// Inserts a tier.
    pub async fn insert_tier(&self, tier: &LoyaltyTier) -> DbResult<()> {
        debug!(id = %tier.id, name = %tier.name, "Inserting loyalty tier");

        sqlx::query(
            r#"
            INSERT INTO loyalty_tiers (
                id, program_id, name, description, minimum_points, benefits,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&tier.id)
        .bind(&tier.program_id)
        .bind(&tier.name)
        .bind(&tier.description)
        .bind(tier.minimum_points)
        .bind(serde_json::to_string(&tier.benefits)?)
        .bind(tier.created_at)
        .bind(tier.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a tier by ID.
    pub async fn get_tier(&self, id: &str) -> DbResult<Option<LoyaltyTier>> {
        let row = sqlx::query("SELECT * FROM loyalty_tiers WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_tier).transpose()
    }

    /// Lists a program's tiers, lowest threshold first.
    pub async fn list_tiers(&self, program_id: &str) -> DbResult<Vec<LoyaltyTier>> {
        let rows = sqlx::query(
            "SELECT * FROM loyalty_tiers WHERE program_id = ?1 ORDER BY minimum_points",
        )
        .bind(program_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_tier).collect()
    }

    /// Updates a tier's full record.
    pub async fn update_tier(&self, tier: &LoyaltyTier) -> DbResult<()> {
        debug!(id = %tier.id, "Updating loyalty tier");

        sqlx::query(
            r#"
            UPDATE loyalty_tiers SET
                name = ?2, description = ?3, minimum_points = ?4,
                benefits = ?5, updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(&tier.id)
        .bind(&tier.name)
        .bind(&tier.description)
        .bind(tier.minimum_points)
        .bind(serde_json::to_string(&tier.benefits)?)
        .bind(tier.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Members
    // =========================================================================

    /// Enrolls a member, writing the enrollment marker into the activity
    /// ledger in the same transaction.
    ///
    /// The UNIQUE (program_id, customer_id) constraint surfaces as
    /// [`DbError::UniqueViolation`](crate::error::DbError::UniqueViolation)
    /// for a double enrollment.
    pub async fn insert_member(&self, member: &LoyaltyMember) -> DbResult<LoyaltyActivity> {
        debug!(id = %member.id, customer = %member.customer_id, "Enrolling loyalty member");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO loyalty_members (
                id, program_id, customer_id, points, lifetime_points,
                tier_id, status, enrolled_at, last_activity_at,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&member.id)
        .bind(&member.program_id)
        .bind(&member.customer_id)
        .bind(member.points)
        .bind(member.lifetime_points)
        .bind(&member.tier_id)
        .bind(member.status)
        .bind(member.enrolled_at)
        .bind(member.last_activity_at)
        .bind(member.created_at)
        .bind(member.updated_at)
        .execute(&mut *tx)
        .await?;

        let activity = LoyaltyActivity {
            id: Uuid::new_v4().to_string(),
            member_id: member.id.clone(),
            kind: ActivityKind::Enrolled,
            points: 0,
            description: "Joined loyalty program".to_string(),
            reference_id: None,
            metadata: serde_json::json!({}),
            created_at: member.enrolled_at,
        };

        insert_activity(&mut tx, &activity).await?;

        tx.commit().await?;
        Ok(activity)
    }

    /// Gets a member by ID.
    pub async fn get_member(&self, id: &str) -> DbResult<Option<LoyaltyMember>> {
        let row = sqlx::query("SELECT * FROM loyalty_members WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_member).transpose()
    }

    /// Gets a member by program and customer.
    pub async fn get_member_by_customer(
        &self,
        program_id: &str,
        customer_id: &str,
    ) -> DbResult<Option<LoyaltyMember>> {
        let row = sqlx::query(
            "SELECT * FROM loyalty_members WHERE program_id = ?1 AND customer_id = ?2",
        )
        .bind(program_id)
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_member).transpose()
    }

    /// Lists a program's members.
    pub async fn list_members(&self, program_id: &str) -> DbResult<Vec<LoyaltyMember>> {
        let rows = sqlx::query(
            "SELECT * FROM loyalty_members WHERE program_id = ?1 ORDER BY enrolled_at",
        )
        .bind(program_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_member).collect()
    }

    /// Updates only a member's status.
    pub async fn set_member_status(
        &self,
        id: &str,
        status: MemberStatus,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        sqlx::query("UPDATE loyalty_members SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // =========================================================================
    // Activity Ledger
    // =========================================================================

    /// Credits points to a member: aggregate bump plus ledger insert in one
    /// transaction.
    ///
    /// `counts_lifetime` is true for `Earned` and false for positive
    /// `Adjusted` corrections, which restore balance without inflating the
    /// tier-qualifying total.
    pub async fn earn_points(
        &self,
        member_id: &str,
        points: i64,
        kind: ActivityKind,
        counts_lifetime: bool,
        description: &str,
        reference_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> DbResult<Option<LoyaltyActivity>> {
        debug!(member_id = %member_id, points, ?kind, "Crediting loyalty points");

        let mut tx = self.pool.begin().await?;

        let lifetime_delta = if counts_lifetime { points } else { 0 };

        let updated = sqlx::query(
            r#"
            UPDATE loyalty_members
            SET points = points + ?2,
                lifetime_points = lifetime_points + ?3,
                last_activity_at = ?4,
                updated_at = ?4
            WHERE id = ?1 AND status = 'active'
            "#,
        )
        .bind(member_id)
        .bind(points)
        .bind(lifetime_delta)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let activity = LoyaltyActivity {
            id: Uuid::new_v4().to_string(),
            member_id: member_id.to_string(),
            kind,
            points,
            description: description.to_string(),
            reference_id: reference_id.map(String::from),
            metadata: serde_json::json!({}),
            created_at: now,
        };

        insert_activity(&mut tx, &activity).await?;

        tx.commit().await?;
        Ok(Some(activity))
    }

    /// Debits points from a member. Returns `None` when the guard failed:
    /// the member is not active or the balance no longer covers the debit.
    pub async fn redeem_points(
        &self,
        member_id: &str,
        points: i64,
        kind: ActivityKind,
        description: &str,
        reference_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> DbResult<Option<LoyaltyActivity>> {
        debug!(member_id = %member_id, points, ?kind, "Debiting loyalty points");

        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE loyalty_members
            SET points = points - ?2,
                last_activity_at = ?3,
                updated_at = ?3
            WHERE id = ?1
              AND status = 'active'
              AND points >= ?2
            "#,
        )
        .bind(member_id)
        .bind(points)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let activity = LoyaltyActivity {
            id: Uuid::new_v4().to_string(),
            member_id: member_id.to_string(),
            kind,
            points: -points,
            description: description.to_string(),
            reference_id: reference_id.map(String::from),
            metadata: serde_json::json!({}),
            created_at: now,
        };

        insert_activity(&mut tx, &activity).await?;

        tx.commit().await?;
        Ok(Some(activity))
    }

    /// Moves a member to a tier, writing a `tier_changed` marker into the
    /// ledger in the same transaction.
    pub async fn set_member_tier(
        &self,
        member_id: &str,
        tier_id: Option<&str>,
        tier_name: &str,
        now: DateTime<Utc>,
    ) -> DbResult<LoyaltyActivity> {
        debug!(member_id = %member_id, tier = ?tier_id, "Changing member tier");

        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE loyalty_members SET tier_id = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(member_id)
            .bind(tier_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        let activity = LoyaltyActivity {
            id: Uuid::new_v4().to_string(),
            member_id: member_id.to_string(),
            kind: ActivityKind::TierChanged,
            points: 0,
            description: format!("Moved to tier {tier_name}"),
            reference_id: tier_id.map(String::from),
            metadata: serde_json::json!({}),
            created_at: now,
        };

        insert_activity(&mut tx, &activity).await?;

        tx.commit().await?;
        Ok(activity)
    }

    /// Lists a member's activity ledger, newest first.
    pub async fn list_activities(
        &self,
        member_id: &str,
        page: Page,
    ) -> DbResult<Vec<LoyaltyActivity>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM loyalty_activities
            WHERE member_id = ?1
            ORDER BY created_at DESC, id
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(member_id)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_activity).collect()
    }
}

async fn insert_activity(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    activity: &LoyaltyActivity,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO loyalty_activities (
            id, member_id, kind, points, description, reference_id, metadata,
            created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&activity.id)
    .bind(&activity.member_id)
    .bind(activity.kind)
    .bind(activity.points)
    .bind(&activity.description)
    .bind(&activity.reference_id)
    .bind(serde_json::to_string(&activity.metadata)?)
    .bind(activity.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
