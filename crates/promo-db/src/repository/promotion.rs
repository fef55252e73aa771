//! # Promotion Repository
//!
//! Database operations for promotions, discount codes, and the usage ledger.
//!
//! ## Redemption Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  record_usage() - One Transaction                       │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    │                                                                    │
//! │    ├── UPDATE discount_codes SET used_count = used_count + 1            │
//! │    │   WHERE id = ? AND (usage_limit IS NULL OR used_count < limit)     │
//! │    │        │                                                           │
//! │    │        └── 0 rows? ──► ROLLBACK, CodeLimitReached                  │
//! │    │                                                                    │
//! │    ├── UPDATE promotions SET used_count = used_count + 1                │
//! │    │   WHERE id = ? AND (usage_limit IS NULL OR used_count < limit)     │
//! │    │        │                                                           │
//! │    │        └── 0 rows? ──► ROLLBACK, PromotionLimitReached             │
//! │    │                                                                    │
//! │    ├── COUNT(code_usages) for this customer, re-checked inside the tx   │
//! │    │        │                                                           │
//! │    │        └── >= customer_use_limit? ──► ROLLBACK, CustomerLimit...   │
//! │    │                                                                    │
//! │    └── INSERT code_usages row                                           │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  The conditional UPDATEs are the serialization point: two concurrent    │
//! │  redemptions of a code with one remaining use cannot both pass.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::Page;
use promo_core::promotion::{
    AllocationMethod, AppliesTo, CodeStatus, CodeUsage, DiscountCode, PromoKind, PromoStatus,
    PromoTarget, Promotion,
};

// =============================================================================
// Outcome Types
// =============================================================================

/// Result of attempting to record a code usage.
///
/// The denied variants come from the conditional UPDATEs losing their guard;
/// the engine maps them to typed errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordUsageOutcome {
    Recorded,
    /// The code-level usage ceiling was already reached.
    CodeLimitReached,
    /// The promotion-level usage ceiling was already reached.
    PromotionLimitReached,
    /// This customer already used the code up to its per-customer ceiling.
    CustomerLimitReached,
}

// =============================================================================
// Row Mapping
// =============================================================================

fn map_promotion(row: &SqliteRow) -> DbResult<Promotion> {
    let applies_to: String = row.try_get("applies_to")?;
    let target: String = row.try_get("target")?;
    let prerequisites: String = row.try_get("prerequisites")?;

    Ok(Promotion {
        id: row.try_get("id")?,
        merchant_id: row.try_get("merchant_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        status: row.try_get("status")?,
        kind: row.try_get("kind")?,
        priority: row.try_get("priority")?,
        starts_at: row.try_get("starts_at")?,
        ends_at: row.try_get("ends_at")?,
        usage_limit: row.try_get("usage_limit")?,
        used_count: row.try_get("used_count")?,
        applies_to: serde_json::from_str::<AppliesTo>(&applies_to)?,
        target: serde_json::from_str::<PromoTarget>(&target)?,
        allocation: row.try_get("allocation")?,
        prerequisites: serde_json::from_str(&prerequisites)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn map_code(row: &SqliteRow) -> DbResult<DiscountCode> {
    Ok(DiscountCode {
        id: row.try_get("id")?,
        promotion_id: row.try_get("promotion_id")?,
        code: row.try_get("code")?,
        status: row.try_get("status")?,
        usage_limit: row.try_get("usage_limit")?,
        used_count: row.try_get("used_count")?,
        customer_use_limit: row.try_get("customer_use_limit")?,
        expires_at: row.try_get("expires_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn map_usage(row: &SqliteRow) -> DbResult<CodeUsage> {
    Ok(CodeUsage {
        id: row.try_get("id")?,
        discount_code_id: row.try_get("discount_code_id")?,
        customer_id: row.try_get("customer_id")?,
        order_id: row.try_get("order_id")?,
        amount_cents: row.try_get("amount_cents")?,
        created_at: row.try_get("created_at")?,
    })
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for promotion, discount code, and usage ledger operations.
#[derive(Debug, Clone)]
pub struct PromotionRepository {
    pool: SqlitePool,
}

impl PromotionRepository {
    /// Creates a new PromotionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PromotionRepository { pool }
    }

    // =========================================================================
    // Promotions
    // =========================================================================

    /// Inserts a promotion.
    pub async fn insert_promotion(&self, promotion: &Promotion) -> DbResult<()> {
        debug!(id = %promotion.id, name = %promotion.name, "Inserting promotion");

        sqlx::query(
            r#"
            INSERT INTO promotions (
                id, merchant_id, name, description, status, kind, priority,
                starts_at, ends_at, usage_limit, used_count,
                applies_to, target, allocation, prerequisites,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7,
                ?8, ?9, ?10, ?11,
                ?12, ?13, ?14, ?15,
                ?16, ?17
            )
            "#,
        )
        .bind(&promotion.id)
        .bind(&promotion.merchant_id)
        .bind(&promotion.name)
        .bind(&promotion.description)
        .bind(promotion.status)
        .bind(promotion.kind)
        .bind(promotion.priority)
        .bind(promotion.starts_at)
        .bind(promotion.ends_at)
        .bind(promotion.usage_limit)
        .bind(promotion.used_count)
        .bind(serde_json::to_string(&promotion.applies_to)?)
        .bind(serde_json::to_string(&promotion.target)?)
        .bind(promotion.allocation)
        .bind(serde_json::to_string(&promotion.prerequisites)?)
        .bind(promotion.created_at)
        .bind(promotion.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a promotion by ID.
    pub async fn get_promotion(&self, id: &str) -> DbResult<Option<Promotion>> {
        let row = sqlx::query("SELECT * FROM promotions WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_promotion).transpose()
    }

    /// Lists a merchant's promotions, highest priority first.
    ///
    /// `NULL` filter parameters match everything, so the optional filters
    /// collapse into one static query.
    pub async fn list_promotions(
        &self,
        merchant_id: &str,
        status: Option<PromoStatus>,
        kind: Option<PromoKind>,
        page: Page,
    ) -> DbResult<Vec<Promotion>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM promotions
            WHERE merchant_id = ?1
              AND (?2 IS NULL OR status = ?2)
              AND (?3 IS NULL OR kind = ?3)
            ORDER BY priority DESC, created_at DESC
            LIMIT ?4 OFFSET ?5
            "#,
        )
        .bind(merchant_id)
        .bind(status)
        .bind(kind)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_promotion).collect()
    }

    /// Updates a promotion's mutable fields.
    ///
    /// `used_count` is deliberately excluded: the aggregate is only touched
    /// by [`record_usage`](Self::record_usage).
    pub async fn update_promotion(&self, promotion: &Promotion) -> DbResult<()> {
        debug!(id = %promotion.id, "Updating promotion");

        sqlx::query(
            r#"
            UPDATE promotions SET
                name = ?2,
                description = ?3,
                status = ?4,
                kind = ?5,
                priority = ?6,
                starts_at = ?7,
                ends_at = ?8,
                usage_limit = ?9,
                applies_to = ?10,
                target = ?11,
                allocation = ?12,
                prerequisites = ?13,
                updated_at = ?14
            WHERE id = ?1
            "#,
        )
        .bind(&promotion.id)
        .bind(&promotion.name)
        .bind(&promotion.description)
        .bind(promotion.status)
        .bind(promotion.kind)
        .bind(promotion.priority)
        .bind(promotion.starts_at)
        .bind(promotion.ends_at)
        .bind(promotion.usage_limit)
        .bind(serde_json::to_string(&promotion.applies_to)?)
        .bind(serde_json::to_string(&promotion.target)?)
        .bind(promotion.allocation)
        .bind(serde_json::to_string(&promotion.prerequisites)?)
        .bind(promotion.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates only a promotion's status.
    pub async fn set_promotion_status(
        &self,
        id: &str,
        status: PromoStatus,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        sqlx::query("UPDATE promotions SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Deletes a promotion and its codes.
    ///
    /// Usage ledger rows survive: they are history, not configuration.
    pub async fn delete_promotion(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting promotion");

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM discount_codes WHERE promotion_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM promotions WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    // =========================================================================
    // Discount Codes
    // =========================================================================

    /// Inserts a discount code.
    ///
    /// The UNIQUE constraint on `code` surfaces as
    /// [`DbError::UniqueViolation`](crate::error::DbError::UniqueViolation)
    /// on collision; the engine retries generated codes on that error.
    pub async fn insert_code(&self, code: &DiscountCode) -> DbResult<()> {
        debug!(id = %code.id, code = %code.code, "Inserting discount code");

        sqlx::query(
            r#"
            INSERT INTO discount_codes (
                id, promotion_id, code, status,
                usage_limit, used_count, customer_use_limit,
                expires_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&code.id)
        .bind(&code.promotion_id)
        .bind(&code.code)
        .bind(code.status)
        .bind(code.usage_limit)
        .bind(code.used_count)
        .bind(code.customer_use_limit)
        .bind(code.expires_at)
        .bind(code.created_at)
        .bind(code.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a discount code by ID.
    pub async fn get_code(&self, id: &str) -> DbResult<Option<DiscountCode>> {
        let row = sqlx::query("SELECT * FROM discount_codes WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_code).transpose()
    }

    /// Gets a discount code by its (normalized) code string.
    pub async fn get_code_by_string(&self, code: &str) -> DbResult<Option<DiscountCode>> {
        let row = sqlx::query("SELECT * FROM discount_codes WHERE code = ?1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_code).transpose()
    }

    /// Lists the codes under a promotion.
    pub async fn list_codes(&self, promotion_id: &str) -> DbResult<Vec<DiscountCode>> {
        let rows = sqlx::query(
            "SELECT * FROM discount_codes WHERE promotion_id = ?1 ORDER BY created_at",
        )
        .bind(promotion_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_code).collect()
    }

    /// Updates a code's mutable fields.
    ///
    /// `used_count` is deliberately excluded: the aggregate is only touched
    /// by [`record_usage`](Self::record_usage).
    pub async fn update_code(&self, code: &DiscountCode) -> DbResult<()> {
        debug!(id = %code.id, "Updating discount code");

        sqlx::query(
            r#"
            UPDATE discount_codes SET
                status = ?2,
                usage_limit = ?3,
                customer_use_limit = ?4,
                expires_at = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(&code.id)
        .bind(code.status)
        .bind(code.usage_limit)
        .bind(code.customer_use_limit)
        .bind(code.expires_at)
        .bind(code.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates a code's status.
    pub async fn set_code_status(
        &self,
        id: &str,
        status: CodeStatus,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        sqlx::query("UPDATE discount_codes SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Deletes a discount code.
    ///
    /// Usage ledger rows survive, same as for promotion deletion.
    pub async fn delete_code(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting discount code");

        sqlx::query("DELETE FROM discount_codes WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // =========================================================================
    // Usage Ledger
    // =========================================================================

    /// Counts how many times a customer has used a code.
    pub async fn customer_usage_count(
        &self,
        discount_code_id: &str,
        customer_id: &str,
    ) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM code_usages
            WHERE discount_code_id = ?1 AND customer_id = ?2
            "#,
        )
        .bind(discount_code_id)
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Lists the usage ledger for a code, oldest first.
    pub async fn list_usages(&self, discount_code_id: &str) -> DbResult<Vec<CodeUsage>> {
        let rows = sqlx::query(
            "SELECT * FROM code_usages WHERE discount_code_id = ?1 ORDER BY created_at",
        )
        .bind(discount_code_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_usage).collect()
    }

    /// Records a code usage: ledger insert plus both aggregate bumps, in one
    /// transaction. See the module docs for the guard sequence.
    pub async fn record_usage(
        &self,
        usage: &CodeUsage,
        promotion_id: &str,
    ) -> DbResult<RecordUsageOutcome> {
        debug!(
            code_id = %usage.discount_code_id,
            customer = ?usage.customer_id,
            "Recording code usage"
        );

        let mut tx = self.pool.begin().await?;

        // Guard 1: code-level ceiling
        let bumped = sqlx::query(
            r#"
            UPDATE discount_codes
            SET used_count = used_count + 1, updated_at = ?2
            WHERE id = ?1
              AND (usage_limit IS NULL OR used_count < usage_limit)
            "#,
        )
        .bind(&usage.discount_code_id)
        .bind(usage.created_at)
        .execute(&mut *tx)
        .await?;

        if bumped.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(RecordUsageOutcome::CodeLimitReached);
        }

        // Guard 2: promotion-level ceiling
        let bumped = sqlx::query(
            r#"
            UPDATE promotions
            SET used_count = used_count + 1, updated_at = ?2
            WHERE id = ?1
              AND (usage_limit IS NULL OR used_count < usage_limit)
            "#,
        )
        .bind(promotion_id)
        .bind(usage.created_at)
        .execute(&mut *tx)
        .await?;

        if bumped.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(RecordUsageOutcome::PromotionLimitReached);
        }

        // Guard 3: per-customer ceiling, re-checked against committed rows
        if let Some(customer_id) = &usage.customer_id {
            let limit: i64 =
                sqlx::query_scalar("SELECT customer_use_limit FROM discount_codes WHERE id = ?1")
                    .bind(&usage.discount_code_id)
                    .fetch_one(&mut *tx)
                    .await?;

            let prior: i64 = sqlx::query_scalar(
                r#"
                SELECT COUNT(*) FROM code_usages
                WHERE discount_code_id = ?1 AND customer_id = ?2
                "#,
            )
            .bind(&usage.discount_code_id)
            .bind(customer_id)
            .fetch_one(&mut *tx)
            .await?;

            if prior >= limit {
                tx.rollback().await?;
                return Ok(RecordUsageOutcome::CustomerLimitReached);
            }
        }

        sqlx::query(
            r#"
            INSERT INTO code_usages (
                id, discount_code_id, customer_id, order_id, amount_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&usage.id)
        .bind(&usage.discount_code_id)
        .bind(&usage.customer_id)
        .bind(&usage.order_id)
        .bind(usage.amount_cents)
        .bind(usage.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(RecordUsageOutcome::Recorded)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use promo_core::promotion::{DiscountValue, TargetKind};
    use uuid::Uuid;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn promotion(usage_limit: Option<i64>) -> Promotion {
        let now = Utc::now();
        Promotion {
            id: Uuid::new_v4().to_string(),
            merchant_id: "merchant-1".to_string(),
            name: "Summer Sale".to_string(),
            description: Some("10% off".to_string()),
            status: PromoStatus::Active,
            kind: PromoKind::Discount,
            priority: 1,
            starts_at: now,
            ends_at: None,
            usage_limit,
            used_count: 0,
            applies_to: AppliesTo {
                all_products: true,
                ..Default::default()
            },
            target: PromoTarget {
                kind: TargetKind::Order,
                value: DiscountValue::Percentage { bps: 1000 },
            },
            allocation: AllocationMethod::Across,
            prerequisites: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn code(promotion_id: &str, usage_limit: Option<i64>) -> DiscountCode {
        let now = Utc::now();
        DiscountCode {
            id: Uuid::new_v4().to_string(),
            promotion_id: promotion_id.to_string(),
            code: format!("SAVE{}", &Uuid::new_v4().simple().to_string()[..6].to_uppercase()),
            status: CodeStatus::Active,
            usage_limit,
            used_count: 0,
            customer_use_limit: 1,
            expires_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn usage(code_id: &str, customer_id: Option<&str>) -> CodeUsage {
        CodeUsage {
            id: Uuid::new_v4().to_string(),
            discount_code_id: code_id.to_string(),
            customer_id: customer_id.map(String::from),
            order_id: Some("order-1".to_string()),
            amount_cents: 1_000,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_promotion_round_trip() {
        let db = test_db().await;
        let repo = db.promotions();

        let promo = promotion(Some(100));
        repo.insert_promotion(&promo).await.unwrap();

        let loaded = repo.get_promotion(&promo.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, promo.name);
        assert_eq!(loaded.target, promo.target);
        assert_eq!(loaded.usage_limit, Some(100));
        assert!(loaded.applies_to.all_products);
    }

    #[tokio::test]
    async fn test_code_lookup_by_string() {
        let db = test_db().await;
        let repo = db.promotions();

        let promo = promotion(None);
        repo.insert_promotion(&promo).await.unwrap();
        let c = code(&promo.id, None);
        repo.insert_code(&c).await.unwrap();

        let found = repo.get_code_by_string(&c.code).await.unwrap().unwrap();
        assert_eq!(found.id, c.id);

        assert!(repo.get_code_by_string("NOSUCH").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_code_rejected() {
        let db = test_db().await;
        let repo = db.promotions();

        let promo = promotion(None);
        repo.insert_promotion(&promo).await.unwrap();
        let mut a = code(&promo.id, None);
        a.code = "DUPLICATE".to_string();
        repo.insert_code(&a).await.unwrap();

        let mut b = code(&promo.id, None);
        b.code = "DUPLICATE".to_string();
        let err = repo.insert_code(&b).await.unwrap_err();
        assert!(matches!(err, crate::error::DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_record_usage_bumps_both_aggregates() {
        let db = test_db().await;
        let repo = db.promotions();

        let promo = promotion(Some(10));
        repo.insert_promotion(&promo).await.unwrap();
        let c = code(&promo.id, Some(5));
        repo.insert_code(&c).await.unwrap();

        let outcome = repo.record_usage(&usage(&c.id, None), &promo.id).await.unwrap();
        assert_eq!(outcome, RecordUsageOutcome::Recorded);

        let c2 = repo.get_code(&c.id).await.unwrap().unwrap();
        assert_eq!(c2.used_count, 1);
        let p2 = repo.get_promotion(&promo.id).await.unwrap().unwrap();
        assert_eq!(p2.used_count, 1);

        let usages = repo.list_usages(&c.id).await.unwrap();
        assert_eq!(usages.len(), 1);
        assert_eq!(usages[0].amount_cents, 1_000);
    }

    #[tokio::test]
    async fn test_record_usage_respects_code_ceiling() {
        let db = test_db().await;
        let repo = db.promotions();

        let promo = promotion(None);
        repo.insert_promotion(&promo).await.unwrap();
        let c = code(&promo.id, Some(1));
        repo.insert_code(&c).await.unwrap();

        assert_eq!(
            repo.record_usage(&usage(&c.id, None), &promo.id).await.unwrap(),
            RecordUsageOutcome::Recorded
        );
        assert_eq!(
            repo.record_usage(&usage(&c.id, None), &promo.id).await.unwrap(),
            RecordUsageOutcome::CodeLimitReached
        );

        // The denied attempt left no ledger row and no aggregate bump
        let c2 = repo.get_code(&c.id).await.unwrap().unwrap();
        assert_eq!(c2.used_count, 1);
        assert_eq!(repo.list_usages(&c.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_record_usage_respects_customer_ceiling() {
        let db = test_db().await;
        let repo = db.promotions();

        let promo = promotion(None);
        repo.insert_promotion(&promo).await.unwrap();
        let c = code(&promo.id, None); // customer_use_limit = 1
        repo.insert_code(&c).await.unwrap();

        assert_eq!(
            repo.record_usage(&usage(&c.id, Some("cust-1")), &promo.id)
                .await
                .unwrap(),
            RecordUsageOutcome::Recorded
        );
        assert_eq!(
            repo.record_usage(&usage(&c.id, Some("cust-1")), &promo.id)
                .await
                .unwrap(),
            RecordUsageOutcome::CustomerLimitReached
        );

        // A different customer still passes
        assert_eq!(
            repo.record_usage(&usage(&c.id, Some("cust-2")), &promo.id)
                .await
                .unwrap(),
            RecordUsageOutcome::Recorded
        );

        assert_eq!(
            repo.customer_usage_count(&c.id, "cust-1").await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_delete_promotion_keeps_usages() {
        let db = test_db().await;
        let repo = db.promotions();

        let promo = promotion(None);
        repo.insert_promotion(&promo).await.unwrap();
        let c = code(&promo.id, None);
        repo.insert_code(&c).await.unwrap();
        repo.record_usage(&usage(&c.id, None), &promo.id).await.unwrap();

        repo.delete_promotion(&promo.id).await.unwrap();

        assert!(repo.get_promotion(&promo.id).await.unwrap().is_none());
        assert!(repo.get_code(&c.id).await.unwrap().is_none());
        // History survives
        assert_eq!(repo.list_usages(&c.id).await.unwrap().len(), 1);
    }
}
