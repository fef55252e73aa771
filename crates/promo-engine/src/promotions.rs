//! # Promotion Operations
//!
//! Campaign CRUD, discount code issuance, and the validate/apply pair.
//!
//! ## Validate vs Apply
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate_discount_code   READ-ONLY                                     │
//! │    lookup ──► rule checks ──► discount amount                           │
//! │    (cart preview: safe to call repeatedly)                              │
//! │                                                                         │
//! │  apply_discount_code      MUTATING                                      │
//! │    lookup ──► rule checks ──► record_usage (guarded tx)                 │
//! │    (order completion: exactly-once per order)                           │
//! │                                                                         │
//! │  The rule checks can pass on a stale read; the guarded transaction in   │
//! │  the store is what actually enforces the ceilings under concurrency.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use promo_core::promotion::{
    self, AllocationMethod, AppliesTo, CodeStatus, CodeUsage, DiscountCode, Prerequisite,
    PromoKind, PromoStatus, PromoTarget, Promotion,
};
use promo_core::{
    codegen, validation, Money, PromoError, ValidationError, DEFAULT_CUSTOMER_USE_LIMIT,
    MAX_CODE_GENERATION_ATTEMPTS,
};
use promo_db::{DbError, Page, RecordUsageOutcome};

use crate::error::EngineResult;
use crate::PromotionEngine;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Request to create a promotion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePromotion {
    pub merchant_id: String,
    pub name: String,
    pub description: Option<String>,
    pub kind: PromoKind,
    #[serde(default)]
    pub priority: i64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub usage_limit: Option<i64>,
    pub applies_to: AppliesTo,
    pub target: PromoTarget,
    pub allocation: AllocationMethod,
    #[serde(default)]
    pub prerequisites: Vec<Prerequisite>,
}

/// Partial update of a promotion. `None` fields are left unchanged.
///
/// Status is not here on purpose: status changes go through
/// [`PromotionEngine::set_promotion_status`] so the transition graph is
/// always enforced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePromotion {
    pub name: Option<String>,
    pub description: Option<String>,
    pub priority: Option<i64>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub usage_limit: Option<i64>,
    pub applies_to: Option<AppliesTo>,
    pub target: Option<PromoTarget>,
    pub allocation: Option<AllocationMethod>,
    pub prerequisites: Option<Vec<Prerequisite>>,
}

/// Request to create a discount code under a promotion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDiscountCode {
    pub promotion_id: String,
    /// Custom code string; `None` generates one.
    pub code: Option<String>,
    pub usage_limit: Option<i64>,
    /// Per-customer ceiling; defaults to 1.
    pub customer_use_limit: Option<i64>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Partial update of a discount code. `None` fields are left unchanged.
///
/// The code string itself is immutable; replace the code instead of
/// renaming it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDiscountCode {
    pub status: Option<CodeStatus>,
    pub usage_limit: Option<i64>,
    pub customer_use_limit: Option<i64>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Result of a successful code validation.
#[derive(Debug, Clone)]
pub struct ValidatedCode {
    pub code: DiscountCode,
    pub promotion: Promotion,
    /// The discount the code would apply to the given order amount.
    pub discount: Money,
}

// =============================================================================
// Operations
// =============================================================================

impl PromotionEngine {
    /// Creates a promotion.
    ///
    /// A future start date yields `scheduled` status, otherwise `active`.
    pub async fn create_promotion(&self, req: CreatePromotion) -> EngineResult<Promotion> {
        validation::validate_name(&req.name)?;
        validation::validate_usage_limit("usage_limit", req.usage_limit)?;
        match req.target.value {
            promotion::DiscountValue::Percentage { bps } => {
                validation::validate_bps("percentage", bps)?
            }
            promotion::DiscountValue::Fixed { cents } => {
                validation::validate_positive_amount("fixed amount", cents)?
            }
            promotion::DiscountValue::Free => {}
        }

        let now = Utc::now();
        let status = if req.starts_at > now {
            PromoStatus::Scheduled
        } else {
            PromoStatus::Active
        };

        let promotion = Promotion {
            id: Uuid::new_v4().to_string(),
            merchant_id: req.merchant_id,
            name: req.name.trim().to_string(),
            description: req.description,
            status,
            kind: req.kind,
            priority: req.priority,
            starts_at: req.starts_at,
            ends_at: req.ends_at,
            usage_limit: req.usage_limit,
            used_count: 0,
            applies_to: req.applies_to,
            target: req.target,
            allocation: req.allocation,
            prerequisites: req.prerequisites,
            created_at: now,
            updated_at: now,
        };

        self.db().promotions().insert_promotion(&promotion).await?;

        info!(id = %promotion.id, name = %promotion.name, ?status, "Promotion created");
        Ok(promotion)
    }

    /// Gets a promotion by ID.
    pub async fn get_promotion(&self, id: &str) -> EngineResult<Promotion> {
        self.db()
            .promotions()
            .get_promotion(id)
            .await?
            .ok_or_else(|| PromoError::PromotionNotFound(id.to_string()).into())
    }

    /// Lists a merchant's promotions, highest priority first, with optional
    /// status and kind filters.
    pub async fn list_promotions(
        &self,
        merchant_id: &str,
        status: Option<PromoStatus>,
        kind: Option<PromoKind>,
        page: Page,
    ) -> EngineResult<Vec<Promotion>> {
        Ok(self
            .db()
            .promotions()
            .list_promotions(merchant_id, status, kind, page)
            .await?)
    }

    /// Changes a promotion's status, enforcing the transition graph.
    pub async fn set_promotion_status(
        &self,
        id: &str,
        status: PromoStatus,
    ) -> EngineResult<Promotion> {
        let mut promotion = self.get_promotion(id).await?;

        if !promotion.status.can_transition_to(status) {
            return Err(PromoError::InvalidStatusTransition {
                from: format!("{:?}", promotion.status).to_lowercase(),
                to: format!("{status:?}").to_lowercase(),
            }
            .into());
        }

        let now = Utc::now();
        self.db()
            .promotions()
            .set_promotion_status(id, status, now)
            .await?;

        info!(id = %id, from = ?promotion.status, to = ?status, "Promotion status changed");

        promotion.status = status;
        promotion.updated_at = now;
        Ok(promotion)
    }

    /// Applies a partial update to a promotion. `None` fields are left
    /// unchanged; the updated promotion is returned.
    pub async fn update_promotion(
        &self,
        id: &str,
        req: UpdatePromotion,
    ) -> EngineResult<Promotion> {
        let mut promotion = self.get_promotion(id).await?;

        if let Some(name) = req.name {
            promotion.name = name.trim().to_string();
        }
        if let Some(description) = req.description {
            promotion.description = Some(description);
        }
        if let Some(priority) = req.priority {
            promotion.priority = priority;
        }
        if let Some(starts_at) = req.starts_at {
            promotion.starts_at = starts_at;
        }
        if let Some(ends_at) = req.ends_at {
            promotion.ends_at = Some(ends_at);
        }
        if let Some(usage_limit) = req.usage_limit {
            promotion.usage_limit = Some(usage_limit);
        }
        if let Some(applies_to) = req.applies_to {
            promotion.applies_to = applies_to;
        }
        if let Some(target) = req.target {
            promotion.target = target;
        }
        if let Some(allocation) = req.allocation {
            promotion.allocation = allocation;
        }
        if let Some(prerequisites) = req.prerequisites {
            promotion.prerequisites = prerequisites;
        }

        validation::validate_name(&promotion.name)?;
        validation::validate_usage_limit("usage_limit", promotion.usage_limit)?;
        match promotion.target.value {
            promotion::DiscountValue::Percentage { bps } => {
                validation::validate_bps("percentage", bps)?
            }
            promotion::DiscountValue::Fixed { cents } => {
                validation::validate_positive_amount("fixed amount", cents)?
            }
            promotion::DiscountValue::Free => {}
        }

        promotion.updated_at = Utc::now();
        self.db().promotions().update_promotion(&promotion).await?;

        info!(id = %id, "Promotion updated");
        Ok(promotion)
    }

    /// Deletes a promotion and its codes. Usage history survives.
    pub async fn delete_promotion(&self, id: &str) -> EngineResult<()> {
        // Confirm existence so the caller gets a typed not-found
        self.get_promotion(id).await?;
        self.db().promotions().delete_promotion(id).await?;

        info!(id = %id, "Promotion deleted");
        Ok(())
    }

    // =========================================================================
    // Discount Codes
    // =========================================================================

    /// Creates a discount code under a promotion.
    ///
    /// With no custom code, an 8-character code is generated from the OS RNG
    /// and retried a bounded number of times on collision. A duplicate
    /// custom code is a validation error.
    pub async fn create_discount_code(
        &self,
        req: CreateDiscountCode,
    ) -> EngineResult<DiscountCode> {
        // Parent must exist
        self.get_promotion(&req.promotion_id).await?;

        validation::validate_usage_limit("usage_limit", req.usage_limit)?;
        let customer_use_limit = req.customer_use_limit.unwrap_or(DEFAULT_CUSTOMER_USE_LIMIT);
        validation::validate_usage_limit("customer_use_limit", Some(customer_use_limit))?;

        let custom = match &req.code {
            Some(raw) => {
                let normalized = validation::normalize_code(raw);
                validation::validate_code(&normalized)?;
                Some(normalized)
            }
            None => None,
        };

        let mut attempts = 0;
        loop {
            let code_string = match &custom {
                Some(c) => c.clone(),
                None => codegen::generate_discount_code(&mut OsRng),
            };

            let now = Utc::now();
            let code = DiscountCode {
                id: Uuid::new_v4().to_string(),
                promotion_id: req.promotion_id.clone(),
                code: code_string,
                status: CodeStatus::Active,
                usage_limit: req.usage_limit,
                used_count: 0,
                customer_use_limit,
                expires_at: req.expires_at,
                created_at: now,
                updated_at: now,
            };

            match self.db().promotions().insert_code(&code).await {
                Ok(()) => {
                    info!(id = %code.id, code = %code.code, "Discount code created");
                    return Ok(code);
                }
                Err(DbError::UniqueViolation { .. }) if custom.is_some() => {
                    return Err(ValidationError::Duplicate {
                        field: "code".to_string(),
                        value: code.code,
                    }
                    .into());
                }
                Err(DbError::UniqueViolation { .. })
                    if attempts + 1 < MAX_CODE_GENERATION_ATTEMPTS =>
                {
                    attempts += 1;
                    debug!(attempts, "Generated code collided, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Gets a discount code by its code string.
    pub async fn get_discount_code(&self, code: &str) -> EngineResult<DiscountCode> {
        let normalized = validation::normalize_code(code);
        self.db()
            .promotions()
            .get_code_by_string(&normalized)
            .await?
            .ok_or_else(|| PromoError::InvalidCode(normalized).into())
    }

    /// Lists the codes under a promotion.
    pub async fn list_discount_codes(&self, promotion_id: &str) -> EngineResult<Vec<DiscountCode>> {
        Ok(self.db().promotions().list_codes(promotion_id).await?)
    }

    /// Changes a code's status.
    pub async fn set_code_status(&self, id: &str, status: CodeStatus) -> EngineResult<()> {
        self.db()
            .promotions()
            .get_code(id)
            .await?
            .ok_or_else(|| PromoError::CodeNotFound(id.to_string()))?;

        self.db()
            .promotions()
            .set_code_status(id, status, Utc::now())
            .await?;
        Ok(())
    }

    /// Applies a partial update to a discount code.
    ///
    /// A lowered usage ceiling never erases history: `used_count` is
    /// untouched and a limit at or below it simply stops further uses.
    pub async fn update_discount_code(
        &self,
        id: &str,
        req: UpdateDiscountCode,
    ) -> EngineResult<DiscountCode> {
        let mut code = self
            .db()
            .promotions()
            .get_code(id)
            .await?
            .ok_or_else(|| PromoError::CodeNotFound(id.to_string()))?;

        if let Some(status) = req.status {
            code.status = status;
        }
        if let Some(usage_limit) = req.usage_limit {
            code.usage_limit = Some(usage_limit);
        }
        if let Some(customer_use_limit) = req.customer_use_limit {
            code.customer_use_limit = customer_use_limit;
        }
        if let Some(expires_at) = req.expires_at {
            code.expires_at = Some(expires_at);
        }

        validation::validate_usage_limit("usage_limit", code.usage_limit)?;
        validation::validate_usage_limit("customer_use_limit", Some(code.customer_use_limit))?;

        code.updated_at = Utc::now();
        self.db().promotions().update_code(&code).await?;

        info!(id = %id, "Discount code updated");
        Ok(code)
    }

    /// Deletes a discount code. Its usage history survives.
    pub async fn delete_discount_code(&self, id: &str) -> EngineResult<()> {
        self.db()
            .promotions()
            .get_code(id)
            .await?
            .ok_or_else(|| PromoError::CodeNotFound(id.to_string()))?;

        self.db().promotions().delete_code(id).await?;

        info!(id = %id, "Discount code deleted");
        Ok(())
    }

    /// Validates a presented code and computes its discount. Read-only.
    ///
    /// When a customer identity accompanies the request, the per-customer
    /// ceiling is checked against their prior usage count.
    pub async fn validate_discount_code(
        &self,
        code: &str,
        customer_id: Option<&str>,
        order_amount: Money,
    ) -> EngineResult<ValidatedCode> {
        let code = self.get_discount_code(code).await?;

        let promotion = self
            .db()
            .promotions()
            .get_promotion(&code.promotion_id)
            .await?
            .ok_or_else(|| PromoError::PromotionNotFound(code.promotion_id.clone()))?;

        let customer_usage_count = match customer_id {
            Some(customer) => Some(
                self.db()
                    .promotions()
                    .customer_usage_count(&code.id, customer)
                    .await?,
            ),
            None => None,
        };

        let discount = promotion::validate_code(
            &code,
            &promotion,
            customer_usage_count,
            order_amount,
            Utc::now(),
        )?;

        debug!(code = %code.code, discount = %discount, "Discount code validated");

        Ok(ValidatedCode {
            code,
            promotion,
            discount,
        })
    }

    /// Validates a code and records its usage in the ledger.
    ///
    /// The validation is an eager precheck for a friendly error; the guarded
    /// transaction in the store is what holds under concurrency, and a lost
    /// guard maps back to the same typed errors.
    pub async fn apply_discount_code(
        &self,
        code: &str,
        customer_id: Option<&str>,
        order_id: Option<&str>,
        order_amount: Money,
    ) -> EngineResult<CodeUsage> {
        let validated = self
            .validate_discount_code(code, customer_id, order_amount)
            .await?;

        let usage = CodeUsage {
            id: Uuid::new_v4().to_string(),
            discount_code_id: validated.code.id.clone(),
            customer_id: customer_id.map(String::from),
            order_id: order_id.map(String::from),
            amount_cents: validated.discount.cents(),
            created_at: Utc::now(),
        };

        let outcome = self
            .db()
            .promotions()
            .record_usage(&usage, &validated.promotion.id)
            .await?;

        match outcome {
            RecordUsageOutcome::Recorded => {
                info!(
                    code = %validated.code.code,
                    amount = usage.amount_cents,
                    customer = ?customer_id,
                    "Discount code applied"
                );
                Ok(usage)
            }
            RecordUsageOutcome::CodeLimitReached => Err(PromoError::UsageLimitExceeded {
                code: validated.code.code,
                limit: validated.code.usage_limit.unwrap_or(0),
            }
            .into()),
            RecordUsageOutcome::PromotionLimitReached => Err(PromoError::UsageLimitExceeded {
                code: validated.code.code,
                limit: validated.promotion.usage_limit.unwrap_or(0),
            }
            .into()),
            RecordUsageOutcome::CustomerLimitReached => {
                Err(PromoError::CustomerUsageLimitExceeded {
                    code: validated.code.code,
                    limit: validated.code.customer_use_limit,
                }
                .into())
            }
        }
    }

    /// Lists the usage ledger for a code.
    pub async fn list_code_usages(&self, discount_code_id: &str) -> EngineResult<Vec<CodeUsage>> {
        Ok(self.db().promotions().list_usages(discount_code_id).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use promo_core::promotion::{DiscountValue, TargetKind};
    use promo_db::{Database, DbConfig};

    async fn engine() -> PromotionEngine {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        PromotionEngine::new(db)
    }

    fn create_req(starts_at: DateTime<Utc>) -> CreatePromotion {
        CreatePromotion {
            merchant_id: "merchant-1".to_string(),
            name: "Summer Sale".to_string(),
            description: None,
            kind: PromoKind::Discount,
            priority: 0,
            starts_at,
            ends_at: None,
            usage_limit: None,
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
        }
    }

    async fn active_code(engine: &PromotionEngine, custom: Option<&str>) -> DiscountCode {
        let promo = engine
            .create_promotion(create_req(Utc::now() - chrono::Duration::hours(1)))
            .await
            .unwrap();
        engine
            .create_discount_code(CreateDiscountCode {
                promotion_id: promo.id,
                code: custom.map(String::from),
                usage_limit: None,
                customer_use_limit: None,
                expires_at: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_future_start_schedules_promotion() {
        let engine = engine().await;

        let promo = engine
            .create_promotion(create_req(Utc::now() + chrono::Duration::days(1)))
            .await
            .unwrap();
        assert_eq!(promo.status, PromoStatus::Scheduled);

        let promo = engine
            .create_promotion(create_req(Utc::now() - chrono::Duration::days(1)))
            .await
            .unwrap();
        assert_eq!(promo.status, PromoStatus::Active);
    }

    #[tokio::test]
    async fn test_partial_update_leaves_other_fields() {
        let engine = engine().await;
        let promo = engine
            .create_promotion(create_req(Utc::now() - chrono::Duration::hours(1)))
            .await
            .unwrap();

        let updated = engine
            .update_promotion(
                &promo.id,
                UpdatePromotion {
                    priority: Some(7),
                    usage_limit: Some(100),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.priority, 7);
        assert_eq!(updated.usage_limit, Some(100));
        assert_eq!(updated.name, promo.name);
        assert_eq!(updated.target, promo.target);

        let listed = engine
            .list_promotions("merchant-1", Some(PromoStatus::Active), None, Page::default())
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_code_update_adjusts_limits_not_counters() {
        let engine = engine().await;
        let code = active_code(&engine, Some("SAVE10")).await;

        let updated = engine
            .update_discount_code(
                &code.id,
                UpdateDiscountCode {
                    usage_limit: Some(5),
                    customer_use_limit: Some(2),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.usage_limit, Some(5));
        assert_eq!(updated.customer_use_limit, 2);
        assert_eq!(updated.used_count, code.used_count);
        assert_eq!(updated.code, "SAVE10"); // code string is immutable

        // A non-positive ceiling is rejected
        let err = engine
            .update_discount_code(
                &code.id,
                UpdateDiscountCode {
                    usage_limit: Some(0),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "validation_error");

        // Backdating the expiry takes effect on the next validation
        engine
            .update_discount_code(
                &code.id,
                UpdateDiscountCode {
                    expires_at: Some(Utc::now() - chrono::Duration::hours(1)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let err = engine
            .validate_discount_code("SAVE10", None, Money::from_cents(10_000))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "code_expired");
    }

    #[tokio::test]
    async fn test_status_transition_graph_enforced() {
        let engine = engine().await;
        let promo = engine
            .create_promotion(create_req(Utc::now() - chrono::Duration::hours(1)))
            .await
            .unwrap();

        // active → inactive → active is fine
        engine
            .set_promotion_status(&promo.id, PromoStatus::Inactive)
            .await
            .unwrap();
        engine
            .set_promotion_status(&promo.id, PromoStatus::Active)
            .await
            .unwrap();

        // active → expired is terminal
        engine
            .set_promotion_status(&promo.id, PromoStatus::Expired)
            .await
            .unwrap();
        let err = engine
            .set_promotion_status(&promo.id, PromoStatus::Active)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "invalid_status_transition");
    }

    #[tokio::test]
    async fn test_generated_code_shape() {
        let engine = engine().await;
        let code = active_code(&engine, None).await;

        assert_eq!(code.code.len(), 8);
        assert!(code
            .code
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
        assert_eq!(code.customer_use_limit, 1);
    }

    #[tokio::test]
    async fn test_custom_code_duplicate_is_validation_error() {
        let engine = engine().await;
        let first = active_code(&engine, Some("SAVE10")).await;

        let err = engine
            .create_discount_code(CreateDiscountCode {
                promotion_id: first.promotion_id,
                code: Some("save10".to_string()), // normalizes to the same string
                usage_limit: None,
                customer_use_limit: None,
                expires_at: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "validation_error");
    }

    #[tokio::test]
    async fn test_validate_computes_discount_and_is_read_only() {
        let engine = engine().await;
        active_code(&engine, Some("SAVE10")).await;

        // Case-insensitive lookup
        let validated = engine
            .validate_discount_code("save10", None, Money::from_cents(10_000))
            .await
            .unwrap();
        assert_eq!(validated.discount.cents(), 1_000);

        // Validation is repeatable with no state change
        let again = engine
            .validate_discount_code("SAVE10", None, Money::from_cents(10_000))
            .await
            .unwrap();
        assert_eq!(again.code.used_count, 0);
    }

    #[tokio::test]
    async fn test_unknown_code_is_invalid_code() {
        let engine = engine().await;
        let err = engine
            .validate_discount_code("NOSUCH", None, Money::from_cents(100))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "invalid_code");
    }

    #[tokio::test]
    async fn test_apply_records_usage_and_enforces_customer_ceiling() {
        let engine = engine().await;
        let code = active_code(&engine, Some("ONEPER")).await;

        let usage = engine
            .apply_discount_code("ONEPER", Some("cust-1"), Some("order-1"), Money::from_cents(10_000))
            .await
            .unwrap();
        assert_eq!(usage.amount_cents, 1_000);

        // Same customer, second use: denied with the typed error
        let err = engine
            .apply_discount_code("ONEPER", Some("cust-1"), Some("order-2"), Money::from_cents(10_000))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "customer_usage_limit_exceeded");

        // Other customers unaffected
        engine
            .apply_discount_code("ONEPER", Some("cust-2"), Some("order-3"), Money::from_cents(10_000))
            .await
            .unwrap();

        assert_eq!(engine.list_code_usages(&code.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_inactive_promotion_rejects_its_codes() {
        let engine = engine().await;
        let code = active_code(&engine, Some("PAUSED")).await;
        engine
            .set_promotion_status(&code.promotion_id, PromoStatus::Inactive)
            .await
            .unwrap();

        let err = engine
            .validate_discount_code("PAUSED", None, Money::from_cents(100))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "code_inactive");
    }
}
