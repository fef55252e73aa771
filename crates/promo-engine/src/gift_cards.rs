//! # Gift Card Operations
//!
//! Issuance, balance queries, and the redeem/refund/adjust ledger writes.
//!
//! ## Two-Phase Check
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  redeem_gift_card("GC..", $15)                                          │
//! │       │                                                                 │
//! │       ├── Phase 1: read card, check_redeemable()                        │
//! │       │       friendly typed errors: expired, inactive, insufficient    │
//! │       │                                                                 │
//! │       └── Phase 2: apply_debit() guarded UPDATE                         │
//! │               the balance condition is re-enforced atomically; a lost   │
//! │               guard is re-classified by re-reading the card             │
//! │                                                                         │
//! │  Two concurrent $10 redemptions of a $10 card: both pass phase 1,       │
//! │  exactly one passes phase 2.                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use promo_core::gift_card::{
    check_adjustable, check_redeemable, GiftCard, GiftCardStatus, GiftCardTransaction,
    TransactionKind,
};
use promo_core::{
    codegen, validation, Money, PromoError, ValidationError, MAX_CODE_GENERATION_ATTEMPTS,
};
use promo_db::{DbError, Page};

use crate::error::EngineResult;
use crate::PromotionEngine;

// =============================================================================
// Request Types
// =============================================================================

/// Request to issue a gift card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueGiftCard {
    pub merchant_id: String,
    /// Initial balance in cents; must be positive.
    pub initial_balance_cents: i64,
    /// ISO currency tag; defaults to USD.
    pub currency: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    /// Custom code string; `None` generates a "GC"-prefixed one.
    pub code: Option<String>,
}

// =============================================================================
// Operations
// =============================================================================

impl PromotionEngine {
    /// Issues a gift card, writing the initial `issue` ledger entry in the
    /// same store transaction as the card row.
    pub async fn issue_gift_card(&self, req: IssueGiftCard) -> EngineResult<GiftCard> {
        validation::validate_positive_amount("initial_balance", req.initial_balance_cents)?;

        let currency = req.currency.unwrap_or_else(|| "USD".to_string());
        validation::validate_currency(&currency)?;

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
            let code = match &custom {
                Some(c) => c.clone(),
                None => codegen::generate_gift_card_code(&mut OsRng),
            };

            let now = Utc::now();
            let card = GiftCard {
                id: Uuid::new_v4().to_string(),
                merchant_id: req.merchant_id.clone(),
                code,
                balance_cents: req.initial_balance_cents,
                initial_balance_cents: req.initial_balance_cents,
                currency: currency.clone(),
                status: GiftCardStatus::Active,
                expires_at: req.expires_at,
                issued_at: now,
                used_at: None,
                created_at: now,
                updated_at: now,
            };

            match self.db().gift_cards().insert_card(&card).await {
                Ok(_) => {
                    info!(
                        id = %card.id,
                        code = %card.code,
                        balance = card.balance_cents,
                        "Gift card issued"
                    );
                    return Ok(card);
                }
                Err(DbError::UniqueViolation { .. }) if custom.is_some() => {
                    return Err(ValidationError::Duplicate {
                        field: "code".to_string(),
                        value: card.code,
                    }
                    .into());
                }
                Err(DbError::UniqueViolation { .. })
                    if attempts + 1 < MAX_CODE_GENERATION_ATTEMPTS =>
                {
                    attempts += 1;
                    debug!(attempts, "Generated gift card code collided, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Gets a card by ID.
    pub async fn get_gift_card(&self, id: &str) -> EngineResult<GiftCard> {
        self.db()
            .gift_cards()
            .get_card(id)
            .await?
            .ok_or_else(|| PromoError::GiftCardNotFound(id.to_string()).into())
    }

    /// Gets a card by its code string.
    pub async fn get_gift_card_by_code(&self, code: &str) -> EngineResult<GiftCard> {
        let normalized = validation::normalize_code(code);
        self.db()
            .gift_cards()
            .get_card_by_code(&normalized)
            .await?
            .ok_or_else(|| PromoError::GiftCardNotFound(normalized).into())
    }

    /// Lists a merchant's cards, newest first, with an optional status
    /// filter.
    pub async fn list_gift_cards(
        &self,
        merchant_id: &str,
        status: Option<GiftCardStatus>,
        page: Page,
    ) -> EngineResult<Vec<GiftCard>> {
        Ok(self
            .db()
            .gift_cards()
            .list_cards(merchant_id, status, page)
            .await?)
    }

    /// Returns a card's current balance by code.
    pub async fn gift_card_balance(&self, code: &str) -> EngineResult<Money> {
        Ok(self.get_gift_card_by_code(code).await?.balance())
    }

    /// Changes a card's status.
    pub async fn set_gift_card_status(
        &self,
        id: &str,
        status: GiftCardStatus,
    ) -> EngineResult<()> {
        self.get_gift_card(id).await?;
        self.db()
            .gift_cards()
            .set_card_status(id, status, Utc::now())
            .await?;
        Ok(())
    }

    /// Redeems `amount` from a card by code.
    ///
    /// Returns the recorded ledger entry. A balance that lands exactly on
    /// zero flips the card to `used`.
    pub async fn redeem_gift_card(
        &self,
        code: &str,
        amount: Money,
        order_id: Option<&str>,
    ) -> EngineResult<GiftCardTransaction> {
        let card = self.get_gift_card_by_code(code).await?;
        let now = Utc::now();

        // Phase 1: friendly precheck against the read snapshot
        check_redeemable(&card, amount, now)?;

        // Phase 2: the guarded mutation
        let entry = self
            .db()
            .gift_cards()
            .apply_debit(
                &card.id,
                amount.cents(),
                TransactionKind::Redeem,
                order_id,
                "Gift card redemption",
                now,
            )
            .await?;

        match entry {
            Some(entry) => {
                info!(
                    card_id = %card.id,
                    amount = amount.cents(),
                    balance = entry.balance_cents,
                    "Gift card redeemed"
                );
                Ok(entry)
            }
            // Lost the guard to a concurrent writer; re-read to classify
            None => {
                let current = self.get_gift_card(&card.id).await?;
                check_redeemable(&current, amount, now)?;
                // The snapshot passed but the guard lost anyway; report the
                // balance condition, which is the only racing one
                Err(PromoError::InsufficientBalance {
                    available_cents: current.balance_cents,
                    requested_cents: amount.cents(),
                }
                .into())
            }
        }
    }

    /// Returns `amount` to a card after an order refund.
    ///
    /// Refunding a fully-spent card revives it to `active`.
    pub async fn refund_gift_card(
        &self,
        card_id: &str,
        amount: Money,
        order_id: Option<&str>,
    ) -> EngineResult<GiftCardTransaction> {
        validation::validate_positive_amount("refund amount", amount.cents())?;
        let card = self.get_gift_card(card_id).await?;

        let entry = self
            .db()
            .gift_cards()
            .apply_credit(
                &card.id,
                amount.cents(),
                TransactionKind::Refund,
                order_id,
                "Order refund",
                Utc::now(),
            )
            .await?;

        match entry {
            Some(entry) => {
                info!(card_id = %card.id, amount = amount.cents(), "Gift card refunded");
                Ok(entry)
            }
            None => Err(PromoError::GiftCardInactive(card.id).into()),
        }
    }

    /// Applies a signed manual adjustment to a card's balance.
    ///
    /// Positive amounts load value, negative amounts draw it down under the
    /// same balance guard as a redemption; zero is rejected.
    pub async fn adjust_gift_card(
        &self,
        card_id: &str,
        amount: Money,
        description: &str,
    ) -> EngineResult<GiftCardTransaction> {
        let card = self.get_gift_card(card_id).await?;
        check_adjustable(&card, amount)?;
        let now = Utc::now();

        let entry = if amount.is_positive() {
            self.db()
                .gift_cards()
                .apply_credit(
                    &card.id,
                    amount.cents(),
                    TransactionKind::Adjust,
                    None,
                    description,
                    now,
                )
                .await?
        } else {
            self.db()
                .gift_cards()
                .apply_debit(
                    &card.id,
                    amount.abs().cents(),
                    TransactionKind::Adjust,
                    None,
                    description,
                    now,
                )
                .await?
        };

        match entry {
            Some(entry) => {
                info!(card_id = %card.id, amount = amount.cents(), "Gift card adjusted");
                Ok(entry)
            }
            None => {
                let current = self.get_gift_card(&card.id).await?;
                check_adjustable(&current, amount)?;
                Err(PromoError::InsufficientBalance {
                    available_cents: current.balance_cents,
                    requested_cents: amount.abs().cents(),
                }
                .into())
            }
        }
    }

    /// Lists a card's ledger, oldest first.
    pub async fn list_gift_card_transactions(
        &self,
        card_id: &str,
    ) -> EngineResult<Vec<GiftCardTransaction>> {
        Ok(self.db().gift_cards().list_transactions(card_id).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use promo_db::{Database, DbConfig};

    async fn engine() -> PromotionEngine {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        PromotionEngine::new(db)
    }

    fn issue_req(cents: i64) -> IssueGiftCard {
        IssueGiftCard {
            merchant_id: "merchant-1".to_string(),
            initial_balance_cents: cents,
            currency: None,
            expires_at: None,
            code: None,
        }
    }

    #[tokio::test]
    async fn test_issue_generates_gc_code_and_ledger_entry() {
        let engine = engine().await;
        let card = engine.issue_gift_card(issue_req(5_000)).await.unwrap();

        assert!(card.code.starts_with("GC"));
        assert_eq!(card.code.len(), 12);
        assert_eq!(card.balance_cents, 5_000);

        let ledger = engine.list_gift_card_transactions(&card.id).await.unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].kind, TransactionKind::Issue);

        let active = engine
            .list_gift_cards("merchant-1", Some(GiftCardStatus::Active), Page::default())
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
    }

    #[tokio::test]
    async fn test_issue_rejects_non_positive_balance() {
        let engine = engine().await;
        let err = engine.issue_gift_card(issue_req(0)).await.unwrap_err();
        assert_eq!(err.code(), "validation_error");
    }

    #[tokio::test]
    async fn test_redeem_then_balance() {
        let engine = engine().await;
        let card = engine.issue_gift_card(issue_req(5_000)).await.unwrap();

        let entry = engine
            .redeem_gift_card(&card.code, Money::from_cents(3_000), Some("order-1"))
            .await
            .unwrap();
        assert_eq!(entry.amount_cents, -3_000);

        let balance = engine.gift_card_balance(&card.code).await.unwrap();
        assert_eq!(balance.cents(), 2_000);
    }

    #[tokio::test]
    async fn test_redeem_insufficient_balance() {
        let engine = engine().await;
        let card = engine.issue_gift_card(issue_req(1_000)).await.unwrap();

        let err = engine
            .redeem_gift_card(&card.code, Money::from_cents(1_500), None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "insufficient_balance");
    }

    #[tokio::test]
    async fn test_exact_redemption_uses_card_and_blocks_further_use() {
        let engine = engine().await;
        let card = engine.issue_gift_card(issue_req(1_000)).await.unwrap();

        engine
            .redeem_gift_card(&card.code, Money::from_cents(1_000), None)
            .await
            .unwrap();

        let loaded = engine.get_gift_card(&card.id).await.unwrap();
        assert_eq!(loaded.status, GiftCardStatus::Used);

        let err = engine
            .redeem_gift_card(&card.code, Money::from_cents(1), None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "gift_card_inactive");
    }

    #[tokio::test]
    async fn test_refund_revives_used_card() {
        let engine = engine().await;
        let card = engine.issue_gift_card(issue_req(1_000)).await.unwrap();
        engine
            .redeem_gift_card(&card.code, Money::from_cents(1_000), Some("order-1"))
            .await
            .unwrap();

        engine
            .refund_gift_card(&card.id, Money::from_cents(400), Some("order-1"))
            .await
            .unwrap();

        let loaded = engine.get_gift_card(&card.id).await.unwrap();
        assert_eq!(loaded.status, GiftCardStatus::Active);
        assert_eq!(loaded.balance_cents, 400);
    }

    #[tokio::test]
    async fn test_adjustment_signs() {
        let engine = engine().await;
        let card = engine.issue_gift_card(issue_req(1_000)).await.unwrap();

        engine
            .adjust_gift_card(&card.id, Money::from_cents(500), "Goodwill credit")
            .await
            .unwrap();
        engine
            .adjust_gift_card(&card.id, Money::from_cents(-200), "Correction")
            .await
            .unwrap();

        let loaded = engine.get_gift_card(&card.id).await.unwrap();
        assert_eq!(loaded.balance_cents, 1_300);

        let err = engine
            .adjust_gift_card(&card.id, Money::zero(), "No-op")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "invalid_amount");

        let err = engine
            .adjust_gift_card(&card.id, Money::from_cents(-5_000), "Overdraw")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "insufficient_balance");
    }

    #[tokio::test]
    async fn test_ledger_invariant_after_mixed_operations() {
        let engine = engine().await;
        let card = engine.issue_gift_card(issue_req(10_000)).await.unwrap();

        engine
            .redeem_gift_card(&card.code, Money::from_cents(2_500), Some("order-1"))
            .await
            .unwrap();
        engine
            .refund_gift_card(&card.id, Money::from_cents(500), Some("order-1"))
            .await
            .unwrap();
        engine
            .adjust_gift_card(&card.id, Money::from_cents(-1_000), "Correction")
            .await
            .unwrap();

        let loaded = engine.get_gift_card(&card.id).await.unwrap();
        let ledger = engine.list_gift_card_transactions(&card.id).await.unwrap();
        let sum: i64 = ledger.iter().map(|t| t.amount_cents).sum();

        // balance == Σ(deltas), with the issue entry carrying the initial load
        assert_eq!(loaded.balance_cents, sum);
        assert_eq!(loaded.balance_cents, 7_000);

        // Every entry snapshots the balance it produced; the last snapshot
        // matches the aggregate
        assert_eq!(ledger.last().map(|t| t.balance_cents), Some(7_000));
    }

    #[tokio::test]
    async fn test_expired_card_rejected() {
        let engine = engine().await;
        let card = engine
            .issue_gift_card(IssueGiftCard {
                expires_at: Some(Utc::now() - chrono::Duration::days(1)),
                ..issue_req(1_000)
            })
            .await
            .unwrap();

        let err = engine
            .redeem_gift_card(&card.code, Money::from_cents(100), None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "gift_card_expired");
    }
}
