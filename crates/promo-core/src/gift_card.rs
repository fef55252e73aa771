//! # Gift Cards
//!
//! Stored-value instruments with an append-only transaction log.
//!
//! ## The Ledger Invariant
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  balance == initial_balance + Σ(transaction.amount)                    │
//! │  balance >= 0                                    ALWAYS                 │
//! │                                                                         │
//! │  issue   +$50.00 ──► balance $50.00                                    │
//! │  redeem  -$30.00 ──► balance $20.00                                    │
//! │  refund  +$10.00 ──► balance $30.00                                    │
//! │  redeem  -$30.00 ──► balance  $0.00  → status flips to `used`          │
//! │                                                                         │
//! │  The transaction log is the source of truth; the balance column is a   │
//! │  derived aggregate updated in the same store transaction as the log    │
//! │  insert.                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The functions here are the pure precondition checks; the conditional
//! balance update that makes them race-safe lives in the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreResult, PromoError};
use crate::money::Money;

// =============================================================================
// Status & Kind Enums
// =============================================================================

/// Lifecycle status of a gift card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum GiftCardStatus {
    Active,
    Inactive,
    Expired,
    /// Balance reached exactly zero. Set together with `used_at`.
    Used,
}

/// Kind of a gift-card ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Value loaded onto the card (positive amount).
    Issue,
    /// Value drawn down (negative amount).
    Redeem,
    /// Value returned after an order refund (positive amount).
    Refund,
    /// Manual correction (either sign).
    Adjust,
}

// =============================================================================
// Entities
// =============================================================================

/// A stored-value gift card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GiftCard {
    pub id: String,
    pub merchant_id: String,

    /// Unique code string (e.g., "GCA7F2K9Q1ZX").
    pub code: String,

    /// Current balance in cents. Derived from the transaction log; never
    /// negative.
    pub balance_cents: i64,
    /// Balance the card was issued with.
    pub initial_balance_cents: i64,

    /// ISO currency tag; informational, no cross-currency arithmetic.
    pub currency: String,

    pub status: GiftCardStatus,

    pub expires_at: Option<DateTime<Utc>>,
    pub issued_at: DateTime<Utc>,
    /// Set exactly when the balance first reaches zero.
    pub used_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GiftCard {
    /// Returns the current balance as Money.
    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_cents(self.balance_cents)
    }

    /// Checks whether the card's expiry has passed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(at) if at < now)
    }
}

/// One entry in a gift card's transaction log. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GiftCardTransaction {
    pub id: String,
    pub gift_card_id: String,
    pub order_id: Option<String>,
    pub kind: TransactionKind,
    /// Signed delta in cents (redeem entries are negative).
    pub amount_cents: i64,
    /// Balance after this entry was applied (snapshot).
    pub balance_cents: i64,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Precondition Checks
// =============================================================================

/// Checks the preconditions for redeeming `amount` from a card.
///
/// ## Check Order (first failing check wins)
/// 1. card status `active`      → GiftCardInactive
/// 2. expiry passed             → GiftCardExpired
/// 3. amount > 0                → InvalidAmount
/// 4. balance >= amount         → InsufficientBalance
///
/// Read-only. The store re-enforces the balance condition atomically when
/// the redemption is recorded, so a stale read here can delay but never
/// corrupt the ledger.
pub fn check_redeemable(card: &GiftCard, amount: Money, now: DateTime<Utc>) -> CoreResult<()> {
    if card.status != GiftCardStatus::Active {
        return Err(PromoError::GiftCardInactive(card.id.clone()));
    }

    if card.is_expired(now) {
        return Err(PromoError::GiftCardExpired(card.id.clone()));
    }

    if !amount.is_positive() {
        return Err(PromoError::InvalidAmount {
            reason: "redemption amount must be positive".to_string(),
        });
    }

    if card.balance() < amount {
        return Err(PromoError::InsufficientBalance {
            available_cents: card.balance_cents,
            requested_cents: amount.cents(),
        });
    }

    Ok(())
}

/// Checks the preconditions for a signed balance adjustment and classifies
/// the resulting ledger entry.
///
/// Positive amounts behave as `issue` entries; negative amounts behave as
/// `redeem` entries and are subject to the same balance check; zero is
/// rejected.
pub fn check_adjustable(card: &GiftCard, amount: Money) -> CoreResult<TransactionKind> {
    if card.status != GiftCardStatus::Active {
        return Err(PromoError::GiftCardInactive(card.id.clone()));
    }

    if amount.is_zero() {
        return Err(PromoError::InvalidAmount {
            reason: "adjustment amount must be non-zero".to_string(),
        });
    }

    if amount.is_positive() {
        return Ok(TransactionKind::Issue);
    }

    if card.balance() < amount.abs() {
        return Err(PromoError::InsufficientBalance {
            available_cents: card.balance_cents,
            requested_cents: amount.abs().cents(),
        });
    }

    Ok(TransactionKind::Redeem)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn card(balance_cents: i64) -> GiftCard {
        let now = Utc::now();
        GiftCard {
            id: "card-1".to_string(),
            merchant_id: "merchant-1".to_string(),
            code: "GCTEST000001".to_string(),
            balance_cents,
            initial_balance_cents: balance_cents,
            currency: "USD".to_string(),
            status: GiftCardStatus::Active,
            expires_at: None,
            issued_at: now,
            used_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_redeem_happy_path() {
        assert!(check_redeemable(&card(1000), Money::from_cents(1000), Utc::now()).is_ok());
        assert!(check_redeemable(&card(1000), Money::from_cents(1), Utc::now()).is_ok());
    }

    #[test]
    fn test_redeem_insufficient_balance() {
        let err = check_redeemable(&card(1000), Money::from_cents(1500), Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            PromoError::InsufficientBalance {
                available_cents: 1000,
                requested_cents: 1500,
            }
        ));
    }

    #[test]
    fn test_redeem_rejects_non_positive_amount() {
        assert!(matches!(
            check_redeemable(&card(1000), Money::zero(), Utc::now()).unwrap_err(),
            PromoError::InvalidAmount { .. }
        ));
        assert!(matches!(
            check_redeemable(&card(1000), Money::from_cents(-100), Utc::now()).unwrap_err(),
            PromoError::InvalidAmount { .. }
        ));
    }

    #[test]
    fn test_redeem_inactive_card() {
        let mut c = card(1000);
        c.status = GiftCardStatus::Used;
        assert!(matches!(
            check_redeemable(&c, Money::from_cents(100), Utc::now()).unwrap_err(),
            PromoError::GiftCardInactive(_)
        ));
    }

    #[test]
    fn test_redeem_expired_card() {
        let mut c = card(1000);
        c.expires_at = Some(Utc::now() - Duration::days(1));
        assert!(matches!(
            check_redeemable(&c, Money::from_cents(100), Utc::now()).unwrap_err(),
            PromoError::GiftCardExpired(_)
        ));
    }

    #[test]
    fn test_adjust_classification() {
        // Positive → issue
        assert_eq!(
            check_adjustable(&card(1000), Money::from_cents(500)).unwrap(),
            TransactionKind::Issue
        );
        // Negative within balance → redeem
        assert_eq!(
            check_adjustable(&card(1000), Money::from_cents(-500)).unwrap(),
            TransactionKind::Redeem
        );
    }

    #[test]
    fn test_adjust_rejects_zero() {
        assert!(matches!(
            check_adjustable(&card(1000), Money::zero()).unwrap_err(),
            PromoError::InvalidAmount { .. }
        ));
    }

    #[test]
    fn test_adjust_negative_beyond_balance() {
        assert!(matches!(
            check_adjustable(&card(1000), Money::from_cents(-1500)).unwrap_err(),
            PromoError::InsufficientBalance { .. }
        ));
    }
}
