//! # Gift Card Repository
//!
//! Database operations for gift cards and their transaction ledger.
//!
//! ## Redemption Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  apply_debit() - One Transaction                        │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    │                                                                    │
//! │    ├── UPDATE gift_cards                                                │
//! │    │   SET balance = balance - amount,                                  │
//! │    │       status  = CASE WHEN balance - amount = 0                     │
//! │    │                      THEN 'used' ELSE status END,                  │
//! │    │       used_at = CASE ... END                                       │
//! │    │   WHERE id = ? AND status = 'active' AND balance >= amount         │
//! │    │   RETURNING balance_cents                                          │
//! │    │        │                                                           │
//! │    │        └── no row? ──► ROLLBACK, denied                            │
//! │    │                                                                    │
//! │    └── INSERT gift_card_transactions (signed delta, balance snapshot)   │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  The WHERE clause is the serialization point: two concurrent $10        │
//! │  redemptions of a $10 card cannot both match, so exactly one wins.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use crate::repository::Page;
use promo_core::gift_card::{GiftCard, GiftCardStatus, GiftCardTransaction, TransactionKind};

// =============================================================================
// Row Mapping
// =============================================================================

fn map_card(row: &SqliteRow) -> DbResult<GiftCard> {
    Ok(GiftCard {
        id: row.try_get("id")?,
        merchant_id: row.try_get("merchant_id")?,
        code: row.try_get("code")?,
        balance_cents: row.try_get("balance_cents")?,
        initial_balance_cents: row.try_get("initial_balance_cents")?,
        currency: row.try_get("currency")?,
        status: row.try_get("status")?,
        expires_at: row.try_get("expires_at")?,
        issued_at: row.try_get("issued_at")?,
        used_at: row.try_get("used_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn map_transaction(row: &SqliteRow) -> DbResult<GiftCardTransaction> {
    Ok(GiftCardTransaction {
        id: row.try_get("id")?,
        gift_card_id: row.try_get("gift_card_id")?,
        order_id: row.try_get("order_id")?,
        kind: row.try_get("kind")?,
        amount_cents: row.try_get("amount_cents")?,
        balance_cents: row.try_get("balance_cents")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
    })
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for gift card and transaction ledger operations.
#[derive(Debug, Clone)]
pub struct GiftCardRepository {
    pool: SqlitePool,
}

impl GiftCardRepository {
    /// Creates a new GiftCardRepository.
    pub fn new(pool: SqlitePool) -> Self {
        GiftCardRepository { pool }
    }

    // =========================================================================
    // Cards
    // =========================================================================

    /// Inserts a card together with its initial `issue` ledger entry, in one
    /// transaction. A card with a balance but no ledger row explaining it
    /// would break the ledger invariant from birth.
    pub async fn insert_card(&self, card: &GiftCard) -> DbResult<GiftCardTransaction> {
        debug!(id = %card.id, code = %card.code, balance = card.balance_cents, "Inserting gift card");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO gift_cards (
                id, merchant_id, code, balance_cents, initial_balance_cents,
                currency, status, expires_at, issued_at, used_at,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&card.id)
        .bind(&card.merchant_id)
        .bind(&card.code)
        .bind(card.balance_cents)
        .bind(card.initial_balance_cents)
        .bind(&card.currency)
        .bind(card.status)
        .bind(card.expires_at)
        .bind(card.issued_at)
        .bind(card.used_at)
        .bind(card.created_at)
        .bind(card.updated_at)
        .execute(&mut *tx)
        .await?;

        let issue = GiftCardTransaction {
            id: Uuid::new_v4().to_string(),
            gift_card_id: card.id.clone(),
            order_id: None,
            kind: TransactionKind::Issue,
            amount_cents: card.initial_balance_cents,
            balance_cents: card.initial_balance_cents,
            description: "Gift card issued".to_string(),
            created_at: card.created_at,
        };

        insert_transaction(&mut tx, &issue).await?;

        tx.commit().await?;
        Ok(issue)
    }

    /// Gets a card by ID.
    pub async fn get_card(&self, id: &str) -> DbResult<Option<GiftCard>> {
        let row = sqlx::query("SELECT * FROM gift_cards WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_card).transpose()
    }

    /// Gets a card by its (normalized) code string.
    pub async fn get_card_by_code(&self, code: &str) -> DbResult<Option<GiftCard>> {
        let row = sqlx::query("SELECT * FROM gift_cards WHERE code = ?1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_card).transpose()
    }

    /// Lists a merchant's cards, newest first. A `NULL` status filter
    /// matches every status.
    pub async fn list_cards(
        &self,
        merchant_id: &str,
        status: Option<GiftCardStatus>,
        page: Page,
    ) -> DbResult<Vec<GiftCard>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM gift_cards
            WHERE merchant_id = ?1
              AND (?2 IS NULL OR status = ?2)
            ORDER BY created_at DESC
            LIMIT ?3 OFFSET ?4
            "#,
        )
        .bind(merchant_id)
        .bind(status)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_card).collect()
    }

    /// Updates a card's status.
    pub async fn set_card_status(
        &self,
        id: &str,
        status: GiftCardStatus,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        sqlx::query("UPDATE gift_cards SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // =========================================================================
    // Ledger
    // =========================================================================

    /// Draws `amount_cents` (positive) down from a card.
    ///
    /// Returns the recorded ledger entry, or `None` when the guard failed:
    /// the card was not active or its balance no longer covered the amount.
    /// A balance that lands exactly on zero flips the card to `used` and
    /// stamps `used_at` in the same statement.
    pub async fn apply_debit(
        &self,
        card_id: &str,
        amount_cents: i64,
        kind: TransactionKind,
        order_id: Option<&str>,
        description: &str,
        now: DateTime<Utc>,
    ) -> DbResult<Option<GiftCardTransaction>> {
        debug!(card_id = %card_id, amount = amount_cents, ?kind, "Applying gift card debit");

        let mut tx = self.pool.begin().await?;

        let new_balance: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE gift_cards
            SET balance_cents = balance_cents - ?2,
                status = CASE WHEN balance_cents - ?2 = 0 THEN 'used' ELSE status END,
                used_at = CASE WHEN balance_cents - ?2 = 0 THEN ?3 ELSE used_at END,
                updated_at = ?3
            WHERE id = ?1
              AND status = 'active'
              AND balance_cents >= ?2
            RETURNING balance_cents
            "#,
        )
        .bind(card_id)
        .bind(amount_cents)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(balance) = new_balance else {
            tx.rollback().await?;
            return Ok(None);
        };

        let entry = GiftCardTransaction {
            id: Uuid::new_v4().to_string(),
            gift_card_id: card_id.to_string(),
            order_id: order_id.map(String::from),
            kind,
            amount_cents: -amount_cents,
            balance_cents: balance,
            description: description.to_string(),
            created_at: now,
        };

        insert_transaction(&mut tx, &entry).await?;

        tx.commit().await?;
        Ok(Some(entry))
    }

    /// Adds `amount_cents` (positive) to a card.
    ///
    /// Refunding onto a fully-spent card revives it: `used` flips back to
    /// `active` and `used_at` clears. Returns `None` when the card is in a
    /// state that cannot take credit (inactive or expired).
    pub async fn apply_credit(
        &self,
        card_id: &str,
        amount_cents: i64,
        kind: TransactionKind,
        order_id: Option<&str>,
        description: &str,
        now: DateTime<Utc>,
    ) -> DbResult<Option<GiftCardTransaction>> {
        debug!(card_id = %card_id, amount = amount_cents, ?kind, "Applying gift card credit");

        let mut tx = self.pool.begin().await?;

        let new_balance: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE gift_cards
            SET balance_cents = balance_cents + ?2,
                status = CASE WHEN status = 'used' THEN 'active' ELSE status END,
                used_at = CASE WHEN status = 'used' THEN NULL ELSE used_at END,
                updated_at = ?3
            WHERE id = ?1
              AND status IN ('active', 'used')
            RETURNING balance_cents
            "#,
        )
        .bind(card_id)
        .bind(amount_cents)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(balance) = new_balance else {
            tx.rollback().await?;
            return Ok(None);
        };

        let entry = GiftCardTransaction {
            id: Uuid::new_v4().to_string(),
            gift_card_id: card_id.to_string(),
            order_id: order_id.map(String::from),
            kind,
            amount_cents,
            balance_cents: balance,
            description: description.to_string(),
            created_at: now,
        };

        insert_transaction(&mut tx, &entry).await?;

        tx.commit().await?;
        Ok(Some(entry))
    }

    /// Lists a card's ledger, oldest first.
    pub async fn list_transactions(&self, card_id: &str) -> DbResult<Vec<GiftCardTransaction>> {
        let rows = sqlx::query(
            "SELECT * FROM gift_card_transactions WHERE gift_card_id = ?1 ORDER BY created_at, id",
        )
        .bind(card_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_transaction).collect()
    }
}

async fn insert_transaction(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    entry: &GiftCardTransaction,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO gift_card_transactions (
            id, gift_card_id, order_id, kind, amount_cents, balance_cents,
            description, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&entry.id)
    .bind(&entry.gift_card_id)
    .bind(&entry.order_id)
    .bind(entry.kind)
    .bind(entry.amount_cents)
    .bind(entry.balance_cents)
    .bind(&entry.description)
    .bind(entry.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
