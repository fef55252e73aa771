//! # promo-engine: Coordinator for the Promotion Engine
//!
//! The caller-facing surface of the promotion engine. Each operation wires
//! pure rule checks from promo-core to transactional mutations in promo-db.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Promotion Engine Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               ★ promo-engine (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────────┐  ┌──────────────┐  ┌──────────────┐        │   │
//! │  │   │  promotions  │  │  gift_cards  │  │   loyalty    │        │   │
//! │  │   │  create /    │  │  issue /     │  │  enroll /    │        │   │
//! │  │   │  validate /  │  │  redeem /    │  │  earn /      │        │   │
//! │  │   │  apply code  │  │  refund      │  │  redeem pts  │        │   │
//! │  │   └──────────────┘  └──────────────┘  └──────────────┘        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │          │ pure checks                        │ transactions            │
//! │          ▼                                    ▼                         │
//! │  ┌──────────────────┐              ┌──────────────────┐                │
//! │  │    promo-core    │              │     promo-db     │                │
//! │  │  validate_code   │              │  record_usage    │                │
//! │  │  check_redeemable│              │  apply_debit     │                │
//! │  │  compute_points  │              │  earn_points     │                │
//! │  └──────────────────┘              └──────────────────┘                │
//! │                                                                         │
//! │  Pattern per operation: eager precheck (friendly error), then the      │
//! │  guarded mutation (race-safe), then classify a lost guard.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use promo_db::{Database, DbConfig};
//! use promo_engine::PromotionEngine;
//!
//! let db = Database::new(DbConfig::new("./promo.db")).await?;
//! let engine = PromotionEngine::new(db);
//!
//! let validated = engine
//!     .validate_discount_code("SAVE10", Some("cust-1"), Money::from_cents(10_000))
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod gift_cards;
pub mod loyalty;
pub mod promotions;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{EngineError, EngineResult};
pub use gift_cards::IssueGiftCard;
pub use loyalty::{CreateLoyaltyProgram, CreateTier, UpdateLoyaltyProgram, UpdateTier};
pub use promotions::{
    CreateDiscountCode, CreatePromotion, UpdateDiscountCode, UpdatePromotion, ValidatedCode,
};

use promo_db::Database;

/// The promotion engine: one handle over all three ledger families.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct PromotionEngine {
    db: Database,
}

impl PromotionEngine {
    /// Creates an engine over an existing database handle.
    pub fn new(db: Database) -> Self {
        PromotionEngine { db }
    }

    /// Returns the underlying database handle.
    pub fn db(&self) -> &Database {
        &self.db
    }
}
