//! # Repository Module
//!
//! Database repository implementations for the promotion engine.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Engine Operation                                                      │
//! │       │                                                                 │
//! │       │  db.gift_cards().apply_debit(id, 1000, ...)                     │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  GiftCardRepository                                                    │
//! │  ├── get_card(&self, id)                                               │
//! │  ├── apply_debit(&self, ...)     ← guard + ledger in one tx            │
//! │  └── list_transactions(&self, id)                                      │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Conditional mutations return Option/outcome enums rather than         │
//! │  errors: a lost guard is an expected answer, not a failure.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`promotion::PromotionRepository`] - Promotions, codes, usage ledger
//! - [`gift_card::GiftCardRepository`] - Cards and their value ledger
//! - [`loyalty::LoyaltyRepository`] - Programs, members, tiers, activities

pub mod gift_card;
pub mod loyalty;
pub mod promotion;

/// Limit/offset window for list queries.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    /// Creates a page window.
    pub fn new(limit: i64, offset: i64) -> Self {
        Page { limit, offset }
    }
}

impl Default for Page {
    fn default() -> Self {
        Page {
            limit: 50,
            offset: 0,
        }
    }
}
