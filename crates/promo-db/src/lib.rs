//! # promo-db: Ledger Store for the Promotion Engine
//!
//! This crate provides database access for the promotion engine.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Promotion Engine Data Flow                          │
//! │                                                                         │
//! │  Engine Operation (redeem_gift_card)                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     promo-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ PromotionRepo │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ GiftCardRepo  │    │ 001_init.sql │  │   │
//! │  │   │ Connection    │    │ LoyaltyRepo   │    │              │  │   │
//! │  │   │ Management    │    │               │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (WAL mode, foreign keys on)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use promo_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/promo.db")).await?;
//! let card = db.gift_cards().get_card_by_code("GCA7F2K9Q1ZX").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::gift_card::GiftCardRepository;
pub use repository::loyalty::LoyaltyRepository;
pub use repository::promotion::{PromotionRepository, RecordUsageOutcome};
pub use repository::Page;
