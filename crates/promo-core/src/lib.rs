//! # promo-core: Pure Business Logic for the Promotion Engine
//!
//! This crate is the **heart** of the promotion engine. It contains all
//! business rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Promotion Engine Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  promo-engine (Coordinator)                     │   │
//! │  │   validate_discount_code, redeem_gift_card, earn_points, ...   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ promo-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐ ┌───────────┐ ┌───────────┐ ┌───────────┐    │   │
//! │  │   │ promotion │ │ gift_card │ │  loyalty  │ │   money   │    │   │
//! │  │   │ validate_ │ │ redeem    │ │ compute_  │ │   Money   │    │   │
//! │  │   │ code      │ │ checks    │ │ points    │ │ percent_of│    │   │
//! │  │   └───────────┘ └───────────┘ └───────────┘ └───────────┘    │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    promo-db (Ledger Store)                      │   │
//! │  │          SQLite queries, migrations, repositories               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`promotion`] - Promotions, discount codes, and code validation
//! - [`gift_card`] - Gift cards and their transaction ledger
//! - [`loyalty`] - Loyalty programs, members, tiers, and the activity ledger
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`codegen`] - Random code generation
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every check is deterministic - time is always an
//!    explicit `now` parameter, never read from a clock
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid
//!    float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use promo_core::money::Money;
//!
//! // Create money from cents (never from floats!)
//! let order = Money::from_cents(10_000); // $100.00
//!
//! // A 10% discount in basis points
//! let discount = order.percent_of(1_000);
//! assert_eq!(discount.cents(), 1_000); // $10.00
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod codegen;
pub mod error;
pub mod gift_card;
pub mod loyalty;
pub mod money;
pub mod promotion;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use promo_core::Money` instead of
// `use promo_core::money::Money`

pub use error::{CoreResult, PromoError, ValidationError};
pub use money::Money;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default number of times a single customer may use a discount code.
///
/// Matches the common storefront expectation: one use per customer unless
/// the merchant raises the ceiling explicitly.
pub const DEFAULT_CUSTOMER_USE_LIMIT: i64 = 1;

/// Default spend (in cents) required to earn one loyalty point.
pub const DEFAULT_POINT_VALUE_CENTS: i64 = 100;

/// Default loyalty earn multiplier in basis points (10000 = 100%).
pub const DEFAULT_REWARD_RATIO_BPS: u32 = 10_000;

/// How many times the engine retries code generation on a unique-constraint
/// collision before giving up.
pub const MAX_CODE_GENERATION_ATTEMPTS: u32 = 5;
