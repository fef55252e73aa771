//! # Error Types
//!
//! Domain-specific error types for promo-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  promo-core errors (this file)                                         │
//! │  ├── PromoError       - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  promo-db errors (separate crate)                                      │
//! │  └── DbError          - Ledger store failures                          │
//! │                                                                         │
//! │  promo-engine errors (separate crate)                                  │
//! │  └── EngineError      - What callers see (stable codes)                │
//! │                                                                         │
//! │  Flow: ValidationError → PromoError → EngineError → caller             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (code, ID, amounts)
//! 3. Errors are enum variants, never String
//! 4. Every variant maps to a stable code via [`PromoError::code`] so
//!    callers can branch without string-matching

use thiserror::Error;

// =============================================================================
// Promo Error
// =============================================================================

/// Business rule violations in the promotion/ledger domain.
///
/// These are the typed failures defined by the engine's contract. The first
/// violated condition wins; no partial discount application or balance
/// mutation is ever visible alongside one of these.
#[derive(Debug, Error)]
pub enum PromoError {
    /// Promotion cannot be found.
    #[error("Promotion not found: {0}")]
    PromotionNotFound(String),

    /// Discount code cannot be found by id.
    #[error("Discount code not found: {0}")]
    CodeNotFound(String),

    /// Gift card cannot be found.
    #[error("Gift card not found: {0}")]
    GiftCardNotFound(String),

    /// Loyalty program cannot be found.
    #[error("Loyalty program not found: {0}")]
    ProgramNotFound(String),

    /// Loyalty member cannot be found.
    #[error("Loyalty member not found: {0}")]
    MemberNotFound(String),

    /// Loyalty tier cannot be found.
    #[error("Loyalty tier not found: {0}")]
    TierNotFound(String),

    /// No discount code exists for the presented code string.
    #[error("Invalid discount code: {0}")]
    InvalidCode(String),

    /// The code (or its parent promotion) is not currently active.
    ///
    /// ## When This Occurs
    /// - Code status is `inactive`
    /// - Parent promotion is not `active`
    /// - Parent promotion's start date is still in the future
    #[error("Discount code is not active: {0}")]
    CodeInactive(String),

    /// The code's own expiry, or its promotion's end date, has passed.
    #[error("Discount code has expired: {0}")]
    CodeExpired(String),

    /// The code's usage ceiling has been reached.
    #[error("Usage limit exceeded for code {code}: limit {limit}")]
    UsageLimitExceeded { code: String, limit: i64 },

    /// This customer has already used the code up to its per-customer ceiling.
    #[error("Customer usage limit exceeded for code {code}: limit {limit}")]
    CustomerUsageLimitExceeded { code: String, limit: i64 },

    /// The gift card is past its expiry date.
    #[error("Gift card has expired: {0}")]
    GiftCardExpired(String),

    /// The gift card is not in `active` status.
    #[error("Gift card is not active: {0}")]
    GiftCardInactive(String),

    /// The gift card balance does not cover the requested amount.
    ///
    /// ## User Workflow
    /// ```text
    /// Redeem $15.00
    ///      │
    ///      ▼
    /// balance = $10.00 < $15.00
    ///      │
    ///      ▼
    /// InsufficientBalance { available: 1000, requested: 1500 }
    /// ```
    #[error("Insufficient gift card balance: available {available_cents}, requested {requested_cents}")]
    InsufficientBalance {
        available_cents: i64,
        requested_cents: i64,
    },

    /// A zero or wrong-signed amount was supplied for a ledger operation.
    #[error("Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    /// The member's point balance does not cover the requested redemption.
    #[error("Insufficient loyalty points: available {available}, requested {requested}")]
    InsufficientPoints { available: i64, requested: i64 },

    /// The loyalty member is not in `active` status.
    #[error("Loyalty member is not active: {0}")]
    MemberInactive(String),

    /// A promotion status change outside the allowed transition graph.
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidStatusTransition { from: String, to: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl PromoError {
    /// Stable, enumerable failure code.
    ///
    /// Callers render distinct messages per code; these strings are part of
    /// the contract and never change once published.
    pub fn code(&self) -> &'static str {
        match self {
            PromoError::PromotionNotFound(_) => "promotion_not_found",
            PromoError::CodeNotFound(_) => "code_not_found",
            PromoError::GiftCardNotFound(_) => "gift_card_not_found",
            PromoError::ProgramNotFound(_) => "loyalty_program_not_found",
            PromoError::MemberNotFound(_) => "loyalty_member_not_found",
            PromoError::TierNotFound(_) => "loyalty_tier_not_found",
            PromoError::InvalidCode(_) => "invalid_code",
            PromoError::CodeInactive(_) => "code_inactive",
            PromoError::CodeExpired(_) => "code_expired",
            PromoError::UsageLimitExceeded { .. } => "usage_limit_exceeded",
            PromoError::CustomerUsageLimitExceeded { .. } => "customer_usage_limit_exceeded",
            PromoError::GiftCardExpired(_) => "gift_card_expired",
            PromoError::GiftCardInactive(_) => "gift_card_inactive",
            PromoError::InsufficientBalance { .. } => "insufficient_balance",
            PromoError::InvalidAmount { .. } => "invalid_amount",
            PromoError::InsufficientPoints { .. } => "insufficient_points",
            PromoError::MemberInactive(_) => "member_inactive",
            PromoError::InvalidStatusTransition { .. } => "invalid_status_transition",
            PromoError::Validation(_) => "validation_error",
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input doesn't meet requirements, before any
/// business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, bad code characters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., duplicate code string).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with PromoError.
pub type CoreResult<T> = Result<T, PromoError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = PromoError::InsufficientBalance {
            available_cents: 1000,
            requested_cents: 1500,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient gift card balance: available 1000, requested 1500"
        );
        assert_eq!(err.code(), "insufficient_balance");
    }

    #[test]
    fn test_codes_are_distinct() {
        // Spot-check the codes callers branch on most
        assert_eq!(PromoError::InvalidCode("X".into()).code(), "invalid_code");
        assert_eq!(PromoError::CodeExpired("X".into()).code(), "code_expired");
        assert_eq!(PromoError::CodeInactive("X".into()).code(), "code_inactive");
        assert_ne!(
            PromoError::CodeExpired("X".into()).code(),
            PromoError::CodeInactive("X".into()).code()
        );
    }

    #[test]
    fn test_validation_converts_to_promo_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let err: PromoError = validation_err.into();
        assert!(matches!(err, PromoError::Validation(_)));
        assert_eq!(err.code(), "validation_error");
    }
}
