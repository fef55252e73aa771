//! # Engine Error Type
//!
//! Unified error type for engine operations.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow                                           │
//! │                                                                         │
//! │  Caller                       Engine                                    │
//! │  ──────                       ──────                                    │
//! │                                                                         │
//! │  redeem_gift_card("GC..", $15)                                         │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Engine Operation                                                │  │
//! │  │  Result<T, EngineError>                                          │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Rule violated? ── PromoError::InsufficientBalance ──┐           │  │
//! │  │         │                                            ▼           │  │
//! │  │  Store failed? ─── DbError::QueryFailed ──────── EngineError ──► │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  err.code() == "insufficient_balance"   ← stable, branch on this       │
//! │  err.to_string()                        ← human-readable detail        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use promo_core::PromoError;
use promo_db::DbError;

/// Error returned from engine operations.
///
/// Business rule violations keep their typed variant (and stable code) from
/// promo-core; infrastructure failures surface as the `Db` variant.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A business rule was violated. The first violated condition wins.
    #[error(transparent)]
    Promo(#[from] PromoError),

    /// The ledger store failed.
    #[error(transparent)]
    Db(#[from] DbError),
}

impl EngineError {
    /// Stable, enumerable failure code for callers to branch on.
    ///
    /// Rule violations delegate to [`PromoError::code`]; store failures
    /// collapse to a small set of infrastructure codes.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Promo(err) => err.code(),
            EngineError::Db(DbError::NotFound { .. }) => "not_found",
            EngineError::Db(DbError::UniqueViolation { .. }) => "duplicate",
            EngineError::Db(_) => "database_error",
        }
    }
}

/// Convenience conversion so validators can be used with `?` directly.
impl From<promo_core::ValidationError> for EngineError {
    fn from(err: promo_core::ValidationError) -> Self {
        EngineError::Promo(PromoError::Validation(err))
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_delegate_to_rule_violations() {
        let err: EngineError = PromoError::InsufficientBalance {
            available_cents: 1000,
            requested_cents: 1500,
        }
        .into();
        assert_eq!(err.code(), "insufficient_balance");
    }

    #[test]
    fn test_store_failures_collapse() {
        let err: EngineError = DbError::QueryFailed("boom".to_string()).into();
        assert_eq!(err.code(), "database_error");

        let err: EngineError = DbError::duplicate("code", "SAVE10").into();
        assert_eq!(err.code(), "duplicate");
    }
}
