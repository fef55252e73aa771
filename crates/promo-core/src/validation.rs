//! # Validation Module
//!
//! Input validation for caller-supplied data.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Engine operation (Rust)                                      │
//! │  └── THIS MODULE: field shape and range checks, before business logic  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Business rules (promotion.rs / gift_card.rs / loyalty.rs)    │
//! │  └── status, expiry, ceilings, balances                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Store (SQLite)                                               │
//! │  ├── UNIQUE code constraints                                           │
//! │  ├── CHECK(balance_cents >= 0)                                         │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Defense in depth: each layer catches what the one above missed        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest name accepted for promotions, programs, and tiers.
pub const MAX_NAME_LEN: usize = 200;

/// Longest code string accepted for discount codes and gift cards.
pub const MAX_CODE_LEN: usize = 50;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a display name (promotion, loyalty program, tier).
///
/// ## Rules
/// - Must not be empty after trimming
/// - Must be at most 200 characters
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a code string (discount code or gift card code).
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 50 characters
/// - Uppercase letters, digits, hyphens, underscores only
///
/// Generated codes always satisfy this; merchant-supplied custom codes are
/// checked here before insert.
pub fn validate_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > MAX_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: MAX_CODE_LEN,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only uppercase letters, digits, hyphens, and underscores"
                .to_string(),
        });
    }

    Ok(())
}

/// Normalizes a presented code for lookup: trimmed and uppercased.
///
/// Codes are stored uppercase, so "save10" and "SAVE10" resolve to the same
/// row.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Validates an ISO 4217 currency tag.
///
/// The tag is informational (no cross-currency arithmetic), but a malformed
/// one is still rejected at the door.
pub fn validate_currency(currency: &str) -> ValidationResult<()> {
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::InvalidFormat {
            field: "currency".to_string(),
            reason: "must be a 3-letter uppercase code (e.g., USD)".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a percentage given in basis points (0..=10000).
pub fn validate_bps(field: &str, bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

/// Validates that an amount in cents is strictly positive.
pub fn validate_positive_amount(field: &str, cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates an optional usage limit (must be positive when set).
pub fn validate_usage_limit(field: &str, limit: Option<i64>) -> ValidationResult<()> {
    if let Some(limit) = limit {
        if limit <= 0 {
            return Err(ValidationError::MustBePositive {
                field: field.to_string(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Summer Sale").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"A".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_code() {
        assert!(validate_code("SAVE10").is_ok());
        assert!(validate_code("GC-2024_X").is_ok());
        assert!(validate_code("").is_err());
        assert!(validate_code("save10").is_err()); // lowercase rejected
        assert!(validate_code("SAVE 10").is_err()); // whitespace rejected
        assert!(validate_code(&"X".repeat(51)).is_err());
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("  save10 "), "SAVE10");
        assert_eq!(normalize_code("SAVE10"), "SAVE10");
    }

    #[test]
    fn test_validate_currency() {
        assert!(validate_currency("USD").is_ok());
        assert!(validate_currency("usd").is_err());
        assert!(validate_currency("US").is_err());
        assert!(validate_currency("DOLLARS").is_err());
    }

    #[test]
    fn test_numeric_validators() {
        assert!(validate_bps("percentage", 10_000).is_ok());
        assert!(validate_bps("percentage", 10_001).is_err());

        assert!(validate_positive_amount("amount", 1).is_ok());
        assert!(validate_positive_amount("amount", 0).is_err());
        assert!(validate_positive_amount("amount", -5).is_err());

        assert!(validate_usage_limit("usage_limit", None).is_ok());
        assert!(validate_usage_limit("usage_limit", Some(10)).is_ok());
        assert!(validate_usage_limit("usage_limit", Some(0)).is_err());
    }
}
