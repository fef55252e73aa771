//! # Code Generation
//!
//! Random code strings for discount codes and gift cards.
//!
//! ## Format
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Alphabet:  A-Z 0-9  (36 symbols, no lowercase, no punctuation)        │
//! │                                                                         │
//! │  Discount code:   8 chars              e.g.  "X7KQ2M9A"                │
//! │  Gift card code:  "GC" + 10 chars      e.g.  "GCA7F2K9Q1ZX"            │
//! │                                                                         │
//! │  8 chars over 36 symbols ≈ 2.8e12 combinations; collisions are         │
//! │  resolved by the store's UNIQUE constraint plus a bounded retry at     │
//! │  the engine layer.                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The RNG is injected so callers control the entropy source; production
//! uses the OS RNG, tests may use a seeded one.

use rand::{CryptoRng, Rng};

/// Symbols used in generated codes. Uppercase-only keeps codes easy to read
/// aloud and type.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of a generated discount code.
pub const DISCOUNT_CODE_LEN: usize = 8;

/// Length of the random portion of a gift card code.
pub const GIFT_CARD_CODE_LEN: usize = 10;

/// Prefix on every generated gift card code.
pub const GIFT_CARD_CODE_PREFIX: &str = "GC";

fn random_code<R: Rng + CryptoRng>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Generates an 8-character discount code.
pub fn generate_discount_code<R: Rng + CryptoRng>(rng: &mut R) -> String {
    random_code(rng, DISCOUNT_CODE_LEN)
}

/// Generates a gift card code: "GC" followed by 10 random characters.
pub fn generate_gift_card_code<R: Rng + CryptoRng>(rng: &mut R) -> String {
    let mut code = String::with_capacity(GIFT_CARD_CODE_PREFIX.len() + GIFT_CARD_CODE_LEN);
    code.push_str(GIFT_CARD_CODE_PREFIX);
    code.push_str(&random_code(rng, GIFT_CARD_CODE_LEN));
    code
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn test_discount_code_shape() {
        let code = generate_discount_code(&mut OsRng);
        assert_eq!(code.len(), DISCOUNT_CODE_LEN);
        assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_gift_card_code_shape() {
        let code = generate_gift_card_code(&mut OsRng);
        assert_eq!(code.len(), GIFT_CARD_CODE_PREFIX.len() + GIFT_CARD_CODE_LEN);
        assert!(code.starts_with(GIFT_CARD_CODE_PREFIX));
        assert!(code[GIFT_CARD_CODE_PREFIX.len()..]
            .bytes()
            .all(|b| CODE_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_codes_vary() {
        // With 2.8e12 combinations, 10 draws colliding would indicate a
        // broken RNG hookup, not bad luck.
        let codes: Vec<String> = (0..10).map(|_| generate_discount_code(&mut OsRng)).collect();
        let first = &codes[0];
        assert!(codes.iter().any(|c| c != first));
    }
}
