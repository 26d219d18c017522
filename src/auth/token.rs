use rand_core::{OsRng, RngCore};

use crate::model::session::Token;

/// Generate a fresh session token.
///
/// Tokens are kept non-negative so they survive a round trip through the
/// cookie header and SQLite's signed integers unchanged.
pub fn generate_token() -> Token {
    let mut rng = OsRng;
    (rng.next_u64() >> 1) as Token
}

pub fn parse_token(token: &str) -> Option<Token> {
    token.parse::<Token>().ok().filter(|token| *token >= 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_non_negative_and_round_trip() {
        for _ in 0..100 {
            let token = generate_token();
            assert!(token >= 0);
            assert_eq!(parse_token(&token.to_string()), Some(token));
        }
    }

    #[test]
    fn garbage_tokens_are_rejected() {
        assert_eq!(parse_token(""), None);
        assert_eq!(parse_token("abc"), None);
        assert_eq!(parse_token("-5"), None);
    }
}
