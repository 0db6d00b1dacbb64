//! Share tokens for unauthenticated links
//!
//! Grocery lists and event edit links are addressed by an opaque token
//! instead of their row id.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;

/// Random bytes per token (24 bytes -> 32 url-safe characters)
const TOKEN_BYTES: usize = 24;

/// Generate a new url-safe share token.
pub fn generate_share_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Cheap shape check before a token reaches the database.
pub fn looks_like_share_token(token: &str) -> bool {
    (16..=64).contains(&token.len())
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn tokens_are_url_safe_and_unique() {
        let a = generate_share_token();
        let b = generate_share_token();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
        assert!(looks_like_share_token(&a));
    }

    #[test]
    fn rejects_path_like_input() {
        assert!(!looks_like_share_token("../../etc/passwd"));
        assert!(!looks_like_share_token("short"));
    }

    proptest! {
        #[test]
        fn generated_tokens_always_pass_shape_check(_seed in 0u8..64) {
            prop_assert!(looks_like_share_token(&generate_share_token()));
        }
    }
}
