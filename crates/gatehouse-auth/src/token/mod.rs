//! Signed token creation and verification.

pub mod claims;
pub mod decoder;
pub mod encoder;

pub use claims::{Claims, TokenKind};
pub use decoder::{TokenDecoder, TokenError};
pub use encoder::TokenEncoder;

use sha2::{Digest, Sha256};

/// SHA-256 hex digest of a token, used wherever a token is persisted or
/// looked up. The raw token never touches the store.
pub fn digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex_encode(&hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_stable_hex() {
        let a = digest("some-token");
        let b = digest("some-token");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(digest("some-token"), digest("other-token"));
    }
}
