//! Content checksums.

use sha2::{Digest, Sha256};

/// Hex characters kept from the SHA-256 digest.
pub const CHECKSUM_LEN: usize = 16;

/// Stable checksum of raw bytes: truncated lowercase SHA-256 hex.
pub fn checksum(bytes: &[u8]) -> String {
    let mut hex = hex::encode(Sha256::digest(bytes));
    hex.truncate(CHECKSUM_LEN);
    hex
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_checksum_is_stable_and_truncated() {
        // sha256("") = e3b0c44298fc1c14...
        assert_eq!(checksum(b""), "e3b0c44298fc1c14");
        assert_eq!(checksum(b"lore").len(), CHECKSUM_LEN);
        assert_ne!(checksum(b"a"), checksum(b"b"));
    }
}
