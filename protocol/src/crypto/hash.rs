//! SHA-256, the only digest the handshake uses.

use sha2::{Digest, Sha256};

use crate::config::SHA256_DIGEST_LENGTH;

/// Compute the SHA-256 digest of `data`.
///
/// # Example
///
/// ```
/// use ra_protocol::crypto::sha256;
///
/// let digest = sha256(b"test-nonce");
/// assert_eq!(digest.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> [u8; SHA256_DIGEST_LENGTH] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; SHA256_DIGEST_LENGTH];
    output.copy_from_slice(&result);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        // SHA-256("abc") from FIPS 180-2.
        let digest = sha256(b"abc");
        let expected = [
            0xba, 0x78, 0x16, 0xbf, 0x8f, 0x01, 0xcf, 0xea, 0x41, 0x41, 0x40, 0xde, 0x5d, 0xae,
            0x22, 0x23, 0xb0, 0x03, 0x61, 0xa3, 0x96, 0x17, 0x7a, 0x9c, 0xb4, 0x10, 0xff, 0x61,
            0xf2, 0x00, 0x15, 0xad,
        ];
        assert_eq!(digest, expected);
    }

    #[test]
    fn test_sha256_deterministic() {
        assert_eq!(sha256(b"nonce"), sha256(b"nonce"));
        assert_ne!(sha256(b"nonce"), sha256(b"nonce2"));
    }
}
