//! # Session Key Material
//!
//! RSA-2048 keypair generation, public key export, and OAEP decryption for
//! one handshake.
//!
//! ## Lifecycle
//!
//! A [`SessionKeys`] is generated once when a session starts and dropped when
//! the session ends. There is no rotation, no import, and no way to get the
//! private key out: the only things that leave this module are the public key
//! (as SubjectPublicKeyInfo DER) and plaintexts the authority encrypted for us.
//!
//! ## Padding
//!
//! The authority encrypts with RSA-OAEP using SHA-256 for both the label hash
//! and MGF1. PKCS#1 v1.5 or OAEP-SHA1 ciphertexts fail to decrypt, and that
//! failure is fatal: it means the peer is not the authority we think it is.
//!
//! ## Security considerations
//!
//! - Key generation pulls from `OsRng`.
//! - Key bytes are never logged, serialized, or printed by `Debug`.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use thiserror::Error;

use crate::config::RSA_KEY_BITS;

/// Errors that can occur during key operations.
///
/// Decryption failures carry no detail about which check failed.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("key generation failed: {0}")]
    Generation(String),

    #[error("public key export failed: {0}")]
    Export(String),

    #[error("decryption failed -- wrong key, wrong padding, or corrupted ciphertext")]
    Decryption,

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("encryption failed: {0}")]
    Encryption(String),
}

/// The keypair owned by exactly one handshake session.
///
/// Not `Clone` and not `Serialize`. The only constructor is
/// [`SessionKeys::generate`].
///
/// # Examples
///
/// ```no_run
/// use ra_protocol::crypto::{encrypt_to_spki, SessionKeys};
///
/// let keys = SessionKeys::generate().unwrap();
/// let spki = keys.export_public_key().unwrap();
/// let ciphertext = encrypt_to_spki(&spki, b"hello").unwrap();
/// assert_eq!(keys.decrypt(&ciphertext).unwrap(), b"hello");
/// ```
pub struct SessionKeys {
    private_key: RsaPrivateKey,
    public_key: RsaPublicKey,
}

impl SessionKeys {
    /// Generate a fresh RSA keypair of [`RSA_KEY_BITS`] bits from the OS RNG.
    ///
    /// Takes a noticeable fraction of a second. Call it once, before the
    /// first frame is sent.
    pub fn generate() -> Result<Self, KeyError> {
        let private_key = RsaPrivateKey::new(&mut OsRng, RSA_KEY_BITS)
            .map_err(|e| KeyError::Generation(e.to_string()))?;
        let public_key = private_key.to_public_key();

        tracing::debug!(bits = RSA_KEY_BITS, "session keypair generated");

        Ok(Self {
            private_key,
            public_key,
        })
    }

    /// The public key as SubjectPublicKeyInfo DER bytes.
    pub fn export_public_key(&self) -> Result<Vec<u8>, KeyError> {
        let document = self
            .public_key
            .to_public_key_der()
            .map_err(|e| KeyError::Export(e.to_string()))?;
        Ok(document.as_bytes().to_vec())
    }

    /// The public key as standard (padded) base64 of the SPKI DER. This is
    /// the exact value of the `encoded_public_key` field in `init`.
    pub fn encoded_public_key(&self) -> Result<String, KeyError> {
        Ok(STANDARD.encode(self.export_public_key()?))
    }

    /// Decrypt an RSA-OAEP (SHA-256 / MGF1-SHA-256) ciphertext.
    ///
    /// # Errors
    ///
    /// [`KeyError::Decryption`] for any failure. Callers must treat it as
    /// fatal to the session.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, KeyError> {
        self.private_key
            .decrypt(Oaep::new::<Sha256>(), ciphertext)
            .map_err(|_| KeyError::Decryption)
    }

    /// Modulus size in bits.
    pub fn bits(&self) -> usize {
        self.public_key.size() * 8
    }
}

impl fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material, public or private.
        write!(f, "SessionKeys(rsa-{})", self.bits())
    }
}

/// Encrypt `plaintext` for the holder of an SPKI-encoded RSA public key using
/// the same OAEP parameters the authority uses.
///
/// The initiator never needs this on the wire. It exists so tests, benches,
/// and the demo can play the authority's role.
pub fn encrypt_to_spki(spki_der: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, KeyError> {
    let public_key = RsaPublicKey::from_public_key_der(spki_der)
        .map_err(|e| KeyError::InvalidPublicKey(e.to_string()))?;
    public_key
        .encrypt(&mut OsRng, Oaep::new::<Sha256>(), plaintext)
        .map_err(|e| KeyError::Encryption(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
