//! # Cryptographic Primitives
//!
//! Everything that touches key material or digests lives here:
//!
//! - **RSA-2048** session keypair, exported as SubjectPublicKeyInfo DER.
//! - **RSA-OAEP** decryption with SHA-256 for both the label hash and MGF1.
//!   The authority encrypts the nonce and the user ticket this way.
//! - **SHA-256** for the nonce proof.
//!
//! Thin wrappers over the RustCrypto crates. No custom primitives.

pub mod hash;
pub mod keys;

pub use hash::sha256;
pub use keys::{encrypt_to_spki, KeyError, SessionKeys};
