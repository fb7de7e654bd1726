//! # Payload Codec
//!
//! Pure transforms between wire strings and domain values. Nothing in here
//! touches key material: callers decrypt first, then hand plaintext over.
//!
//! ## Proof format
//!
//! The authority recomputes the proof itself and compares byte-for-byte, so
//! the normalization is part of the wire format:
//!
//! ```text
//! proof = base64(sha256(nonce))  with  '/' -> '_', '+' -> '-', trailing '=' stripped
//! ```
//!
//! That is exactly unpadded base64url, but it is spelled out here as a
//! transform over standard base64 because that is how the authority defines
//! it.

use std::fmt;
use std::str;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{
    DEFAULT_AUTHORITY_DOMAIN, REMOTE_AUTH_PATH, USER_PAYLOAD_FIELDS, USER_PAYLOAD_SEPARATOR,
};
use crate::crypto::sha256;

/// Errors produced while decoding wire payloads.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The decrypted ticket is not `id:discriminator:avatar:username` text.
    #[error("malformed user payload: {0}")]
    MalformedPayload(String),

    /// A ciphertext field is not valid standard base64.
    #[error("invalid base64 in `{field}`: {reason}")]
    InvalidBase64 {
        /// Wire field that failed to decode.
        field: &'static str,
        /// Decoder error message.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// User Identity
// ---------------------------------------------------------------------------

/// The approver's account, as carried in the decrypted `pending_ticket`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Numeric account identifier (kept as text; it does not fit in anything
    /// the wire promises).
    pub id: String,
    /// Legacy discriminator / index field. Carried but not interpreted.
    pub discriminator: String,
    /// Avatar hash. Empty when the account has no custom avatar.
    pub avatar: String,
    /// Display name.
    pub username: String,
}

impl fmt::Display for UserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.username, self.id)
    }
}

// ---------------------------------------------------------------------------
// Transforms
// ---------------------------------------------------------------------------

/// Rewrite standard base64 into the authority's URL-safe, unpadded form.
///
/// ```
/// use ra_protocol::codec::normalize_base64url;
///
/// assert_eq!(normalize_base64url("ab/c+d=="), "ab_c-d");
/// ```
pub fn normalize_base64url(standard: &str) -> String {
    standard
        .replace('/', "_")
        .replace('+', "-")
        .trim_end_matches('=')
        .to_string()
}

/// Derive the nonce proof: normalized base64 of `SHA-256(nonce)`.
pub fn derive_proof(nonce: &[u8]) -> String {
    normalize_base64url(&STANDARD.encode(sha256(nonce)))
}

/// The URL the approver scans, on the default authority domain.
pub fn build_visual_url(fingerprint: &str) -> String {
    visual_url_for(DEFAULT_AUTHORITY_DOMAIN, fingerprint)
}

/// The URL the approver scans, on an explicit domain.
pub fn visual_url_for(domain: &str, fingerprint: &str) -> String {
    format!("https://{}/{}/{}", domain, REMOTE_AUTH_PATH, fingerprint)
}

/// Parse a decrypted user ticket.
///
/// Layout is `id:discriminator:avatar:username`. The username is the last
/// field and may itself contain `:`, so everything after the third separator
/// belongs to it.
///
/// # Errors
///
/// [`CodecError::MalformedPayload`] if the bytes are not UTF-8 or carry fewer
/// than four fields.
pub fn parse_user_identity(plaintext: &[u8]) -> Result<UserIdentity, CodecError> {
    let text = str::from_utf8(plaintext)
        .map_err(|e| CodecError::MalformedPayload(format!("not utf-8: {}", e)))?;

    let fields: Vec<&str> = text
        .splitn(USER_PAYLOAD_FIELDS, USER_PAYLOAD_SEPARATOR)
        .collect();
    if fields.len() < USER_PAYLOAD_FIELDS {
        return Err(CodecError::MalformedPayload(format!(
            "expected {} fields, got {}",
            USER_PAYLOAD_FIELDS,
            fields.len()
        )));
    }

    Ok(UserIdentity {
        id: fields[0].to_string(),
        discriminator: fields[1].to_string(),
        avatar: fields[2].to_string(),
        username: fields[3].to_string(),
    })
}

/// Decode a standard-base64 wire field, naming the field on failure.
pub fn decode_base64(field: &'static str, value: &str) -> Result<Vec<u8>, CodecError> {
    STANDARD
        .decode(value)
        .map_err(|e| CodecError::InvalidBase64 {
            field,
            reason: e.to_string(),
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
