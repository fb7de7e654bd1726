//! # Wire Messages
//!
//! Every frame is a single JSON object with an `op` field naming the
//! operation. Field names are the authority's, byte for byte.
//!
//! ```text
//! ← {"op":"hello","heartbeat_interval":41250,"timeout_ms":120000}
//! → {"op":"init","encoded_public_key":"MIIBIjAN..."}
//! ← {"op":"nonce_proof","encrypted_nonce":"<base64>"}
//! → {"op":"nonce_proof","proof":"<base64url, unpadded>"}
//! ← {"op":"pending_remote_init","fingerprint":"<opaque>"}
//! ← {"op":"pending_ticket","encrypted_user_payload":"<base64>"}
//! ← {"op":"pending_login", ...}
//! ```
//!
//! Operations outside this set decode to [`InboundMessage::Unrecognized`]
//! instead of failing, so the session can ignore them.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::error::HandshakeError;

/// A frame received from the authority.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum InboundMessage {
    /// Connection accepted. The timing hints are informational only; the
    /// core never sends anything proactively. A hint that is not a
    /// non-negative number reads as `None`.
    Hello {
        #[serde(
            default,
            deserialize_with = "lenient_millis",
            skip_serializing_if = "Option::is_none"
        )]
        heartbeat_interval: Option<u64>,
        #[serde(
            default,
            deserialize_with = "lenient_millis",
            skip_serializing_if = "Option::is_none"
        )]
        timeout_ms: Option<u64>,
    },

    /// A nonce encrypted under our public key.
    NonceProof { encrypted_nonce: String },

    /// Proof accepted. `fingerprint` goes into the scannable URL.
    PendingRemoteInit { fingerprint: String },

    /// The approver scanned the code. Their identity, encrypted to us.
    PendingTicket { encrypted_user_payload: String },

    /// The approver confirmed. The payload is kept opaque.
    PendingLogin(Map<String, Value>),

    /// Any operation this client does not know about.
    #[serde(other)]
    Unrecognized,
}

impl InboundMessage {
    /// Decode one text frame.
    ///
    /// # Errors
    ///
    /// [`HandshakeError::MalformedFrame`] if the text is not JSON, has no
    /// `op`, or a known `op` is missing a required field.
    pub fn decode(text: &str) -> Result<Self, HandshakeError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Decode an already parsed frame. Same errors as [`InboundMessage::decode`].
    pub fn from_value(frame: Value) -> Result<Self, HandshakeError> {
        Ok(serde_json::from_value(frame)?)
    }

    /// The wire name of this operation, for logging.
    pub fn op(&self) -> &'static str {
        match self {
            InboundMessage::Hello { .. } => "hello",
            InboundMessage::NonceProof { .. } => "nonce_proof",
            InboundMessage::PendingRemoteInit { .. } => "pending_remote_init",
            InboundMessage::PendingTicket { .. } => "pending_ticket",
            InboundMessage::PendingLogin(_) => "pending_login",
            InboundMessage::Unrecognized => "unrecognized",
        }
    }
}

fn lenient_millis<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let hint = Option::<Value>::deserialize(deserializer)?;
    Ok(hint.and_then(|v| {
        v.as_u64()
            .or_else(|| v.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64))
    }))
}

/// A frame sent to the authority.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Our public key: standard base64 of the SPKI DER.
    Init { encoded_public_key: String },

    /// The nonce proof: unpadded base64url of SHA-256(nonce).
    NonceProof { proof: String },
}

impl OutboundMessage {
    /// Encode as a single JSON text frame.
    pub fn encode(&self) -> Result<String, HandshakeError> {
        Ok(serde_json::to_string(self)?)
    }

    /// The wire name of this operation, for logging.
    pub fn op(&self) -> &'static str {
        match self {
            OutboundMessage::Init { .. } => "init",
            OutboundMessage::NonceProof { .. } => "nonce_proof",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
