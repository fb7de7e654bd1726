//! Error types for the remote-auth handshake.
//!
//! Every variant is fatal to the session. Unknown operations are not errors
//! at all; the state machine drops them.

use thiserror::Error;

use super::transport::{RenderError, TransportError};
use crate::codec::CodecError;
use crate::crypto::KeyError;

/// Errors that can end a handshake.
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// The channel failed or closed before the handshake finished.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A ciphertext from the authority did not decrypt under our key.
    #[error("decryption of `{field}` failed")]
    Decryption {
        /// Wire field whose ciphertext was rejected.
        field: &'static str,
    },

    /// The decrypted user ticket did not parse.
    #[error("malformed user payload: {0}")]
    MalformedPayload(String),

    /// A frame was not a JSON object with the fields its `op` requires.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// A ciphertext field was not valid base64.
    #[error("invalid encoding: {0}")]
    Encoding(String),

    /// Key generation or export failed.
    #[error("key material error: {0}")]
    Key(KeyError),

    /// The visual code could not be produced.
    #[error("render error: {0}")]
    Render(#[from] RenderError),
}

impl From<CodecError> for HandshakeError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::MalformedPayload(reason) => HandshakeError::MalformedPayload(reason),
            e @ CodecError::InvalidBase64 { .. } => HandshakeError::Encoding(e.to_string()),
        }
    }
}

impl From<KeyError> for HandshakeError {
    fn from(err: KeyError) -> Self {
        HandshakeError::Key(err)
    }
}

impl From<serde_json::Error> for HandshakeError {
    fn from(err: serde_json::Error) -> Self {
        HandshakeError::MalformedFrame(err.to_string())
    }
}
