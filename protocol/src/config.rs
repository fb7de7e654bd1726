//! # Protocol Configuration & Constants
//!
//! Every magic number in the handshake lives here. The endpoint values are
//! the only knobs a deployment normally touches; the rest are fixed by the
//! remote authority and changing them breaks the handshake.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// RSA modulus size for the session keypair. The authority rejects anything
/// smaller.
pub const RSA_KEY_BITS: usize = 2048;

/// SHA-256 digest length. The proof is the digest of the decrypted nonce.
pub const SHA256_DIGEST_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Payload Layout
// ---------------------------------------------------------------------------

/// Number of colon-separated fields in a decrypted user ticket:
/// `id:discriminator:avatar:username`.
pub const USER_PAYLOAD_FIELDS: usize = 4;

/// Separator used inside the decrypted user ticket.
pub const USER_PAYLOAD_SEPARATOR: char = ':';

// ---------------------------------------------------------------------------
// Authority Endpoint
// ---------------------------------------------------------------------------

/// Gateway protocol revision spoken by this crate.
pub const PROTOCOL_VERSION: u32 = 2;

/// WebSocket gateway of the remote authority, pinned to [`PROTOCOL_VERSION`].
pub const DEFAULT_GATEWAY_URL: &str = "wss://remote-auth-gateway.discord.gg/?v=2";

/// Web origin sent in the `Origin` header. The gateway closes the socket
/// immediately when this does not match.
pub const DEFAULT_ORIGIN: &str = "https://discord.com";

/// Domain the approver's app resolves scanned codes against.
pub const DEFAULT_AUTHORITY_DOMAIN: &str = "discord.com";

/// Path segment of the scannable URL: `https://<domain>/ra/<fingerprint>`.
pub const REMOTE_AUTH_PATH: &str = "ra";

/// Where and how to reach the remote authority.
///
/// This is process-level configuration; the state machine only ever sees
/// `domain` (to build the visual URL).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityConfig {
    /// Full `wss://` URL of the gateway.
    pub gateway_url: String,
    /// Value for the `Origin` request header.
    pub origin: String,
    /// Domain used in the scannable URL.
    pub domain: String,
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            origin: DEFAULT_ORIGIN.to_string(),
            domain: DEFAULT_AUTHORITY_DOMAIN.to_string(),
        }
    }
}
