//! # Handshake State Machine
//!
//! One [`HandshakeSession`] per connection. It owns the session keypair and
//! advances strictly forward:
//!
//! ```text
//! AwaitingHello ─hello─► AwaitingNonceProof ─nonce_proof─► AwaitingFingerprint
//!   ─pending_remote_init─► AwaitingTicket ─pending_ticket─► AwaitingLogin
//!   ─pending_login─► Done
//!
//! any fatal error ─► Abandoned
//! ```
//!
//! Only the operation the current state expects is acted on. Everything
//! else (unknown ops, replays of earlier ops, ops that skip ahead) is dropped
//! without output and without a state change. `Done` and `Abandoned` drop
//! everything.
//!
//! Each call to [`HandshakeSession::handle`] yields at most one outbound
//! frame and at most one [`SideEffect`]. The session never does I/O itself.

use std::fmt;

use serde_json::{Map, Value};
use uuid::Uuid;

use super::error::HandshakeError;
use super::messages::{InboundMessage, OutboundMessage};
use crate::codec::{self, UserIdentity};
use crate::config::DEFAULT_AUTHORITY_DOMAIN;
use crate::crypto::SessionKeys;

// ---------------------------------------------------------------------------
// States and Effects
// ---------------------------------------------------------------------------

/// Where a session is in the handshake.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandshakeState {
    /// Connected, waiting for the authority to greet us.
    AwaitingHello,
    /// `init` sent, waiting for the encrypted nonce.
    AwaitingNonceProof,
    /// Proof sent, waiting for the fingerprint.
    AwaitingFingerprint,
    /// Code rendered, waiting for the approver to scan it.
    AwaitingTicket,
    /// Identity received, waiting for the approver to confirm.
    AwaitingLogin,
    /// Terminal: the approver confirmed.
    Done,
    /// Terminal: a fatal error occurred. Nothing further is processed.
    Abandoned,
}

impl HandshakeState {
    /// The inbound operation this state acts on, if any.
    pub fn expected_op(&self) -> Option<&'static str> {
        match self {
            HandshakeState::AwaitingHello => Some("hello"),
            HandshakeState::AwaitingNonceProof => Some("nonce_proof"),
            HandshakeState::AwaitingFingerprint => Some("pending_remote_init"),
            HandshakeState::AwaitingTicket => Some("pending_ticket"),
            HandshakeState::AwaitingLogin => Some("pending_login"),
            HandshakeState::Done | HandshakeState::Abandoned => None,
        }
    }

    /// True for `Done` and `Abandoned`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, HandshakeState::Done | HandshakeState::Abandoned)
    }
}

impl fmt::Display for HandshakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandshakeState::AwaitingHello => "awaiting_hello",
            HandshakeState::AwaitingNonceProof => "awaiting_nonce_proof",
            HandshakeState::AwaitingFingerprint => "awaiting_fingerprint",
            HandshakeState::AwaitingTicket => "awaiting_ticket",
            HandshakeState::AwaitingLogin => "awaiting_login",
            HandshakeState::Done => "done",
            HandshakeState::Abandoned => "abandoned",
        };
        f.write_str(name)
    }
}

/// Something the caller must do or show, other than sending a frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SideEffect {
    /// Show this URL as a scannable code to the approver.
    RenderCode { url: String },
    /// The approver scanned the code; this is their account.
    IdentityReceived(UserIdentity),
    /// The approver confirmed the login. The payload is the authority's,
    /// uninterpreted.
    LoginApproved { payload: Map<String, Value> },
}

/// The result of handling one inbound frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Transition {
    /// Frame to send back, if any.
    pub outbound: Option<OutboundMessage>,
    /// Effect to surface to the caller, if any.
    pub effect: Option<SideEffect>,
}

impl Transition {
    fn none() -> Self {
        Self::default()
    }

    fn send(message: OutboundMessage) -> Self {
        Self {
            outbound: Some(message),
            effect: None,
        }
    }

    fn effect(effect: SideEffect) -> Self {
        Self {
            outbound: None,
            effect: Some(effect),
        }
    }

    /// True when the frame was ignored.
    pub fn is_empty(&self) -> bool {
        self.outbound.is_none() && self.effect.is_none()
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One handshake attempt over one connection.
///
/// Created with a freshly generated keypair and dropped when the connection
/// closes or a terminal state is reached. Never shared between connections.
///
/// # Examples
///
/// ```no_run
/// use ra_protocol::handshake::{HandshakeSession, HandshakeState, InboundMessage};
///
/// let mut session = HandshakeSession::new().unwrap();
/// let transition = session
///     .handle(InboundMessage::Hello { heartbeat_interval: None, timeout_ms: None })
///     .unwrap();
/// assert!(transition.outbound.is_some());
/// assert_eq!(session.state(), HandshakeState::AwaitingNonceProof);
/// ```
#[derive(Debug)]
pub struct HandshakeSession {
    /// Correlation id for logs. Never sent on the wire.
    session_id: Uuid,
    /// The session keypair. Generated once in the constructor.
    keys: SessionKeys,
    /// Current state.
    state: HandshakeState,
    /// Server-issued fingerprint. Set once, on `pending_remote_init`.
    fingerprint: Option<String>,
    /// Domain for the scannable URL.
    authority_domain: String,
}

impl HandshakeSession {
    /// Start a session against the default authority domain, generating the
    /// session keypair.
    pub fn new() -> Result<Self, HandshakeError> {
        Self::with_domain(DEFAULT_AUTHORITY_DOMAIN)
    }

    /// Start a session whose scannable URL points at `domain`.
    pub fn with_domain(domain: impl Into<String>) -> Result<Self, HandshakeError> {
        let keys = SessionKeys::generate()?;
        let session_id = Uuid::new_v4();
        tracing::info!(%session_id, "handshake session created");

        Ok(Self {
            session_id,
            keys,
            state: HandshakeState::AwaitingHello,
            fingerprint: None,
            authority_domain: domain.into(),
        })
    }

    /// Log correlation id.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Current state.
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// The fingerprint, once `pending_remote_init` has been handled.
    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    /// SPKI DER of the session public key.
    pub fn public_key_der(&self) -> Result<Vec<u8>, HandshakeError> {
        Ok(self.keys.export_public_key()?)
    }

    /// Mark the session dead. Used when the transport fails underneath it.
    pub fn abandon(&mut self) {
        if self.state != HandshakeState::Abandoned {
            tracing::warn!(
                session_id = %self.session_id,
                state = %self.state,
                "handshake abandoned"
            );
            self.state = HandshakeState::Abandoned;
        }
    }

    /// Decode one text frame and handle it.
    ///
    /// Only the `op` tag is read up front. The rest of the frame is decoded
    /// only when that op is the one the current state expects, so a stale or
    /// unknown frame is dropped whatever its fields look like. Frames that
    /// are not JSON at all are fatal.
    pub fn handle_frame(&mut self, text: &str) -> Result<Transition, HandshakeError> {
        let frame: Value = match serde_json::from_str(text) {
            Ok(frame) => frame,
            Err(e) => return Err(self.fail(e.into())),
        };

        match frame.get("op").and_then(Value::as_str) {
            Some(op) if Some(op) == self.state.expected_op() => {}
            op => {
                self.log_ignored(op.unwrap_or("<none>"));
                return Ok(Transition::none());
            }
        }

        match InboundMessage::from_value(frame) {
            Ok(message) => self.handle(message),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Handle one inbound message.
    ///
    /// # Errors
    ///
    /// Any error moves the session to [`HandshakeState::Abandoned`]:
    /// [`HandshakeError::Decryption`] when a ciphertext does not decrypt
    /// under our key, [`HandshakeError::MalformedPayload`] when the user
    /// ticket does not parse, [`HandshakeError::Encoding`] when a ciphertext
    /// field is not base64.
    pub fn handle(&mut self, message: InboundMessage) -> Result<Transition, HandshakeError> {
        self.step(message).map_err(|e| self.fail(e))
    }

    fn fail(&mut self, error: HandshakeError) -> HandshakeError {
        tracing::error!(
            session_id = %self.session_id,
            state = %self.state,
            error = %error,
            "handshake failed"
        );
        self.abandon();
        error
    }

    fn log_ignored(&self, op: &str) {
        tracing::debug!(
            session_id = %self.session_id,
            state = %self.state,
            op,
            expected = self.state.expected_op().unwrap_or("nothing"),
            "ignoring frame"
        );
    }

    fn step(&mut self, message: InboundMessage) -> Result<Transition, HandshakeError> {
        let transition = match (self.state, message) {
            (
                HandshakeState::AwaitingHello,
                InboundMessage::Hello {
                    heartbeat_interval,
                    timeout_ms,
                },
            ) => {
                tracing::debug!(?heartbeat_interval, ?timeout_ms, "hello received");
                let encoded_public_key = self.keys.encoded_public_key()?;
                self.advance(HandshakeState::AwaitingNonceProof);
                Transition::send(OutboundMessage::Init { encoded_public_key })
            }

            (
                HandshakeState::AwaitingNonceProof,
                InboundMessage::NonceProof { encrypted_nonce },
            ) => {
                let nonce = self.decrypt_field("encrypted_nonce", &encrypted_nonce)?;
                let proof = codec::derive_proof(&nonce);
                self.advance(HandshakeState::AwaitingFingerprint);
                Transition::send(OutboundMessage::NonceProof { proof })
            }

            (
                HandshakeState::AwaitingFingerprint,
                InboundMessage::PendingRemoteInit { fingerprint },
            ) => {
                let url = codec::visual_url_for(&self.authority_domain, &fingerprint);
                tracing::info!(session_id = %self.session_id, %fingerprint, "fingerprint received");
                self.fingerprint = Some(fingerprint);
                self.advance(HandshakeState::AwaitingTicket);
                Transition::effect(SideEffect::RenderCode { url })
            }

            (
                HandshakeState::AwaitingTicket,
                InboundMessage::PendingTicket {
                    encrypted_user_payload,
                },
            ) => {
                let plaintext =
                    self.decrypt_field("encrypted_user_payload", &encrypted_user_payload)?;
                let identity = codec::parse_user_identity(&plaintext)?;
                tracing::info!(
                    session_id = %self.session_id,
                    user_id = %identity.id,
                    username = %identity.username,
                    "approver identity received"
                );
                self.advance(HandshakeState::AwaitingLogin);
                Transition::effect(SideEffect::IdentityReceived(identity))
            }

            (HandshakeState::AwaitingLogin, InboundMessage::PendingLogin(payload)) => {
                self.advance(HandshakeState::Done);
                Transition::effect(SideEffect::LoginApproved { payload })
            }

            (_, message) => {
                self.log_ignored(message.op());
                Transition::none()
            }
        };

        Ok(transition)
    }

    fn advance(&mut self, next: HandshakeState) {
        tracing::debug!(
            session_id = %self.session_id,
            from = %self.state,
            to = %next,
            "state transition"
        );
        self.state = next;
    }

    fn decrypt_field(&self, field: &'static str, value: &str) -> Result<Vec<u8>, HandshakeError> {
        let ciphertext = codec::decode_base64(field, value)?;
        self.keys
            .decrypt(&ciphertext)
            .map_err(|_| HandshakeError::Decryption { field })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
