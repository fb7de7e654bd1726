//! # Remote-Auth Handshake
//!
//! The initiator's side of the QR login flow. Every step is a reaction to a
//! frame from the authority; the initiator never speaks first.
//!
//! ```text
//!   ┌───────────┐                               ┌───────────┐
//!   │ Initiator │                               │ Authority │
//!   └─────┬─────┘                               └─────┬─────┘
//!         │  hello                                    │
//!         │◄──────────────────────────────────────────┤
//!         │  init (encoded_public_key)                │
//!         ├──────────────────────────────────────────►│
//!         │  nonce_proof (encrypted_nonce)            │
//!         │◄──────────────────────────────────────────┤
//!         │  nonce_proof (proof)                      │
//!         ├──────────────────────────────────────────►│
//!         │  pending_remote_init (fingerprint)        │
//!         │◄──────────────────────────────────────────┤   ──► render https://<domain>/ra/<fingerprint>
//!         │                                           │
//!         │           ... approver scans ...          │
//!         │                                           │
//!         │  pending_ticket (encrypted_user_payload)  │
//!         │◄──────────────────────────────────────────┤   ──► surface UserIdentity
//!         │  pending_login                            │
//!         │◄──────────────────────────────────────────┤   ──► surface approval
//! ```
//!
//! ## Layout
//!
//! - `messages`: JSON frames in both directions, tagged by `op`.
//! - `session`: the synchronous state machine. One frame in, at most one
//!   frame and one side effect out.
//! - `transport`: the seams to the outside world: a duplex text channel and
//!   a visual code renderer.
//! - `driver`: async loop gluing a transport and renderer to a session.

pub mod driver;
pub mod messages;
pub mod session;
pub mod transport;

mod error;

pub use driver::{run_handshake, HandshakeOutcome};
pub use error::HandshakeError;
pub use messages::{InboundMessage, OutboundMessage};
pub use session::{HandshakeSession, HandshakeState, SideEffect, Transition};
pub use transport::{CodeRenderer, RenderError, Transport, TransportError, TransportEvent};
