// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Remote-Auth Protocol: Initiator Library
//!
//! The client half of the QR-code login handshake. A short-lived initiator
//! generates an RSA keypair, proves it holds the private half to the remote
//! authority, shows a scannable URL to a second device that is already
//! logged in, and finally receives that account's identity once the
//! approver taps "yes".
//!
//! ## Architecture
//!
//! - **crypto**: The session keypair. Generated once, never exported,
//!   decrypts exactly two payloads (the nonce and the user ticket).
//! - **codec**: Stateless transforms: proof derivation, visual URL,
//!   identity parsing.
//! - **handshake**: Wire messages, the state machine, and an async driver
//!   that pumps a [`handshake::Transport`] into the machine.
//! - **config**: Key size, field counts, and the default authority
//!   endpoint.
//!
//! ## Design Philosophy
//!
//! 1. The state machine is a plain synchronous function of (state, frame).
//!    No sockets, no clocks, no globals. Unit tests feed it frames directly.
//! 2. One keypair per session. The private key never leaves [`crypto::SessionKeys`].
//! 3. Crypto failures abandon the session. There is nothing to retry.

pub mod codec;
pub mod config;
pub mod crypto;
pub mod handshake;

pub use codec::{build_visual_url, derive_proof, parse_user_identity, UserIdentity};
pub use crypto::SessionKeys;
pub use handshake::{
    run_handshake, HandshakeError, HandshakeOutcome, HandshakeSession, HandshakeState,
    InboundMessage, OutboundMessage, SideEffect, Transition,
};
