//! The two collaborators the handshake needs from the outside world.
//!
//! Neither carries protocol logic. A [`Transport`] moves complete text frames
//! in both directions; a [`CodeRenderer`] turns the scannable URL into
//! something a human can point a phone at.

use async_trait::async_trait;
use thiserror::Error;

/// Channel-level failures.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The peer closed the channel.
    #[error("connection closed (code {code:?}): {reason}")]
    Closed {
        /// Close code, when the peer sent one.
        code: Option<u16>,
        /// Close reason; empty when none was given.
        reason: String,
    },

    /// Connecting failed.
    #[error("connect failed: {0}")]
    Connect(String),

    /// Sending or receiving failed mid-stream.
    #[error("i/o failure: {0}")]
    Io(String),
}

/// What a transport can deliver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportEvent {
    /// One complete text frame.
    Message(String),
    /// The channel closed. No further events follow.
    Closed { code: Option<u16>, reason: String },
}

/// A duplex text channel to the authority.
///
/// Implementations deliver frames in arrival order, one complete frame per
/// [`TransportEvent::Message`].
#[async_trait]
pub trait Transport: Send {
    /// Send one text frame.
    async fn send(&mut self, text: String) -> Result<(), TransportError>;

    /// Wait for the next event. After `Closed` or an error the transport is
    /// spent.
    async fn recv(&mut self) -> Result<TransportEvent, TransportError>;
}

/// Failure to produce the visual code.
#[derive(Debug, Error)]
#[error("could not render visual code: {0}")]
pub struct RenderError(pub String);

/// Turns the scannable URL into a displayable artifact.
pub trait CodeRenderer {
    /// Render `url`. Called at most once per session.
    fn render(&mut self, url: &str) -> Result<(), RenderError>;
}
