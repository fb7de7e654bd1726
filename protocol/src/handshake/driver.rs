//! # Handshake Driver
//!
//! Pumps a [`Transport`] into a [`HandshakeSession`] until the approver
//! confirms or something fatal happens.
//!
//! The loop is plain: receive, hand to the session, send whatever
//! it returns, act on whatever effect it returns. No retries, no timeouts,
//! no reconnects. Cancelling is dropping the future (and with it the
//! transport).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::error::HandshakeError;
use super::session::{HandshakeSession, SideEffect};
use super::transport::{CodeRenderer, Transport, TransportError, TransportEvent};
use crate::codec::UserIdentity;

/// Everything a completed handshake produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HandshakeOutcome {
    /// Log correlation id of the session.
    pub session_id: Uuid,
    /// The fingerprint the approver scanned.
    pub fingerprint: String,
    /// The approver's account.
    pub identity: UserIdentity,
    /// The authority's `pending_login` payload, uninterpreted.
    pub approval: Map<String, Value>,
    /// When the approval arrived.
    pub completed_at: DateTime<Utc>,
}

/// Run `session` to completion over `transport`.
///
/// # Errors
///
/// Whatever the session rejects (see [`HandshakeSession::handle`]), plus
/// [`HandshakeError::Transport`] when the channel fails or closes before
/// `pending_login`, and [`HandshakeError::Render`] when the code cannot be
/// rendered. The session is abandoned in every error case.
pub async fn run_handshake<T, R>(
    session: &mut HandshakeSession,
    transport: &mut T,
    renderer: &mut R,
) -> Result<HandshakeOutcome, HandshakeError>
where
    T: Transport + ?Sized,
    R: CodeRenderer + ?Sized,
{
    let result = drive(session, transport, renderer).await;
    if result.is_err() {
        session.abandon();
    }
    result
}

async fn drive<T, R>(
    session: &mut HandshakeSession,
    transport: &mut T,
    renderer: &mut R,
) -> Result<HandshakeOutcome, HandshakeError>
where
    T: Transport + ?Sized,
    R: CodeRenderer + ?Sized,
{
    let session_id = session.session_id();
    let mut identity: Option<UserIdentity> = None;

    loop {
        let text = match transport.recv().await? {
            TransportEvent::Message(text) => text,
            TransportEvent::Closed { code, reason } => {
                tracing::warn!(
                    %session_id,
                    ?code,
                    %reason,
                    state = %session.state(),
                    "transport closed mid-handshake"
                );
                return Err(TransportError::Closed { code, reason }.into());
            }
        };

        let transition = session.handle_frame(&text)?;

        if let Some(outbound) = transition.outbound {
            tracing::debug!(%session_id, op = outbound.op(), "sending frame");
            transport.send(outbound.encode()?).await?;
        }

        match transition.effect {
            Some(SideEffect::RenderCode { url }) => {
                tracing::info!(%session_id, %url, "rendering visual code");
                renderer.render(&url)?;
            }
            Some(SideEffect::IdentityReceived(received)) => {
                identity = Some(received);
            }
            Some(SideEffect::LoginApproved { payload }) => {
                tracing::info!(%session_id, "login approved");
                // `Done` is only reachable after an identity was surfaced.
                let identity = identity.take().ok_or_else(|| {
                    HandshakeError::MalformedFrame("approval without identity".to_string())
                })?;
                let fingerprint = session.fingerprint().unwrap_or_default().to_string();
                return Ok(HandshakeOutcome {
                    session_id,
                    fingerprint,
                    identity,
                    approval: payload,
                    completed_at: Utc::now(),
                });
            }
            None => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handshake::HandshakeState;
    use std::collections::VecDeque;

    /// Replays a fixed script of events and records what was sent.
    struct ScriptedTransport {
        inbound: VecDeque<Result<TransportEvent, TransportError>>,
        sent: Vec<String>,
        send_error: Option<TransportError>,
    }

    impl ScriptedTransport {
        fn new(frames: &[&str]) -> Self {
            Self {
                inbound: frames
                    .iter()
                    .map(|f| Ok(TransportEvent::Message(f.to_string())))
                    .collect(),
                sent: Vec::new(),
                send_error: None,
            }
        }
    }

    #[async_trait::async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&mut self, text: String) -> Result<(), TransportError> {
            if let Some(err) = self.send_error.take() {
                return Err(err);
            }
            self.sent.push(text);
            Ok(())
        }

        async fn recv(&mut self) -> Result<TransportEvent, TransportError> {
            self.inbound.pop_front().unwrap_or(Ok(TransportEvent::Closed {
                code: Some(1000),
                reason: "script exhausted".to_string(),
            }))
        }
    }

    #[derive(Default)]
    struct RecordingRenderer {
        urls: Vec<String>,
    }

    impl CodeRenderer for RecordingRenderer {
        fn render(&mut self, url: &str) -> Result<(), crate::handshake::RenderError> {
            self.urls.push(url.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn close_before_done_is_transport_error() {
        let mut session = HandshakeSession::new().unwrap();
        let mut transport = ScriptedTransport::new(&[r#"{"op":"hello"}"#]);
        let mut renderer = RecordingRenderer::default();

        let err = run_handshake(&mut session, &mut transport, &mut renderer)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HandshakeError::Transport(TransportError::Closed { code: Some(1000), .. })
        ));
        assert_eq!(transport.sent.len(), 1);
        assert!(transport.sent[0].contains(r#""op":"init""#));
        assert_eq!(session.state(), HandshakeState::Abandoned);
        assert!(renderer.urls.is_empty());
    }

    #[tokio::test]
    async fn unknown_frames_do_not_produce_output() {
        let mut session = HandshakeSession::new().unwrap();
        let mut transport = ScriptedTransport::new(&[
            r#"{"op":"heartbeat_ack"}"#,
            r#"{"op":"pending_login"}"#,
        ]);
        let mut renderer = RecordingRenderer::default();

        let result = run_handshake(&mut session, &mut transport, &mut renderer).await;
        assert!(result.is_err());
        assert!(transport.sent.is_empty());
    }

    #[tokio::test]
    async fn recv_failure_abandons_session() {
        let mut session = HandshakeSession::new().unwrap();
        let mut transport = ScriptedTransport::new(&[r#"{"op":"hello"}"#]);
        transport
            .inbound
            .push_back(Err(TransportError::Io("connection reset".to_string())));
        let mut renderer = RecordingRenderer::default();

        let err = run_handshake(&mut session, &mut transport, &mut renderer)
            .await
            .unwrap_err();
        assert!(matches!(err, HandshakeError::Transport(TransportError::Io(_))));
        assert_eq!(transport.sent.len(), 1);
        assert_eq!(session.state(), HandshakeState::Abandoned);
    }

    #[tokio::test]
    async fn send_failure_abandons_session() {
        let mut session = HandshakeSession::new().unwrap();
        let mut transport = ScriptedTransport::new(&[r#"{"op":"hello"}"#]);
        transport.send_error = Some(TransportError::Io("broken pipe".to_string()));
        let mut renderer = RecordingRenderer::default();

        let err = run_handshake(&mut session, &mut transport, &mut renderer)
            .await
            .unwrap_err();
        assert!(matches!(err, HandshakeError::Transport(TransportError::Io(_))));
        assert!(transport.sent.is_empty());
        assert_eq!(session.state(), HandshakeState::Abandoned);
    }
}
