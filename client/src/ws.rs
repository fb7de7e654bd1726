//! # WebSocket Transport
//!
//! [`Transport`] over `tokio-tungstenite`. Text frames go to the handshake;
//! ping/pong are answered by tungstenite itself; binary frames are not part
//! of the protocol and are dropped.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use ra_protocol::config::AuthorityConfig;
use ra_protocol::handshake::{Transport, TransportError, TransportEvent};

/// A connected gateway socket.
pub struct WsTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsTransport {
    /// Open the gateway socket, sending the configured `Origin` header.
    pub async fn connect(authority: &AuthorityConfig) -> Result<Self, TransportError> {
        let mut request = authority
            .gateway_url
            .as_str()
            .into_client_request()
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        let origin = HeaderValue::from_str(&authority.origin)
            .map_err(|e| TransportError::Connect(format!("invalid origin: {}", e)))?;
        request.headers_mut().insert("Origin", origin);

        tracing::info!(
            url = %authority.gateway_url,
            origin = %authority.origin,
            "connecting to gateway"
        );
        let (stream, response) = connect_async(request)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        tracing::debug!(status = %response.status(), "gateway connected");

        Ok(Self { stream })
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        self.stream
            .send(Message::Text(text))
            .await
            .map_err(|e| TransportError::Io(e.to_string()))
    }

    async fn recv(&mut self) -> Result<TransportEvent, TransportError> {
        loop {
            let message = match self.stream.next().await {
                Some(Ok(message)) => message,
                Some(Err(e)) => return Err(TransportError::Io(e.to_string())),
                None => {
                    return Ok(TransportEvent::Closed {
                        code: None,
                        reason: "stream ended".to_string(),
                    })
                }
            };
            if let Some(event) = classify(message) {
                return Ok(event);
            }
        }
    }
}

/// Map a websocket message onto a transport event; `None` for frames the
/// handshake never sees.
fn classify(message: Message) -> Option<TransportEvent> {
    match message {
        Message::Text(text) => Some(TransportEvent::Message(text)),
        Message::Close(frame) => {
            let (code, reason) = match frame {
                Some(frame) => (Some(u16::from(frame.code)), frame.reason.into_owned()),
                None => (None, String::new()),
            };
            Some(TransportEvent::Closed { code, reason })
        }
        Message::Binary(_) | Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {
            tracing::trace!("dropping non-text frame");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;
    use tokio_tungstenite::accept_hdr_async;
    use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
    use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
    use tokio_tungstenite::tungstenite::protocol::CloseFrame;

    #[test]
    fn classify_maps_text_and_close() {
        assert_eq!(
            classify(Message::Text("{}".to_string())),
            Some(TransportEvent::Message("{}".to_string()))
        );
        assert_eq!(
            classify(Message::Close(Some(CloseFrame {
                code: CloseCode::from(4003),
                reason: "timeout".into(),
            }))),
            Some(TransportEvent::Closed {
                code: Some(4003),
                reason: "timeout".to_string()
            })
        );
        assert_eq!(
            classify(Message::Close(None)),
            Some(TransportEvent::Closed {
                code: None,
                reason: String::new()
            })
        );
        assert_eq!(classify(Message::Ping(vec![1])), None);
        assert_eq!(classify(Message::Binary(vec![1, 2])), None);
    }

    #[tokio::test]
    async fn talks_to_a_local_gateway() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (origin_tx, origin_rx) = oneshot::channel::<Option<String>>();

        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut ws = accept_hdr_async(
                socket,
                move |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
                    let origin = request
                        .headers()
                        .get("Origin")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    let _ = origin_tx.send(origin);
                    Ok(response)
                },
            )
            .await
            .unwrap();

            ws.send(Message::Text(r#"{"op":"hello"}"#.to_string()))
                .await
                .unwrap();
            let reply = ws.next().await.unwrap().unwrap();
            ws.send(Message::Ping(vec![9])).await.unwrap();
            ws.close(Some(CloseFrame {
                code: CloseCode::from(4003),
                reason: "timeout".into(),
            }))
            .await
            .unwrap();
            reply
        });

        let authority = AuthorityConfig {
            gateway_url: format!("ws://{}", addr),
            origin: "https://example.test".to_string(),
            domain: "example.test".to_string(),
        };
        let mut transport = WsTransport::connect(&authority).await.unwrap();

        assert_eq!(
            transport.recv().await.unwrap(),
            TransportEvent::Message(r#"{"op":"hello"}"#.to_string())
        );
        transport.send(r#"{"op":"init"}"#.to_string()).await.unwrap();
        assert_eq!(
            transport.recv().await.unwrap(),
            TransportEvent::Closed {
                code: Some(4003),
                reason: "timeout".to_string()
            }
        );

        assert_eq!(
            origin_rx.await.unwrap().as_deref(),
            Some("https://example.test")
        );
        assert_eq!(
            server.await.unwrap(),
            Message::Text(r#"{"op":"init"}"#.to_string())
        );
    }

    #[tokio::test]
    async fn connect_failure_is_reported() {
        let authority = AuthorityConfig {
            gateway_url: "not a url".to_string(),
            ..AuthorityConfig::default()
        };
        assert!(matches!(
            WsTransport::connect(&authority).await,
            Err(TransportError::Connect(_))
        ));
    }
}
