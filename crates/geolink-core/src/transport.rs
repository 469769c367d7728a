//! Transport abstraction over the WebSocket link.
//!
//! The link manager talks to the server through the [`Transport`] and
//! [`TransportLink`] traits rather than a concrete socket type, so the
//! pipeline can be exercised against an in-memory mock (see
//! [`crate::mock::MockTransport`]). The production implementation,
//! [`WsTransport`], wraps tokio-tungstenite.
//!
//! Transport callbacks are folded into the [`TransportEvent`] enum and
//! delivered through a single [`TransportLink::next_event`] call, so
//! the owning component handles open/message/close/failure in one
//! place instead of scattered listener state.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;

use crate::error::Result;

/// Close code sent when the reporter voluntarily closes the link.
pub const NORMAL_CLOSURE: u16 = 1000;

/// Events produced by an established transport link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Inbound text frame. The pipeline logs and otherwise ignores
    /// these; no application-level inbound protocol is defined.
    Message(String),
    /// The peer closed the connection, or the stream ended.
    Closed {
        /// Close code, if the peer sent a close frame.
        code: Option<u16>,
        /// Close reason, possibly empty.
        reason: String,
    },
    /// The transport failed at the protocol or socket level.
    Failed(String),
}

/// Factory for outbound connections.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Open a connection to the given endpoint.
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn TransportLink>>;
}

/// An established, bidirectional link.
#[async_trait]
pub trait TransportLink: Send {
    /// Send a UTF-8 text frame. An error means the write was not
    /// accepted and the link should be considered broken.
    async fn send_text(&mut self, text: String) -> Result<()>;

    /// Wait for the next transport event. Must be cancel-safe so the
    /// owning event loop can select over it.
    async fn next_event(&mut self) -> TransportEvent;

    /// Close the link with code 1000 (normal closure). Best effort;
    /// errors during close are swallowed.
    async fn close(&mut self);
}

/// WebSocket transport backed by tokio-tungstenite.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsTransport;

impl WsTransport {
    /// Create a new WebSocket transport.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn TransportLink>> {
        let (stream, response) = connect_async(endpoint).await?;
        debug!(status = %response.status(), "WebSocket handshake complete");
        Ok(Box::new(WsLink { stream }))
    }
}

struct WsLink {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl TransportLink for WsLink {
    async fn send_text(&mut self, text: String) -> Result<()> {
        self.stream.send(Message::Text(text)).await?;
        Ok(())
    }

    async fn next_event(&mut self) -> TransportEvent {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return TransportEvent::Message(text),
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = match frame {
                        Some(frame) => (Some(frame.code.into()), frame.reason.into_owned()),
                        None => (None, String::new()),
                    };
                    return TransportEvent::Closed { code, reason };
                }
                // Pings are answered by tungstenite on the next write;
                // binary frames carry nothing we understand.
                Some(Ok(other)) => {
                    debug!(frame = ?other, "ignoring non-text frame");
                }
                Some(Err(e)) => return TransportEvent::Failed(e.to_string()),
                None => {
                    return TransportEvent::Closed {
                        code: None,
                        reason: "stream ended".to_string(),
                    };
                }
            }
        }
    }

    async fn close(&mut self) {
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: "".into(),
        };
        let _ = self.stream.close(Some(frame)).await;
    }
}
