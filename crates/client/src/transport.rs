//! Transport seam between the connection manager and the network.
//!
//! [`Connector`] opens a [`Transport`]; the manager only ever sees text
//! frames and close notifications. [`crate::websocket`] provides the
//! tokio-tungstenite implementation.

use async_trait::async_trait;

/// WebSocket close codes the manager cares about.
pub mod close_code {
    /// Intentional shutdown. Suppresses automatic reconnect.
    pub const NORMAL: u16 = 1000;
    /// Peer closed without sending a status code.
    pub const NO_STATUS: u16 = 1005;
    /// Connection dropped without a close frame.
    pub const ABNORMAL: u16 = 1006;
}

/// A frame delivered by a [`Transport`].
#[derive(Debug, Clone, PartialEq)]
pub enum TransportFrame {
    Text(String),
    /// The peer closed the connection.
    Closed { code: u16, reason: String },
}

/// Errors raised by a [`Connector`] or [`Transport`].
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to establish the connection.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Failed to write a frame.
    #[error("Send error: {0}")]
    Send(String),

    /// Failed to read a frame from an established connection.
    #[error("Receive error: {0}")]
    Receive(String),
}

/// An open bidirectional text-frame connection.
#[async_trait]
pub trait Transport: Send {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    /// Next inbound frame. `None` once the underlying stream has ended
    /// without a close frame.
    async fn recv(&mut self) -> Option<Result<TransportFrame, TransportError>>;

    /// Send a normal-closure frame. Errors are swallowed; the connection
    /// is being discarded anyway.
    async fn close(&mut self);
}

/// Factory for [`Transport`]s.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Box<dyn Transport>, TransportError>;
}
