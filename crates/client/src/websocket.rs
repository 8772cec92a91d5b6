//! tokio-tungstenite implementation of the transport seam.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::transport::{close_code, Connector, Transport, TransportError, TransportFrame};

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Opens real WebSocket connections.
#[derive(Debug, Default, Clone, Copy)]
pub struct WsConnector;

/// A live WebSocket connection to the monitoring backend.
pub struct WsTransport {
    stream: WsStream,
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn Transport>, TransportError> {
        let (stream, _response) = connect_async(url).await.map_err(|e| {
            TransportError::Connection(format!("Failed to connect to {url}: {e}"))
        })?;

        tracing::info!(url = %url, "Connected to monitoring backend");
        Ok(Box::new(WsTransport { stream }))
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.stream
            .send(Message::Text(text))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<TransportFrame, TransportError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(TransportFrame::Text(text))),
                Ok(Message::Close(frame)) => {
                    let (code, reason) = frame.map_or_else(
                        || (close_code::NO_STATUS, String::new()),
                        |f| (u16::from(f.code), f.reason.into_owned()),
                    );
                    return Some(Ok(TransportFrame::Closed { code, reason }));
                }
                Ok(Message::Binary(_)) => {
                    tracing::trace!("Ignoring binary monitoring frame");
                }
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {
                    // Protocol-level ping/pong is answered by tungstenite.
                }
                Err(e) => return Some(Err(TransportError::Receive(e.to_string()))),
            }
        }
    }

    async fn close(&mut self) {
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: "client disconnect".into(),
        };
        if let Err(e) = self.stream.close(Some(frame)).await {
            tracing::debug!(error = %e, "Error while closing monitoring WebSocket");
        }
    }
}
