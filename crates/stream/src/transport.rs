//! WebSocket transport for the stream client.

use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// The raw WebSocket stream for reading/writing frames.
pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Open a WebSocket connection to `url`.
pub(crate) async fn open(url: &str) -> Result<WsStream, TransportError> {
    let (ws_stream, _response) = connect_async(url)
        .await
        .map_err(|e| TransportError::Connection(format!("Failed to connect to {url}: {e}")))?;

    tracing::info!(url, "Connected to control plane");
    Ok(ws_stream)
}

/// Errors that can occur on the transport.
///
/// These never escape the client's public operations; the connection
/// task logs them and reflects them in the connection state.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to establish the WebSocket connection.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A protocol-level error on an already-established connection.
    #[error("Protocol error: {0}")]
    Protocol(#[from] tokio_tungstenite::tungstenite::Error),

    /// An outbound frame could not be serialized.
    #[error("Encode error: {0}")]
    Encode(#[from] serde_json::Error),
}
