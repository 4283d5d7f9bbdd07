//! A single live WebSocket session.
//!
//! Sends the handshake, then loops until the socket closes, a transport
//! error occurs, or the client is cancelled. Inbound text frames go to
//! [`Shared::handle_text`] in arrival order; outbound frames queued by
//! `send_message` are written as they arrive on the writer channel.

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::client::Shared;
use crate::messages::encode_handshake;
use crate::transport::{TransportError, WsStream};

/// Drive one session to completion.
///
/// Returns `Ok` when the peer closed the socket, the stream ended, or the
/// session was cancelled; `Err` on a transport error.
pub(crate) async fn run(
    shared: &Shared,
    ws_stream: WsStream,
    cancel: &CancellationToken,
) -> Result<(), TransportError> {
    let (writer, outbound) = mpsc::unbounded_channel::<Message>();
    shared.handle_open(writer);

    let result = drive(shared, ws_stream, outbound, cancel).await;
    // The writer must not outlive the socket it feeds.
    shared.clear_transport();
    result
}

async fn drive(
    shared: &Shared,
    ws_stream: WsStream,
    mut outbound: mpsc::UnboundedReceiver<Message>,
    cancel: &CancellationToken,
) -> Result<(), TransportError> {
    let (mut sink, mut stream) = ws_stream.split();

    let handshake = encode_handshake(&shared.config.client_name, &shared.config.client_version)?;
    sink.send(Message::Text(handshake)).await?;
    tracing::debug!(client = %shared.config.client_name, "Handshake sent");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                if let Err(e) = sink.send(Message::Close(None)).await {
                    tracing::debug!(error = %e, "Close frame not delivered");
                }
                return Ok(());
            }
            Some(frame) = outbound.recv() => {
                sink.send(frame).await?;
            }
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        shared.handle_text(&text);
                    }
                    Some(Ok(Message::Binary(_))) => {
                        tracing::trace!("Ignoring binary frame");
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                        // Handled automatically by tungstenite.
                    }
                    Some(Ok(Message::Close(frame))) => {
                        tracing::info!(?frame, "Control plane closed WebSocket");
                        return Ok(());
                    }
                    Some(Ok(Message::Frame(_))) => {}
                    Some(Err(e)) => {
                        tracing::error!(error = %e, "WebSocket receive error");
                        return Err(e.into());
                    }
                    None => {
                        tracing::info!("WebSocket stream exhausted");
                        return Ok(());
                    }
                }
            }
        }
    }
}
