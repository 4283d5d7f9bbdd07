#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use flowml_core::notification::Notification;
use flowml_events::Notifier;
use flowml_stream::{ConnectionState, StreamClient, StreamConfig};

/// Upper bound for any single wait in these tests.
pub const WAIT: Duration = Duration::from_secs(5);

/// Install a test-writer tracing subscriber once per test binary.
///
/// Honours `RUST_LOG`; defaults to debug output for the stream crate.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flowml_stream=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Client config pointing at `addr` with a short fixed retry delay.
pub fn test_config(addr: SocketAddr, max_attempts: u32, interval: Duration) -> StreamConfig {
    StreamConfig {
        url: format!("ws://{addr}/ws"),
        reconnect_interval: interval,
        max_reconnect_attempts: max_attempts,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// WebSocket test server
// ---------------------------------------------------------------------------

/// Server side of one accepted WebSocket connection.
pub struct ServerConn {
    pub ws: WebSocketStream<TcpStream>,
}

impl ServerConn {
    /// Next text frame from the client, skipping control frames.
    pub async fn recv_text(&mut self) -> String {
        loop {
            let msg = tokio::time::timeout(WAIT, self.ws.next())
                .await
                .expect("timed out waiting for client frame")
                .expect("client closed the stream")
                .expect("receive error");
            match msg {
                Message::Text(text) => return text,
                Message::Ping(_) | Message::Pong(_) => continue,
                other => panic!("Expected text frame, got {other:?}"),
            }
        }
    }

    pub async fn recv_json(&mut self) -> serde_json::Value {
        let text = self.recv_text().await;
        serde_json::from_str(&text).expect("client sent invalid JSON")
    }

    pub async fn send_text(&mut self, text: &str) {
        self.ws
            .send(Message::Text(text.to_string()))
            .await
            .expect("server send failed");
    }

    pub async fn close(mut self) {
        let _ = self.ws.close(None).await;
    }

    /// Wait until the client closes its side.
    pub async fn expect_closed(mut self) {
        let closed = tokio::time::timeout(WAIT, async {
            while let Some(msg) = self.ws.next().await {
                match msg {
                    Ok(Message::Close(_)) | Err(_) => return,
                    Ok(_) => continue,
                }
            }
        })
        .await;
        assert!(closed.is_ok(), "client did not close the connection");
    }
}

/// In-process WebSocket server on a loopback port.
///
/// Every accepted connection is handed to the test through
/// [`TestServer::accept`].
pub struct TestServer {
    pub addr: SocketAddr,
    accepted: Arc<AtomicUsize>,
    conns: mpsc::UnboundedReceiver<ServerConn>,
}

impl TestServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(AtomicUsize::new(0));
        let (tx, conns) = mpsc::unbounded_channel();

        let counter = Arc::clone(&accepted);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let ws = match tokio_tungstenite::accept_async(stream).await {
                    Ok(ws) => ws,
                    Err(_) => continue,
                };
                counter.fetch_add(1, Ordering::SeqCst);
                if tx.send(ServerConn { ws }).is_err() {
                    break;
                }
            }
        });

        Self {
            addr,
            accepted,
            conns,
        }
    }

    /// Next accepted connection.
    pub async fn accept(&mut self) -> ServerConn {
        tokio::time::timeout(WAIT, self.conns.recv())
            .await
            .expect("timed out waiting for a client connection")
            .expect("server task stopped")
    }

    /// Accept the next connection and consume its handshake frame.
    pub async fn accept_after_handshake(&mut self) -> ServerConn {
        let mut conn = self.accept().await;
        let handshake = conn.recv_json().await;
        assert_eq!(handshake["type"], "handshake");
        conn
    }

    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }
}

/// TCP listener that drops every connection before the WebSocket
/// handshake, so each client attempt fails to open.
pub struct RefusingServer {
    pub addr: SocketAddr,
    attempts: Arc<AtomicUsize>,
}

impl RefusingServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let attempts = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&attempts);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                drop(stream);
            }
        });

        Self { addr, attempts }
    }

    /// Connection attempts seen so far.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Waiting helpers
// ---------------------------------------------------------------------------

/// Poll `condition` every 10 ms until it holds or [`WAIT`] elapses.
pub async fn wait_until<F>(mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    tokio::time::timeout(WAIT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .is_ok()
}

/// Wait until the client reports `state`.
pub async fn wait_for_state(client: &StreamClient, state: ConnectionState) {
    let mut rx = client.watch_status();
    let reached = tokio::time::timeout(WAIT, rx.wait_for(|s| *s == state))
        .await
        .map(|r| r.is_ok())
        .unwrap_or(false);
    assert!(
        reached,
        "client never reached {state}, currently {}",
        client.status()
    );
}

// ---------------------------------------------------------------------------
// Recording notifier
// ---------------------------------------------------------------------------

/// Notifier that records everything it is handed.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    seen: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen.lock().unwrap().push(notification);
    }
}

// ---------------------------------------------------------------------------
// Client events
// ---------------------------------------------------------------------------

/// Wait for the next client event matching `pred`, discarding others.
pub async fn next_event_matching<F>(
    rx: &mut tokio::sync::broadcast::Receiver<flowml_stream::ClientEvent>,
    mut pred: F,
) -> flowml_stream::ClientEvent
where
    F: FnMut(&flowml_stream::ClientEvent) -> bool,
{
    tokio::time::timeout(WAIT, async {
        loop {
            match rx.recv().await {
                Ok(event) if pred(&event) => return event,
                Ok(_) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(e) => panic!("event channel closed: {e}"),
            }
        }
    })
    .await
    .expect("timed out waiting for client event")
}

/// Thread-safe counter for observer callbacks.
#[derive(Clone, Default)]
pub struct CallCount(Arc<AtomicUsize>);

impl CallCount {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}
