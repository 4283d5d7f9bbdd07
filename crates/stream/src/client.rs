//! The event stream client handle.
//!
//! [`StreamClient`] owns everything about one logical connection: the
//! connection state, the outbound half of the open socket (if any), the
//! reconnect counter, the last received event, and the task that drives
//! connect → read → retry. Clone it freely; all clones share that state.
//! Dropping the last clone tears the connection down the same way
//! [`StreamClient::disconnect`] does.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use flowml_core::types::iso_now;
use flowml_events::{Notifier, TracingNotifier};
use tokio::sync::{broadcast, mpsc, watch, Notify};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::config::StreamConfig;
use crate::events::ClientEvent;
use crate::messages::{parse_frame, InboundEvent, OutboundMessage};
use crate::notify::notification_for;
use crate::reconnect::ReconnectPolicy;
use crate::state::ConnectionState;
use crate::supervisor;

/// Broadcast channel capacity for client events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// How long `disconnect` waits for the connection task to exit.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Callback invoked with every decoded inbound event.
pub type MessageCallback = Arc<dyn Fn(&InboundEvent) + Send + Sync>;

/// Callback invoked on connect or unexpected disconnect.
pub type LifecycleCallback = Arc<dyn Fn() + Send + Sync>;

#[derive(Clone, Default)]
pub(crate) struct Observers {
    on_message: Option<MessageCallback>,
    on_connect: Option<LifecycleCallback>,
    on_disconnect: Option<LifecycleCallback>,
}

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// State shared between the client handle and its connection task.
pub(crate) struct Shared {
    pub(crate) config: StreamConfig,
    pub(crate) policy: ReconnectPolicy,
    observers: Observers,
    notifier: Arc<dyn Notifier>,
    state_tx: watch::Sender<ConnectionState>,
    event_tx: broadcast::Sender<ClientEvent>,
    /// Present exactly while a socket is open.
    outbound: Mutex<Option<mpsc::UnboundedSender<Message>>>,
    last_message: Mutex<Option<InboundEvent>>,
    reconnect_attempts: AtomicU32,
}

impl Shared {
    pub(crate) fn set_state(&self, state: ConnectionState) {
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            tracing::debug!(url = %self.config.url, from = %previous, to = %state, "Connection state changed");
            self.publish(ClientEvent::StateChanged {
                from: previous,
                to: state,
            });
        }
    }

    pub(crate) fn reconnect_attempts(&self) -> u32 {
        self.reconnect_attempts.load(Ordering::SeqCst)
    }

    pub(crate) fn set_reconnect_attempts(&self, attempts: u32) {
        self.reconnect_attempts.store(attempts, Ordering::SeqCst);
    }

    /// The socket opened: expose the writer, reset the counter and tell
    /// observers.
    pub(crate) fn handle_open(&self, writer: mpsc::UnboundedSender<Message>) {
        *lock(&self.outbound) = Some(writer);
        self.set_reconnect_attempts(0);
        self.set_state(ConnectionState::Connected);

        if let Some(on_connect) = &self.observers.on_connect {
            on_connect();
        }
        self.publish(ClientEvent::Connected);
    }

    /// Decode one inbound text frame and fan it out.
    ///
    /// Malformed frames are logged and dropped; they never touch the
    /// connection state or the observers.
    pub(crate) fn handle_text(&self, text: &str) {
        let event = match parse_frame(text) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, raw_message = %text, "Discarding malformed frame");
                return;
            }
        };

        if !event.is_known() {
            tracing::debug!(kind = event.kind(), "Received frame with unknown type");
        }

        *lock(&self.last_message) = Some(event.clone());

        if let Some(on_message) = &self.observers.on_message {
            on_message(&event);
        }
        if let Some(notification) = notification_for(&event) {
            self.notifier.notify(notification);
        }
        self.publish(ClientEvent::Message(event));
    }

    /// The socket went away without the owner asking for it.
    pub(crate) fn handle_unexpected_close(&self) {
        self.clear_transport();
        self.set_state(ConnectionState::Disconnected);

        if let Some(on_disconnect) = &self.observers.on_disconnect {
            on_disconnect();
        }
        self.publish(ClientEvent::Disconnected);
    }

    pub(crate) fn clear_transport(&self) {
        lock(&self.outbound).take();
    }

    pub(crate) fn publish(&self, event: ClientEvent) {
        // SendError only means nobody is subscribed.
        let _ = self.event_tx.send(event);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // Every critical section is a single assignment or read.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Configures observers, the notifier and the retry policy before the
/// client is created.
pub struct StreamClientBuilder {
    config: StreamConfig,
    policy: Option<ReconnectPolicy>,
    observers: Observers,
    notifier: Option<Arc<dyn Notifier>>,
}

impl StreamClientBuilder {
    fn new(config: StreamConfig) -> Self {
        Self {
            config,
            policy: None,
            observers: Observers::default(),
            notifier: None,
        }
    }

    /// Called with every decoded inbound event, in arrival order.
    pub fn on_message<F>(mut self, callback: F) -> Self
    where
        F: Fn(&InboundEvent) + Send + Sync + 'static,
    {
        self.observers.on_message = Some(Arc::new(callback));
        self
    }

    /// Called each time a socket opens.
    pub fn on_connect<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.observers.on_connect = Some(Arc::new(callback));
        self
    }

    /// Called each time a socket closes (or fails to open) without the
    /// owner calling [`StreamClient::disconnect`].
    pub fn on_disconnect<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.observers.on_disconnect = Some(Arc::new(callback));
        self
    }

    /// Where notifications go. Defaults to [`TracingNotifier`].
    pub fn notifier<N>(mut self, notifier: N) -> Self
    where
        N: Notifier + 'static,
    {
        self.notifier = Some(Arc::new(notifier));
        self
    }

    /// Override the fixed-delay policy derived from the config.
    pub fn reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn build(self) -> StreamClient {
        let policy = self
            .policy
            .unwrap_or_else(|| self.config.reconnect_policy());
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let shared = Arc::new(Shared {
            config: self.config,
            policy,
            observers: self.observers,
            notifier: self.notifier.unwrap_or_else(|| Arc::new(TracingNotifier)),
            state_tx,
            event_tx,
            outbound: Mutex::new(None),
            last_message: Mutex::new(None),
            reconnect_attempts: AtomicU32::new(0),
        });

        StreamClient {
            handle: Arc::new(ClientHandle {
                shared,
                cancel: CancellationToken::new(),
                supervisor: tokio::sync::Mutex::new(None),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// StreamClient
// ---------------------------------------------------------------------------

/// Handle to the running connection task.
struct Supervisor {
    /// Child of the client's master token.
    cancel: CancellationToken,
    /// Fires a pending retry immediately.
    wake: Arc<Notify>,
    task_handle: tokio::task::JoinHandle<()>,
}

struct ClientHandle {
    shared: Arc<Shared>,
    /// Master cancellation token, cancelled when the last handle drops.
    cancel: CancellationToken,
    supervisor: tokio::sync::Mutex<Option<Supervisor>>,
}

impl Drop for ClientHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.shared.clear_transport();
    }
}

/// Best-effort live connection to one control-plane endpoint.
///
/// No method returns an error for transport problems: failures show up
/// as [`ConnectionState`] transitions and as `false` from
/// [`send_message`](Self::send_message).
#[derive(Clone)]
pub struct StreamClient {
    handle: Arc<ClientHandle>,
}

impl StreamClient {
    /// Client with default observers and the [`TracingNotifier`].
    pub fn new(config: StreamConfig) -> Self {
        Self::builder(config).build()
    }

    pub fn builder(config: StreamConfig) -> StreamClientBuilder {
        StreamClientBuilder::new(config)
    }

    pub fn config(&self) -> &StreamConfig {
        &self.handle.shared.config
    }

    /// Start connecting.
    ///
    /// Does nothing if a socket is open or an attempt is in flight. If a
    /// retry is waiting out its delay, the retry runs now. Must be called
    /// from within a Tokio runtime.
    pub async fn connect(&self) {
        let mut slot = self.handle.supervisor.lock().await;

        if let Some(existing) = slot.as_ref() {
            if !existing.task_handle.is_finished() {
                tracing::debug!(url = %self.config().url, "Connection already managed");
                existing.wake.notify_waiters();
                return;
            }
        }

        let shared = Arc::clone(&self.handle.shared);
        shared.set_reconnect_attempts(0);
        // Set before spawning so callers observe the attempt immediately.
        shared.set_state(ConnectionState::Connecting);

        let cancel = self.handle.cancel.child_token();
        let wake = Arc::new(Notify::new());
        let task_handle = tokio::spawn(supervisor::run(shared, cancel.clone(), Arc::clone(&wake)));

        *slot = Some(Supervisor {
            cancel,
            wake,
            task_handle,
        });
    }

    /// Close the connection and cancel any pending retry.
    ///
    /// Always leaves the client `disconnected`; safe to call repeatedly or
    /// before `connect`. The disconnect callback is not invoked.
    pub async fn disconnect(&self) {
        let supervisor = self.handle.supervisor.lock().await.take();

        if let Some(mut supervisor) = supervisor {
            supervisor.cancel.cancel();
            if tokio::time::timeout(SHUTDOWN_TIMEOUT, &mut supervisor.task_handle)
                .await
                .is_err()
            {
                tracing::warn!(url = %self.config().url, "Connection task did not stop in time, aborting");
                supervisor.task_handle.abort();
            }
        }

        self.handle.shared.clear_transport();
        self.handle.shared.set_state(ConnectionState::Disconnected);
    }

    /// Send a frame stamped with the current time.
    ///
    /// Returns `false` without side effects when no socket is open;
    /// nothing is queued for later.
    pub fn send_message(&self, message: OutboundMessage) -> bool {
        let outbound = lock(&self.handle.shared.outbound);
        let Some(writer) = outbound.as_ref() else {
            tracing::debug!(kind = %message.kind, "Not connected, message not sent");
            return false;
        };

        let text = match message.encode(&iso_now()) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, kind = %message.kind, "Failed to encode outbound message");
                return false;
            }
        };

        writer.send(Message::Text(text)).is_ok()
    }

    pub fn status(&self) -> ConnectionState {
        *self.handle.shared.state_tx.borrow()
    }

    /// Receiver that observes every state change from now on.
    pub fn watch_status(&self) -> watch::Receiver<ConnectionState> {
        self.handle.shared.state_tx.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.status().is_connected()
    }

    /// The most recent successfully decoded inbound event.
    pub fn last_message(&self) -> Option<InboundEvent> {
        lock(&self.handle.shared.last_message).clone()
    }

    /// Retries scheduled since the last successful connection.
    pub fn reconnect_attempts(&self) -> u32 {
        self.handle.shared.reconnect_attempts()
    }

    /// Subscribe to typed client events.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.handle.shared.event_tx.subscribe()
    }
}
