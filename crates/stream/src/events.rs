//! Typed events broadcast by the stream client.
//!
//! Subscribe with [`StreamClient::subscribe`](crate::StreamClient::subscribe).
//! Events are sent in the order the client observes them, so for a
//! single connection `Connected` precedes that connection's messages,
//! which precede its `Disconnected`.

use std::time::Duration;

use crate::messages::InboundEvent;
use crate::state::ConnectionState;

#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// The connection state moved from `from` to `to`. Sent for every
    /// transition, unlike the coalescing [`watch_status`] receiver.
    ///
    /// [`watch_status`]: crate::StreamClient::watch_status
    StateChanged {
        from: ConnectionState,
        to: ConnectionState,
    },

    /// The socket opened and the handshake is about to be sent.
    Connected,

    /// The socket closed without the owner asking for it.
    Disconnected,

    /// A decoded inbound frame.
    Message(InboundEvent),

    /// A retry was scheduled after an unexpected closure.
    ReconnectScheduled {
        /// Retries scheduled since the last successful connection,
        /// including this one.
        attempt: u32,
        delay: Duration,
    },
}
