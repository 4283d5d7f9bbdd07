//! FlowML event stream client.
//!
//! Keeps a best-effort WebSocket connection to the FlowML control plane,
//! decodes the typed events it emits, forwards them to observers and a
//! broadcast feed, raises notifications for the ones a user should see,
//! and retries a bounded number of times after the connection drops.
//!
//! ```no_run
//! use flowml_stream::{StreamClient, StreamConfig};
//!
//! # async fn run() {
//! let client = StreamClient::builder(StreamConfig::default())
//!     .on_message(|event| println!("{} at {}", event.kind(), event.timestamp))
//!     .build();
//!
//! client.connect().await;
//! # }
//! ```

pub mod client;
pub mod config;
pub mod events;
pub mod messages;
pub mod notify;
pub mod reconnect;
pub mod state;

mod session;
mod supervisor;
mod transport;

pub use client::{StreamClient, StreamClientBuilder};
pub use config::{ConfigError, StreamConfig};
pub use events::ClientEvent;
pub use messages::{EventBody, FrameError, InboundEvent, OutboundMessage};
pub use reconnect::ReconnectPolicy;
pub use state::ConnectionState;
pub use transport::TransportError;
