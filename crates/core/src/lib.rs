//! Shared vocabulary for the FlowML client crates.
//!
//! Wire message type discriminators, the UTC timestamp type used across
//! the workspace, and the notification value types produced by the
//! event stream client.

pub mod message_types;
pub mod notification;
pub mod types;
