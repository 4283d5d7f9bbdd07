//! FlowML notification plumbing.
//!
//! - [`Notifier`]: the capability the event stream client calls when an
//!   inbound event deserves the user's attention.
//! - [`TracingNotifier`]: renders notifications as structured log events.
//! - [`NotificationCenter`]: in-memory notification inbox with
//!   read/unread bookkeeping and a broadcast feed of new entries.

pub mod center;
pub mod notifier;

pub use center::{format_relative, NotificationCenter, StoredNotification};
pub use notifier::{Notifier, TracingNotifier};
