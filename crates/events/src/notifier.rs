//! The notification capability injected into the event stream client.

use std::sync::Arc;

use flowml_core::notification::{Notification, NotificationLevel};

/// Something that can present a [`Notification`] to the user.
///
/// Called synchronously from the connection task, so implementations
/// must not block; hand work off to a channel if rendering is slow.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn notify(&self, notification: Notification) {
        (**self).notify(notification)
    }
}

/// Notifier that emits every notification as a `tracing` event.
///
/// Error notifications log at `ERROR`, warnings at `WARN`, everything
/// else at `INFO`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        let Notification {
            level,
            title,
            description,
        } = notification;

        match level {
            NotificationLevel::Error => {
                tracing::error!(level = %level, description = %description, "{title}")
            }
            NotificationLevel::Warning => {
                tracing::warn!(level = %level, description = %description, "{title}")
            }
            NotificationLevel::Info | NotificationLevel::Success => {
                tracing::info!(level = %level, description = %description, "{title}")
            }
        }
    }
}
