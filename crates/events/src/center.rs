//! In-memory notification inbox backed by a `tokio::sync::broadcast` feed.
//!
//! [`NotificationCenter`] keeps the most recent notifications (newest
//! first) with a per-entry read flag, and fans every newly stored entry
//! out to subscribers. It is designed to be shared via
//! `Arc<NotificationCenter>` and handed to the stream client as its
//! [`Notifier`].

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use flowml_core::notification::{Notification, NotificationLevel};
use flowml_core::types::Timestamp;
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::notifier::Notifier;

// ---------------------------------------------------------------------------
// StoredNotification
// ---------------------------------------------------------------------------

/// A notification as kept by the [`NotificationCenter`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredNotification {
    pub id: Uuid,
    pub level: NotificationLevel,
    pub title: String,
    pub description: String,
    /// When the notification was stored (UTC).
    pub created_at: Timestamp,
    pub read: bool,
}

impl StoredNotification {
    fn from_notification(notification: Notification, created_at: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            level: notification.level,
            title: notification.title,
            description: notification.description,
            created_at,
            read: false,
        }
    }
}

// ---------------------------------------------------------------------------
// NotificationCenter
// ---------------------------------------------------------------------------

/// Default number of notifications retained.
const DEFAULT_CAPACITY: usize = 100;

/// Buffer capacity for the broadcast feed.
const FEED_CAPACITY: usize = 256;

/// Bounded notification inbox.
///
/// When full, storing a new notification evicts the oldest one.
///
/// # Usage
///
/// ```rust
/// use flowml_core::notification::Notification;
/// use flowml_events::{NotificationCenter, Notifier};
///
/// let center = NotificationCenter::default();
/// center.notify(Notification::info("Worker Connected", "w1 joined the cluster"));
/// assert_eq!(center.unread_count(), 1);
/// ```
pub struct NotificationCenter {
    entries: Mutex<VecDeque<StoredNotification>>,
    capacity: usize,
    sender: broadcast::Sender<StoredNotification>,
}

impl NotificationCenter {
    /// Create a center retaining at most `capacity` notifications.
    ///
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
            sender,
        }
    }

    /// Store a notification and publish it to subscribers.
    ///
    /// Returns the stored entry (with its assigned id).
    pub fn push(&self, notification: Notification) -> StoredNotification {
        let stored = StoredNotification::from_notification(notification, chrono::Utc::now());

        {
            let mut entries = self.lock();
            entries.push_front(stored.clone());
            entries.truncate(self.capacity);
        }

        // SendError only means nobody is subscribed.
        let _ = self.sender.send(stored.clone());
        stored
    }

    /// All retained notifications, newest first.
    pub fn list(&self) -> Vec<StoredNotification> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn unread_count(&self) -> usize {
        self.lock().iter().filter(|n| !n.read).count()
    }

    /// Mark one notification as read. Returns `false` if `id` is unknown.
    pub fn mark_read(&self, id: Uuid) -> bool {
        match self.lock().iter_mut().find(|n| n.id == id) {
            Some(entry) => {
                entry.read = true;
                true
            }
            None => false,
        }
    }

    pub fn mark_all_read(&self) {
        for entry in self.lock().iter_mut() {
            entry.read = true;
        }
    }

    /// Remove one notification. Returns `false` if `id` is unknown.
    pub fn remove(&self, id: Uuid) -> bool {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|n| n.id != id);
        entries.len() != before
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Subscribe to every notification stored from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<StoredNotification> {
        self.sender.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<StoredNotification>> {
        // No critical section can leave the queue half-updated.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Notifier for NotificationCenter {
    fn notify(&self, notification: Notification) {
        let stored = self.push(notification);
        tracing::debug!(id = %stored.id, level = %stored.level, "Notification stored");
    }
}

// ---------------------------------------------------------------------------
// Relative time
// ---------------------------------------------------------------------------

/// Human-readable age of a notification, e.g. `5m ago`.
///
/// Under a minute (or a timestamp in the future) reads `Just now`;
/// then minutes, hours and days, each rounded down.
pub fn format_relative(then: Timestamp, now: Timestamp) -> String {
    let minutes = (now - then).num_minutes();
    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if minutes < 1440 {
        format!("{}h ago", minutes / 60)
    } else {
        format!("{}d ago", minutes / 1440)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
