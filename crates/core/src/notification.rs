//! User-facing notification values.
//!
//! A [`Notification`] is what the event stream client hands to a
//! notifier when an inbound event deserves the user's attention. How
//! it is rendered (toast, log line, tray popup) is up to the notifier.

use serde::{Deserialize, Serialize};

/// Visual severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationLevel {
    /// Map a free-form level string onto a severity.
    ///
    /// Only `success`, `error` and `warning` are recognised; anything
    /// else (including an empty string) is informational.
    pub fn from_level(level: &str) -> Self {
        match level {
            "success" => Self::Success,
            "error" => Self::Error,
            "warning" => Self::Warning,
            _ => Self::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single notification: severity, headline and body text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn new(
        level: NotificationLevel,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            level,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, title, description)
    }

    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, title, description)
    }

    pub fn warning(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Warning, title, description)
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, title, description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_levels_map_to_their_severity() {
        assert_eq!(NotificationLevel::from_level("success"), NotificationLevel::Success);
        assert_eq!(NotificationLevel::from_level("error"), NotificationLevel::Error);
        assert_eq!(NotificationLevel::from_level("warning"), NotificationLevel::Warning);
    }

    #[test]
    fn unknown_levels_default_to_info() {
        assert_eq!(NotificationLevel::from_level("info"), NotificationLevel::Info);
        assert_eq!(NotificationLevel::from_level("critical"), NotificationLevel::Info);
        assert_eq!(NotificationLevel::from_level(""), NotificationLevel::Info);
    }

    #[test]
    fn level_serializes_lowercase() {
        let n = Notification::warning("Low Memory Warning", "Worker-01 memory usage at 85%");
        let json = serde_json::to_value(&n).expect("serialization should succeed");
        assert_eq!(json["level"], "warning");
        assert_eq!(json["title"], "Low Memory Warning");
    }
}
