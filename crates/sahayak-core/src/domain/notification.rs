//! Notification entity
//!
//! A short, user-facing message with a severity and a time-to-live.
//! A zero TTL means the notification stays until it is dismissed.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::NotificationId;

/// Default lifetime of a notification
pub const DEFAULT_NOTIFICATION_TTL: Duration = Duration::from_millis(5000);

/// Severity of a notification, used by views to pick icon and colour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// An ephemeral message shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub message: String,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
    /// Lifetime in milliseconds; `0` disables auto-expiry
    pub ttl_millis: u64,
}

impl Notification {
    pub fn new(
        message: impl Into<String>,
        severity: Severity,
        ttl: Duration,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            message: message.into(),
            severity,
            created_at,
            ttl_millis: u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_millis)
    }

    /// Returns true if the notification removes itself after its TTL
    pub fn expires(&self) -> bool {
        self.ttl_millis > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_ttl_never_expires() {
        let n = Notification::new("Saved", Severity::Success, Duration::ZERO, Utc::now());
        assert!(!n.expires());

        let n = Notification::new("Saved", Severity::Success, DEFAULT_NOTIFICATION_TTL, Utc::now());
        assert!(n.expires());
        assert_eq!(n.ttl(), Duration::from_millis(5000));
    }

    #[test]
    fn test_severity_display() {
        assert_eq!(Severity::Warning.to_string(), "warning");
        assert_eq!(Severity::default(), Severity::Info);
    }
}
