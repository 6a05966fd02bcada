//! Notification sink port (driven/secondary port)
//!
//! Components that need to tell the user something (the sync queue at the
//! end of a drain) depend on this trait rather than on the notification
//! center itself.
//!
//! ## Design Notes
//!
//! - Fire-and-forget: the caller gets the id back but never waits for the
//!   user.
//! - Synchronous: raising a notification never suspends the caller.
//! - Implementations must not fail; a sink that cannot display anything
//!   should log and return an id anyway.

use std::time::Duration;

use crate::domain::{NotificationId, Severity};

/// Port trait for raising user-facing notifications
pub trait INotificationSink: Send + Sync {
    /// Raises a notification that expires after `ttl` (`Duration::ZERO`
    /// keeps it until dismissed)
    fn notify_with_ttl(&self, message: &str, severity: Severity, ttl: Duration) -> NotificationId;

    /// Raises a notification with the sink's default lifetime
    fn notify(&self, message: &str, severity: Severity) -> NotificationId;
}
