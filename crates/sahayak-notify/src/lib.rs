//! Sahayak Notify - In-app notification center
//!
//! [`NotificationCenter`] keeps the list of notifications currently on
//! screen. Each notification with a non-zero TTL gets its own expiry task;
//! dismissing a notification aborts that task, and an expiry that fires
//! after a dismissal finds nothing to remove.
//!
//! ## Usage
//!
//! ```no_run
//! use sahayak_core::domain::Severity;
//! use sahayak_core::ports::INotificationSink;
//! use sahayak_notify::NotificationCenter;
//!
//! # async fn example() {
//! let center = NotificationCenter::new();
//! let mut events = center.subscribe();
//! let id = center.notify("Saved for offline use", Severity::Info);
//! center.dismiss(id);
//! # let _ = events.recv().await;
//! # }
//! ```

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use sahayak_core::domain::{Notification, NotificationId, Severity, DEFAULT_NOTIFICATION_TTL};
use sahayak_core::ports::INotificationSink;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Change to the notification list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    Added(Notification),
    Removed(NotificationId),
}

struct Inner {
    notifications: Mutex<Vec<Notification>>,
    expiry_tasks: DashMap<NotificationId, JoinHandle<()>>,
    events: broadcast::Sender<NotificationEvent>,
    default_ttl: Duration,
}

impl Inner {
    fn list(&self) -> MutexGuard<'_, Vec<Notification>> {
        self.notifications
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Removes `id` from the list; returns false if it was already gone
    fn remove(&self, id: NotificationId) -> bool {
        let removed = {
            let mut list = self.list();
            let before = list.len();
            list.retain(|n| n.id != id);
            list.len() != before
        };

        if removed {
            let _ = self.events.send(NotificationEvent::Removed(id));
        }
        removed
    }
}

/// Owner of the on-screen notifications
///
/// Cloning is cheap; clones share the same list.
#[derive(Clone)]
pub struct NotificationCenter {
    inner: Arc<Inner>,
}

impl NotificationCenter {
    /// Creates a center whose notifications last 5 seconds by default
    pub fn new() -> Self {
        Self::with_default_ttl(DEFAULT_NOTIFICATION_TTL)
    }

    pub fn with_default_ttl(default_ttl: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                notifications: Mutex::new(Vec::new()),
                expiry_tasks: DashMap::new(),
                events,
                default_ttl,
            }),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.inner.default_ttl
    }

    /// Appends a notification, scheduling its removal after `ttl`
    ///
    /// A zero `ttl` keeps the notification until it is dismissed. Expiry
    /// needs a Tokio runtime; outside one the notification is kept and a
    /// warning is logged.
    pub fn push(&self, message: &str, severity: Severity, ttl: Duration) -> NotificationId {
        let notification = Notification::new(message, severity, ttl, Utc::now());
        let id = notification.id;

        self.inner.list().push(notification.clone());
        debug!(%id, %severity, ttl_ms = ttl.as_millis() as u64, "Notification added");
        let _ = self.inner.events.send(NotificationEvent::Added(notification));

        if !ttl.is_zero() {
            self.schedule_expiry(id, ttl);
        }
        id
    }

    fn schedule_expiry(&self, id: NotificationId, ttl: Duration) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(%id, "No async runtime; notification will not expire on its own");
            return;
        };

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let handle = runtime.spawn(async move {
            tokio::time::sleep(ttl).await;
            if let Some(inner) = weak.upgrade() {
                inner.expiry_tasks.remove(&id);
                if inner.remove(id) {
                    debug!(%id, "Notification expired");
                }
            }
        });
        self.inner.expiry_tasks.insert(id, handle);

        // The task may already have run on another worker.
        if !self.inner.list().iter().any(|n| n.id == id) {
            self.inner.expiry_tasks.remove(&id);
        }
    }

    /// Removes a notification now and cancels its expiry
    ///
    /// Unknown or already removed ids are ignored.
    pub fn dismiss(&self, id: NotificationId) {
        if let Some((_, handle)) = self.inner.expiry_tasks.remove(&id) {
            handle.abort();
        }
        if self.inner.remove(id) {
            debug!(%id, "Notification dismissed");
        }
    }

    /// Removes every notification and cancels every pending expiry
    pub fn dismiss_all(&self) {
        self.cancel_expiry_tasks();

        let removed: Vec<NotificationId> = {
            let mut list = self.inner.list();
            list.drain(..).map(|n| n.id).collect()
        };
        for id in &removed {
            let _ = self.inner.events.send(NotificationEvent::Removed(*id));
        }
        debug!(count = removed.len(), "All notifications dismissed");
    }

    /// Cancels every pending expiry, leaving the list as it is
    pub fn shutdown(&self) {
        let cancelled = self.cancel_expiry_tasks();
        debug!(cancelled, "Notification center shut down");
    }

    fn cancel_expiry_tasks(&self) -> usize {
        let ids: Vec<NotificationId> = self.inner.expiry_tasks.iter().map(|e| *e.key()).collect();
        let mut cancelled = 0;
        for id in ids {
            if let Some((_, handle)) = self.inner.expiry_tasks.remove(&id) {
                handle.abort();
                cancelled += 1;
            }
        }
        cancelled
    }

    /// Snapshot of the current notifications in insertion order
    pub fn list(&self) -> Vec<Notification> {
        self.inner.list().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.list().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.list().is_empty()
    }

    /// Number of expiry tasks still waiting to fire
    pub fn pending_expiries(&self) -> usize {
        self.inner.expiry_tasks.len()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.inner.events.subscribe()
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl INotificationSink for NotificationCenter {
    fn notify_with_ttl(&self, message: &str, severity: Severity, ttl: Duration) -> NotificationId {
        self.push(message, severity, ttl)
    }

    fn notify(&self, message: &str, severity: Severity) -> NotificationId {
        self.push(message, severity, self.inner.default_ttl)
    }
}
