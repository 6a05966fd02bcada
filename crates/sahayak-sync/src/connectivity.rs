//! Connectivity monitor - turns raw online samples into edge events
//!
//! The [`ConnectivityMonitor`] sits between a sampler (the TCP probe loop,
//! or anything else that can push booleans into a channel) and the
//! [`SyncQueue`]. It remembers the last known state and reacts only to
//! changes.
//!
//! ## Flow
//!
//! ```text
//! probe loop ──→ mpsc::Receiver<bool> ──→ ConnectivityMonitor ──→ broadcast events
//!                                               │
//!                                    offline→online + pending
//!                                               │
//!                                        SyncQueue::drain()
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use sahayak_core::ports::IConnectivityProbe;

use crate::queue::{DrainOutcome, SyncQueue};

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// A change of connectivity state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    WentOnline,
    WentOffline,
}

/// Tracks the online state and emits one event per transition
pub struct ConnectivityMonitor {
    online: AtomicBool,
    events: broadcast::Sender<ConnectivityEvent>,
}

impl ConnectivityMonitor {
    /// Creates a monitor with a known initial state
    pub fn new(initially_online: bool) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        info!(online = initially_online, "Connectivity monitor created");
        Self {
            online: AtomicBool::new(initially_online),
            events,
        }
    }

    /// Creates a monitor whose initial state is sampled from `probe`
    pub async fn from_probe(probe: &dyn IConnectivityProbe) -> Self {
        Self::new(probe.is_online().await)
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }

    /// Records a sample, returning the transition it caused, if any
    ///
    /// A sample equal to the current state emits nothing.
    pub fn observe(&self, online: bool) -> Option<ConnectivityEvent> {
        let previous = self.online.swap(online, Ordering::AcqRel);
        if previous == online {
            return None;
        }

        let event = if online {
            ConnectivityEvent::WentOnline
        } else {
            ConnectivityEvent::WentOffline
        };
        info!(?event, "Connectivity changed");
        let _ = self.events.send(event);
        Some(event)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConnectivityEvent> {
        self.events.subscribe()
    }

    /// Main loop: consumes samples until cancelled or the channel closes
    ///
    /// Every sample first reloads the queue mirror. On an offline→online
    /// edge, drains `queue` if it holds pending items; while already online,
    /// drains only when the reload took over new items. The drain is awaited outside the `select!`, so cancellation
    /// never interrupts a drain half way.
    pub async fn run(
        &self,
        mut samples: mpsc::Receiver<bool>,
        queue: Arc<SyncQueue>,
        cancel: CancellationToken,
    ) {
        info!("Connectivity monitor starting");

        loop {
            let sample = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Cancellation requested, connectivity monitor stopping");
                    break;
                }
                sample = samples.recv() => match sample {
                    Some(sample) => sample,
                    None => {
                        info!("Sample channel closed, connectivity monitor stopping");
                        break;
                    }
                },
            };

            let event = self.observe(sample);
            let adopted = queue.reload().await;
            let should_drain = match event {
                Some(ConnectivityEvent::WentOnline) => true,
                Some(ConnectivityEvent::WentOffline) => false,
                // Still online: only work written by another process waits.
                None => sample && adopted > 0,
            };
            if !should_drain {
                continue;
            }

            if !queue.has_pending().await {
                debug!("Back online with nothing queued");
                continue;
            }

            match queue.drain().await {
                DrainOutcome::Completed(report) => {
                    debug!(attempted = report.attempted, "Reconnect drain finished")
                }
                outcome => debug!(?outcome, "Reconnect drain did not run"),
            }
        }

        info!("Connectivity monitor stopped");
    }
}
