//! Process-wide service container
//!
//! [`AppServices`] is built once at startup and handed around by `Arc`.
//! It owns the content repository, the notification center, the sync queue
//! and the connectivity monitor, plus the background tasks that connect
//! them. [`AppServices::shutdown`] stops those tasks and cancels pending
//! notification expiries.

use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use sahayak_core::config::Config;
use sahayak_core::ports::{IClock, IConnectivityProbe, INotificationSink, ISyncService};
use sahayak_core::store::PersistentStore;
use sahayak_core::usecases::ContentRepository;
use sahayak_notify::NotificationCenter;

use crate::connectivity::ConnectivityMonitor;
use crate::queue::SyncQueue;
use crate::SyncError;

const SAMPLE_CHANNEL_CAPACITY: usize = 32;

/// External collaborators the services are built from
pub struct AppDependencies {
    /// Store for user content, saved content, activity and likes
    pub store: PersistentStore,
    /// Store the sync queue is mirrored to
    pub queue_store: PersistentStore,
    pub sync_service: Arc<dyn ISyncService>,
    /// Samples the initial connectivity state
    pub probe: Arc<dyn IConnectivityProbe>,
    pub clock: Arc<dyn IClock>,
}

/// The offline layer, wired together
pub struct AppServices {
    pub store: PersistentStore,
    pub content: Arc<ContentRepository>,
    pub notifications: NotificationCenter,
    pub queue: Arc<SyncQueue>,
    pub connectivity: Arc<ConnectivityMonitor>,
    samples_tx: mpsc::Sender<bool>,
    samples_rx: Mutex<Option<mpsc::Receiver<bool>>>,
    cancel: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl AppServices {
    /// Builds every component from `config` and `deps`
    ///
    /// Restores the persisted sync queue and samples the initial
    /// connectivity state. Nothing runs in the background until
    /// [`start`](Self::start).
    pub async fn new(config: &Config, deps: AppDependencies) -> Self {
        let notifications =
            NotificationCenter::with_default_ttl(config.notifications.default_ttl());

        let content = Arc::new(ContentRepository::with_limits(
            deps.store.clone(),
            deps.clock.clone(),
            config.history.limits(),
        ));

        let sink: Arc<dyn INotificationSink> = Arc::new(notifications.clone());
        let queue = Arc::new(
            SyncQueue::restore(deps.queue_store, deps.sync_service, sink, deps.clock)
                .await
                .with_success_message(config.sync.success_message.clone()),
        );

        let connectivity = Arc::new(ConnectivityMonitor::from_probe(deps.probe.as_ref()).await);
        let (samples_tx, samples_rx) = mpsc::channel(SAMPLE_CHANNEL_CAPACITY);

        info!(
            online = connectivity.is_online(),
            queued = queue.len().await,
            "Application services built"
        );

        Self {
            store: deps.store,
            content,
            notifications,
            queue,
            connectivity,
            samples_tx,
            samples_rx: Mutex::new(Some(samples_rx)),
            cancel: CancellationToken::new(),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Spawns the connectivity listener
    ///
    /// If the device starts online with items left over from a previous
    /// run, a drain is kicked off right away.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::AlreadyStarted` on a second call and
    /// `SyncError::ShutDown` after [`shutdown`](Self::shutdown).
    pub async fn start(&self) -> Result<(), SyncError> {
        if self.cancel.is_cancelled() {
            return Err(SyncError::ShutDown);
        }
        let samples_rx = self
            .samples_rx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .ok_or(SyncError::AlreadyStarted)?;

        let monitor = self.connectivity.clone();
        let queue = self.queue.clone();
        let cancel = self.cancel.clone();
        self.spawn(async move { monitor.run(samples_rx, queue, cancel).await });

        if self.connectivity.is_online() && self.queue.has_pending().await {
            let queue = self.queue.clone();
            self.spawn(async move {
                queue.drain().await;
            });
        }

        info!("Application services started");
        Ok(())
    }

    /// Sender for raw connectivity samples
    pub fn connectivity_sender(&self) -> mpsc::Sender<bool> {
        self.samples_tx.clone()
    }

    /// Token cancelled by [`shutdown`](Self::shutdown)
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs `task` in the background; [`shutdown`](Self::shutdown) waits for it
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(task);
        self.tasks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(handle);
    }

    /// Stops background tasks and cancels pending notification expiries
    ///
    /// Safe to call more than once.
    pub async fn shutdown(&self) {
        info!("Shutting down application services");
        self.cancel.cancel();

        let tasks: Vec<JoinHandle<()>> = self
            .tasks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain(..)
            .collect();
        debug!(count = tasks.len(), "Waiting for background tasks");
        for task in tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "Background task ended abnormally");
            }
        }

        self.notifications.shutdown();
        info!("Application services stopped");
    }
}
