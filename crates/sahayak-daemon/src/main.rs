//! Sahayak Daemon - Background reconciliation service
//!
//! This binary keeps the offline layer alive between user sessions:
//! - Restores the persisted sync queue
//! - Probes connectivity and drains the queue when the device comes back online
//! - Logs notifications and connectivity changes
//! - Graceful shutdown on SIGTERM/SIGINT
//!
//! # Architecture
//!
//! The daemon builds one [`AppServices`] container, spawns the probe loop and
//! the event loggers under the container's `CancellationToken`, then waits
//! for a shutdown signal. The config file path can be overridden with
//! `SAHAYAK_CONFIG`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use sahayak_cache::{open_backend, Backend, MemoryKeyValueStore};
use sahayak_core::config::{Config, LoggingConfig};
use sahayak_core::ports::{IConnectivityProbe, SystemClock};
use sahayak_core::store::PersistentStore;
use sahayak_notify::NotificationEvent;
use sahayak_sync::{
    run_probe_loop, AppDependencies, AppServices, SimulatedSyncService, TcpConnectivityProbe,
};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the config file location
const CONFIG_ENV: &str = "SAHAYAK_CONFIG";

// ============================================================================
// DaemonService
// ============================================================================

/// Owns the storage backend and the service container for one daemon run
struct DaemonService {
    config: Config,
    backend: Backend,
    app: Arc<AppServices>,
    probe: Arc<dyn IConnectivityProbe>,
    /// Cancelled by the signal handler
    shutdown: CancellationToken,
}

impl DaemonService {
    /// Opens storage and builds the services described by `config`
    async fn new(config: Config, shutdown: CancellationToken) -> Result<Self> {
        let backend = open_backend(&config.storage)
            .await
            .context("Failed to open storage backend")?;

        let store = PersistentStore::with_namespace(
            backend.store.clone(),
            config.storage.namespace.clone(),
        );
        let queue_store = queue_store(&config, &store);

        let probe: Arc<dyn IConnectivityProbe> = Arc::new(
            TcpConnectivityProbe::from_config(&config.connectivity)
                .context("Invalid connectivity settings")?,
        );

        let app = AppServices::new(
            &config,
            AppDependencies {
                store,
                queue_store,
                sync_service: Arc::new(SimulatedSyncService::new(Duration::from_millis(
                    config.sync.simulated_latency_ms,
                ))),
                probe: probe.clone(),
                clock: Arc::new(SystemClock),
            },
        )
        .await;

        Ok(Self {
            config,
            backend,
            app: Arc::new(app),
            probe,
            shutdown,
        })
    }

    /// Runs until the shutdown token fires, then tears everything down
    async fn run(&self) -> Result<()> {
        self.app.start().await.context("Failed to start services")?;

        let token = self.app.cancellation_token();
        self.app.spawn(run_probe_loop(
            self.probe.clone(),
            self.config.connectivity.probe_interval(),
            self.app.connectivity_sender(),
            token.clone(),
        ));
        self.app.spawn(log_notifications(self.app.clone(), token.clone()));
        self.app.spawn(log_connectivity(self.app.clone(), token));

        info!(
            online = self.app.connectivity.is_online(),
            queued = self.app.queue.len().await,
            "Daemon running"
        );

        self.shutdown.cancelled().await;
        info!("Shutdown signal received");

        self.app.shutdown().await;
        self.backend.close().await;
        Ok(())
    }
}

/// Store the sync queue is mirrored to
///
/// With `sync.persist_queue` off, the queue lives in a private memory store
/// and is lost on exit.
fn queue_store(config: &Config, durable: &PersistentStore) -> PersistentStore {
    if config.sync.persist_queue {
        durable.clone()
    } else {
        PersistentStore::with_namespace(
            Arc::new(MemoryKeyValueStore::new()),
            config.storage.namespace.clone(),
        )
    }
}

// ============================================================================
// Event loggers
// ============================================================================

async fn log_notifications(app: Arc<AppServices>, token: CancellationToken) {
    let mut events = app.notifications.subscribe();
    loop {
        let event = tokio::select! {
            _ = token.cancelled() => break,
            event = events.recv() => event,
        };
        match event {
            Ok(NotificationEvent::Added(n)) => {
                info!(id = %n.id, severity = %n.severity, message = %n.message, "Notification")
            }
            Ok(NotificationEvent::Removed(id)) => {
                tracing::debug!(%id, "Notification removed")
            }
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "Notification log fell behind"),
            Err(RecvError::Closed) => break,
        }
    }
}

async fn log_connectivity(app: Arc<AppServices>, token: CancellationToken) {
    let mut events = app.connectivity.subscribe();
    loop {
        let event = tokio::select! {
            _ = token.cancelled() => break,
            event = events.recv() => event,
        };
        match event {
            Ok(event) => {
                let queued = app.queue.len().await;
                info!(?event, queued, "Connectivity")
            }
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "Connectivity log fell behind"),
            Err(RecvError::Closed) => break,
        }
    }
}

// ============================================================================
// Graceful shutdown signal handler
// ============================================================================

/// Waits for SIGTERM or SIGINT and triggers the cancellation token
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}

// ============================================================================
// Startup helpers
// ============================================================================

fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(Config::default_path)
}

/// `RUST_LOG` wins; otherwise the configured level applies
fn env_filter(logging: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level))
}

fn init_tracing(logging: &LoggingConfig) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(logging))
        .with_target(true);

    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let path = config_path();
    let config = Config::load_or_default(&path);

    init_tracing(&config.logging);
    info!(config_path = %path.display(), "Sahayak daemon starting (sahayakd)");

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            error!(field = %e.field, message = %e.message, "Invalid configuration");
        }
        bail!("Configuration has {} error(s)", errors.len());
    }

    let shutdown_token = CancellationToken::new();

    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        shutdown_signal(signal_token).await;
    });

    let service = DaemonService::new(config, shutdown_token).await?;
    let result = service.run().await;

    match &result {
        Ok(()) => info!("Sahayak daemon shut down gracefully"),
        Err(e) => error!(error = %e, "Sahayak daemon exiting with error"),
    }

    result
}

// ============================================================================
// Tests
// ============================================================================
