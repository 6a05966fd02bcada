//! Sahayak Sync - Connectivity-aware offline queue
//!
//! Provides:
//! - A FIFO queue buffering work created while offline
//! - Edge-triggered connectivity monitoring that drains the queue on reconnect
//! - A TCP reachability probe
//! - The [`AppServices`] container tying everything to one process lifecycle
//!
//! ## Modules
//!
//! - [`queue`] - `SyncQueue` with guarded, at-most-once drains
//! - [`connectivity`] - `ConnectivityMonitor` and its event loop
//! - [`probe`] - `TcpConnectivityProbe` and the sampling loop
//! - [`service`] - `SimulatedSyncService` standing in for the remote backend
//! - [`app`] - `AppServices` construction, start and shutdown

pub mod app;
pub mod connectivity;
pub mod probe;
pub mod queue;
pub mod service;

pub use app::{AppDependencies, AppServices};
pub use connectivity::{ConnectivityEvent, ConnectivityMonitor};
pub use probe::{run_probe_loop, TcpConnectivityProbe};
pub use queue::{
    append_to_mirror, DrainOutcome, DrainReport, SyncQueue, DEFAULT_SUCCESS_MESSAGE,
    SYNC_QUEUE_KEY,
};
pub use service::SimulatedSyncService;

use thiserror::Error;

/// Errors that can occur while wiring or running the sync layer
#[derive(Debug, Error)]
pub enum SyncError {
    /// `AppServices::start` was called twice
    #[error("Services already started")]
    AlreadyStarted,

    /// The services were shut down and cannot be restarted
    #[error("Services have been shut down")]
    ShutDown,

    /// The configured probe target is not `host:port`
    #[error("Invalid probe address: {0}")]
    InvalidProbeAddress(String),
}
