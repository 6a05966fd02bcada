//! Simulated remote sync service
//!
//! Stands in for the remote backend: every submission succeeds after a
//! fixed delay.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::debug;

use sahayak_core::domain::SyncItem;
use sahayak_core::ports::ISyncService;

#[derive(Debug, Default)]
pub struct SimulatedSyncService {
    latency: Duration,
    submitted: AtomicU64,
}

impl SimulatedSyncService {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            submitted: AtomicU64::new(0),
        }
    }

    /// Number of items accepted so far
    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }
}

#[async_trait::async_trait]
impl ISyncService for SimulatedSyncService {
    async fn sync(&self, item: &SyncItem) -> anyhow::Result<()> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.submitted.fetch_add(1, Ordering::Relaxed);
        debug!(id = %item.id(), kind = item.kind(), "Simulated sync accepted item");
        Ok(())
    }
}
