//! Remote sync service port (driven/secondary port)
//!
//! The remote submission of a queued item is an external collaborator.
//! The queue only needs to know whether one attempt succeeded.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result`; the queue logs failures and never inspects them.
//! - No timeout is imposed by the caller. Implementations own that concern.

use crate::domain::SyncItem;

/// Port trait for submitting one queued item to the remote service
#[async_trait::async_trait]
pub trait ISyncService: Send + Sync {
    /// Submits `item`; `Ok(())` means the remote side accepted it
    async fn sync(&self, item: &SyncItem) -> anyhow::Result<()>;
}
