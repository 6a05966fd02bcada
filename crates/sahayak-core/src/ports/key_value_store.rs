//! Key/value storage port (driven/secondary port)
//!
//! This module defines the storage medium the persistent store writes to.
//! Implementations live in `sahayak-cache` (SQLite via sqlx, and an
//! in-memory map).
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because storage errors are adapter-specific
//!   (SQLite, memory, etc.) and don't need domain-level classification.
//! - Keys and values are plain strings; encoding (JSON) and namespacing are
//!   the job of [`PersistentStore`](crate::store::PersistentStore).
//! - Each call is atomic on its own; there are no multi-key transactions.

/// Port trait for the underlying key/value medium
#[async_trait::async_trait]
pub trait IKeyValueStore: Send + Sync {
    /// Reads the value stored under `key`
    ///
    /// Returns `Ok(None)` when the key is absent.
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    /// Writes `value` under `key`, replacing any previous value
    async fn put(&self, key: &str, value: &str) -> anyhow::Result<()>;

    /// Removes `key`; removing an absent key is not an error
    async fn remove(&self, key: &str) -> anyhow::Result<()>;

    /// Lists the keys starting with `prefix`, in ascending order
    async fn keys(&self, prefix: &str) -> anyhow::Result<Vec<String>>;
}
