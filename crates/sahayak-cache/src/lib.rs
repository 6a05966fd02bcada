//! Sahayak Cache - Local persistence adapters
//!
//! Implementations of the `IKeyValueStore` port from `sahayak-core`:
//!
//! - [`SqliteKeyValueStore`] - durable store in a SQLite file (one row per key)
//! - [`MemoryKeyValueStore`] - process-local map, for tests and ephemeral runs
//!
//! ## Key Components
//!
//! - [`DatabasePool`] - Connection pool with migration support
//! - [`open_backend`] - Picks the medium named by `storage.backend`
//! - [`CacheError`] - Error types for cache operations
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use sahayak_cache::{DatabasePool, SqliteKeyValueStore};
//! use sahayak_core::store::PersistentStore;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let pool = DatabasePool::new(Path::new("/home/user/.local/share/sahayak/sahayak.db")).await?;
//! let store = PersistentStore::new(Arc::new(SqliteKeyValueStore::new(pool.pool().clone())));
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use sahayak_core::config::StorageConfig;
use sahayak_core::ports::IKeyValueStore;

pub mod memory;
pub mod pool;
pub mod sqlite;

pub use memory::MemoryKeyValueStore;
pub use pool::DatabasePool;
pub use sqlite::SqliteKeyValueStore;

/// Errors that can occur during cache operations
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Failed to establish a database connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A database query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Schema migration failed
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// The configured backend name is not one we know
    #[error("Unknown storage backend: {0}")]
    UnknownBackend(String),
}

impl From<sqlx::Error> for CacheError {
    fn from(e: sqlx::Error) -> Self {
        CacheError::QueryFailed(e.to_string())
    }
}

/// An opened storage medium
///
/// Keeps the pool alongside the port object so the owner can close it at
/// shutdown.
pub struct Backend {
    pub store: Arc<dyn IKeyValueStore>,
    pub pool: Option<DatabasePool>,
}

impl Backend {
    /// SQLite view of the medium, for row-level details the port does not expose
    pub fn sqlite(&self) -> Option<SqliteKeyValueStore> {
        self.pool
            .as_ref()
            .map(|pool| SqliteKeyValueStore::new(pool.pool().clone()))
    }

    /// Closes the database pool, if any
    pub async fn close(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}

/// Opens the medium named by `config.backend`
///
/// # Errors
///
/// Returns `CacheError::UnknownBackend` for an unrecognised name, or the
/// pool's error if the SQLite database cannot be opened.
pub async fn open_backend(config: &StorageConfig) -> Result<Backend, CacheError> {
    match config.backend.as_str() {
        "sqlite" => {
            let pool = DatabasePool::new(&config.database_path).await?;
            Ok(Backend {
                store: Arc::new(SqliteKeyValueStore::new(pool.pool().clone())),
                pool: Some(pool),
            })
        }
        "memory" => Ok(Backend {
            store: Arc::new(MemoryKeyValueStore::new()),
            pool: None,
        }),
        other => Err(CacheError::UnknownBackend(other.to_string())),
    }
}
