//! Namespaced JSON store
//!
//! [`PersistentStore`] sits between the repositories and an
//! [`IKeyValueStore`] medium. Every key is prefixed with a namespace
//! (`sahayak_` by default) and every value is encoded as JSON text.
//!
//! Failures never reach the caller of `put`/`remove`/`get`: they are logged
//! and absorbed. Callers that need to know whether a write landed use
//! [`PersistentStore::try_put`].

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::StoreError;
use crate::ports::IKeyValueStore;

/// Prefix applied to every key unless configured otherwise
pub const DEFAULT_NAMESPACE: &str = "sahayak_";

/// JSON store over a key/value medium
#[derive(Clone)]
pub struct PersistentStore {
    backend: Arc<dyn IKeyValueStore>,
    namespace: String,
}

impl std::fmt::Debug for PersistentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentStore")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl PersistentStore {
    /// Creates a store using [`DEFAULT_NAMESPACE`]
    pub fn new(backend: Arc<dyn IKeyValueStore>) -> Self {
        Self::with_namespace(backend, DEFAULT_NAMESPACE)
    }

    pub fn with_namespace(backend: Arc<dyn IKeyValueStore>, namespace: impl Into<String>) -> Self {
        Self {
            backend,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.namespace, key)
    }

    /// Reads and decodes the value under `key`
    ///
    /// Returns `None` if the key is absent, the medium fails, or the stored
    /// text does not decode as `T`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let full_key = self.full_key(key);
        let raw = match self.backend.get(&full_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %full_key, error = %e, "Failed to read from store");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key = %full_key, error = %e, "Stored value could not be decoded");
                None
            }
        }
    }

    /// Like [`get`](Self::get), mapping absence to `T::default()`
    pub async fn get_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.get(key).await.unwrap_or_default()
    }

    /// Returns the stored JSON as-is, without interpreting it
    pub async fn get_value(&self, key: &str) -> Option<Value> {
        self.get::<Value>(key).await
    }

    /// Encodes and writes `value`, reporting failure to the caller
    pub async fn try_put<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        let full_key = self.full_key(key);
        let encoded = serde_json::to_string(value).map_err(|e| StoreError::Serialization {
            key: full_key.clone(),
            message: e.to_string(),
        })?;

        self.backend
            .put(&full_key, &encoded)
            .await
            .map_err(|e| StoreError::Backend {
                key: full_key.clone(),
                message: e.to_string(),
            })?;

        debug!(key = %full_key, bytes = encoded.len(), "Stored value");
        Ok(())
    }

    /// Encodes and writes `value`; failures are logged and dropped
    pub async fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        if let Err(e) = self.try_put(key, value).await {
            warn!(error = %e, "Store write dropped");
        }
    }

    /// Removes `key`, reporting failure to the caller
    pub async fn try_remove(&self, key: &str) -> Result<(), StoreError> {
        let full_key = self.full_key(key);
        self.backend
            .remove(&full_key)
            .await
            .map_err(|e| StoreError::Backend {
                key: full_key,
                message: e.to_string(),
            })
    }

    /// Removes `key`; failures are logged and dropped
    pub async fn remove(&self, key: &str) {
        if let Err(e) = self.try_remove(key).await {
            warn!(error = %e, "Store removal dropped");
        }
    }

    /// Lists the keys held under this namespace, with the prefix stripped
    pub async fn keys(&self) -> Vec<String> {
        match self.backend.keys(&self.namespace).await {
            Ok(keys) => keys
                .into_iter()
                .filter_map(|k| k.strip_prefix(&self.namespace).map(str::to_string))
                .collect(),
            Err(e) => {
                warn!(namespace = %self.namespace, error = %e, "Failed to list store keys");
                Vec::new()
            }
        }
    }
}

/// In-process media for unit tests in this crate
#[cfg(test)]
pub(crate) mod test_backend {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use anyhow::bail;

    use crate::ports::IKeyValueStore;

    #[derive(Default)]
    pub struct MapBackend {
        entries: Mutex<BTreeMap<String, String>>,
        fail_writes: AtomicBool,
    }

    impl MapBackend {
        pub fn set_fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }

        pub fn raw(&self, key: &str) -> Option<String> {
            self.entries.lock().unwrap().get(key).cloned()
        }

        pub fn insert_raw(&self, key: &str, value: &str) {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
        }
    }

    #[async_trait::async_trait]
    impl IKeyValueStore for MapBackend {
        async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        async fn put(&self, key: &str, value: &str) -> anyhow::Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                bail!("quota exceeded");
            }
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn remove(&self, key: &str) -> anyhow::Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                bail!("quota exceeded");
            }
            self.entries.lock().unwrap().remove(key);
            Ok(())
        }

        async fn keys(&self, prefix: &str) -> anyhow::Result<Vec<String>> {
            Ok(self
                .entries
                .lock()
                .unwrap()
                .keys()
                .filter(|k| k.starts_with(prefix))
                .cloned()
                .collect())
        }
    }
}
