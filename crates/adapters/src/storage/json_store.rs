//! String-keyed JSON store, optionally mirrored to a file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use application::ports::RepositoryError;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<StorageError> for RepositoryError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Io(e) => RepositoryError::Storage(e.to_string()),
            StorageError::Serialization(e) => RepositoryError::Serialization(e.to_string()),
        }
    }
}

/// A value stored with an expiry time in epoch milliseconds.
#[derive(Debug, Serialize, Deserialize)]
struct Expiring<T> {
    value: T,
    expiry: i64,
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn is_expired(value: &Value, now: i64) -> bool {
    value
        .get("expiry")
        .and_then(Value::as_i64)
        .is_some_and(|expiry| now > expiry)
}

/// JSON values by key.
///
/// Kept in memory; when opened with [`JsonStore::open`] every change is also
/// written to the backing file. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct JsonStore {
    items: Arc<RwLock<BTreeMap<String, Value>>>,
    path: Option<Arc<PathBuf>>,
}

impl JsonStore {
    /// Creates an empty store that lives only in memory.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens a file-backed store, loading the file if it exists.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let items = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        tracing::info!(path = %path.display(), keys = items.len(), "Opened JSON store");

        Ok(Self {
            items: Arc::new(RwLock::new(items)),
            path: Some(Arc::new(path)),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref().map(PathBuf::as_path)
    }

    pub async fn set_item<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let value = serde_json::to_value(value)?;
        let mut items = self.items.write().await;
        items.insert(key.to_string(), value);
        self.persist(&items).await
    }

    pub async fn get_item<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let items = self.items.read().await;
        items
            .get(key)
            .map(|value| T::deserialize(value))
            .transpose()
            .map_err(StorageError::from)
    }

    /// Removes `key`. Returns false if it was not present.
    pub async fn remove_item(&self, key: &str) -> Result<bool, StorageError> {
        let mut items = self.items.write().await;
        if items.remove(key).is_none() {
            return Ok(false);
        }
        self.persist(&items).await?;
        Ok(true)
    }

    pub async fn clear(&self) -> Result<(), StorageError> {
        let mut items = self.items.write().await;
        items.clear();
        self.persist(&items).await
    }

    pub async fn has_item(&self, key: &str) -> bool {
        self.items.read().await.contains_key(key)
    }

    /// Keys containing `pattern`, or all keys, in sorted order.
    pub async fn keys(&self, pattern: Option<&str>) -> Vec<String> {
        self.items
            .read()
            .await
            .keys()
            .filter(|key| pattern.is_none_or(|p| key.contains(p)))
            .cloned()
            .collect()
    }

    /// Reads `key` (or `T::default()` if absent), applies `f` and writes the
    /// result back, all under one write lock.
    ///
    /// When `f` fails nothing is written.
    pub async fn update_item<T, R, E>(
        &self,
        key: &str,
        f: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Result<R, E>
    where
        T: Serialize + DeserializeOwned + Default,
        E: From<StorageError>,
    {
        let mut items = self.items.write().await;
        let mut current = match items.get(key) {
            Some(value) => T::deserialize(value).map_err(StorageError::from)?,
            None => T::default(),
        };

        let result = f(&mut current)?;

        let value = serde_json::to_value(&current).map_err(StorageError::from)?;
        items.insert(key.to_string(), value);
        self.persist(&items).await?;
        Ok(result)
    }

    /// Stores `value` so that it expires after `ttl`.
    pub async fn set_item_with_ttl<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), StorageError> {
        let ttl = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let entry = Expiring {
            value,
            expiry: now_millis().saturating_add(ttl),
        };
        self.set_item(key, &entry).await
    }

    /// Reads a value stored with [`JsonStore::set_item_with_ttl`].
    ///
    /// An expired value is removed and reported as absent.
    pub async fn get_item_with_ttl<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, StorageError> {
        let mut items = self.items.write().await;
        let Some(value) = items.get(key) else {
            return Ok(None);
        };

        if is_expired(value, now_millis()) {
            items.remove(key);
            self.persist(&items).await?;
            return Ok(None);
        }

        let entry = Expiring::<T>::deserialize(value)?;
        Ok(Some(entry.value))
    }

    /// Removes every expired value. Returns how many were removed.
    pub async fn clear_expired_items(&self) -> Result<usize, StorageError> {
        let mut items = self.items.write().await;
        let now = now_millis();
        let before = items.len();
        items.retain(|_, value| !is_expired(value, now));
        let removed = before - items.len();
        if removed > 0 {
            self.persist(&items).await?;
            tracing::debug!(removed, "Cleared expired storage items");
        }
        Ok(removed)
    }

    async fn persist(&self, items: &BTreeMap<String, Value>) -> Result<(), StorageError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let bytes = serde_json::to_vec_pretty(items)?;
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, path.as_path()).await?;
        Ok(())
    }
}
