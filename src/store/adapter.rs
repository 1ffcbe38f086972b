//! Store adapter facade.
//!
//! Wraps a [`StoreBackend`] handle and implements the record read policy:
//! prefer the backend's native document type, fall back to a raw-string
//! read parsed as JSON. Parse failures mean "record unavailable", never
//! "request failed".

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;

use crate::store::{StoreBackend, StoreError};

/// Cheaply cloneable handle over the backing store.
///
/// Constructed once at startup and passed to each service component.
#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn StoreBackend>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

impl Store {
    /// Wrap a backend implementation.
    pub fn new(backend: impl StoreBackend) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Fetch a JSON record by key.
    ///
    /// Tries the native document read first. On a command-level failure
    /// (wrong type, no document support) retries as a raw string and parses
    /// it as JSON. A record that exists but cannot be parsed is reported as
    /// absent. Connectivity failures propagate as [`StoreError::Unavailable`].
    pub async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        match self.backend.get_document(key).await {
            Ok(doc) => Ok(doc),
            Err(e) if e.is_unavailable() => Err(e),
            Err(e) => {
                tracing::debug!(key, error = %e, "Native document read failed, falling back to raw string");
                match self.backend.get_raw(key).await? {
                    None => Ok(None),
                    Some(raw) => match serde_json::from_str(&raw) {
                        Ok(value) => Ok(Some(value)),
                        Err(e) => {
                            tracing::debug!(key, error = %e, "Record is not valid JSON, treating as unavailable");
                            Ok(None)
                        }
                    },
                }
            }
        }
    }

    /// Enumerate keys matching a `*` glob pattern.
    pub async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        self.backend.scan_keys(pattern).await
    }

    /// Add members to a set.
    pub async fn set_add(&self, key: &str, members: &[String]) -> Result<(), StoreError> {
        self.backend.set_add(key, members).await
    }

    /// Intersect the named sets. Requires at least one key.
    pub async fn set_intersect(&self, keys: &[String]) -> Result<HashSet<String>, StoreError> {
        self.backend.set_intersect(keys).await
    }

    /// Read all members of a set.
    pub async fn set_members(&self, key: &str) -> Result<HashSet<String>, StoreError> {
        self.backend.set_members(key).await
    }

    /// Delete keys, returning how many existed.
    pub async fn delete_keys(&self, keys: &[String]) -> Result<usize, StoreError> {
        self.backend.delete_keys(keys).await
    }

    /// Liveness probe against the backend.
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.backend.ping().await
    }
}
