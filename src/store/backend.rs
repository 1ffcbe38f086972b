//! Backend trait for the key-value store.

use std::collections::HashSet;

use serde_json::Value;

use crate::store::StoreError;

/// Async interface over the backing key-value store.
///
/// Implementations are constructed once at startup and shared by handle;
/// every method takes `&self` and must be safe to call concurrently.
///
/// # Error Handling Philosophy
///
/// Backends distinguish **connectivity failures** (`StoreError::Unavailable`)
/// from **command failures** (`StoreError::Command`). The adapter on top
/// relies on this split: a command failure on a native document read falls
/// back to a raw-string read, while an unavailable store aborts the request.
#[async_trait::async_trait]
pub trait StoreBackend: Send + Sync + 'static {
    /// Read a key stored as a native JSON document.
    ///
    /// Returns `Ok(None)` if the key is absent. Returns `Command` if the key
    /// holds a different type or the backend lacks native document support.
    async fn get_document(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Read a key stored as a raw string.
    async fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Enumerate all keys matching a `*` glob pattern. No ordering guarantee.
    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, StoreError>;

    /// Add members to a set, creating it if absent.
    async fn set_add(&self, key: &str, members: &[String]) -> Result<(), StoreError>;

    /// Intersect the named sets. A missing key behaves as an empty set.
    ///
    /// Callers must supply at least one key; the intersection of zero sets
    /// is undefined input.
    async fn set_intersect(&self, keys: &[String]) -> Result<HashSet<String>, StoreError>;

    /// Read all members of a set. A missing key yields an empty set.
    async fn set_members(&self, key: &str) -> Result<HashSet<String>, StoreError>;

    /// Delete keys, returning how many existed.
    async fn delete_keys(&self, keys: &[String]) -> Result<usize, StoreError>;

    /// Liveness probe.
    async fn ping(&self) -> Result<(), StoreError>;
}
