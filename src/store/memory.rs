//! In-memory store backend.
//!
//! Backs tests and local development without a running store server. Holds
//! native documents, raw strings and sets in locked maps, and supports an
//! offline switch so connectivity-failure paths can be exercised.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use serde_json::Value;

use crate::store::{StoreBackend, StoreError};

#[derive(Default)]
struct Inner {
    documents: HashMap<String, Value>,
    strings: HashMap<String, String>,
    sets: HashMap<String, HashSet<String>>,
}

/// In-memory [`StoreBackend`] implementation.
///
/// Clones share the same underlying maps, so a test can keep a handle for
/// seeding data while the adapter owns another.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
    offline: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a key as a native JSON document.
    pub fn insert_document(&self, key: &str, value: Value) {
        self.inner
            .write()
            .expect("memory store lock poisoned")
            .documents
            .insert(key.to_string(), value);
    }

    /// Store a key as a raw string.
    pub fn insert_raw(&self, key: &str, raw: &str) {
        self.inner
            .write()
            .expect("memory store lock poisoned")
            .strings
            .insert(key.to_string(), raw.to_string());
    }

    /// Toggle offline mode: while set, every operation fails with
    /// [`StoreError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "memory store is offline".to_string(),
            ));
        }
        Ok(())
    }
}

/// Match a key against a glob pattern where `*` spans any run of characters.
///
/// Supports the patterns this system uses (`user:id:*`, `skill:*:employees`)
/// and the general anchored case: literal segments must appear in order,
/// with the first anchored at the start and the last at the end.
fn key_matches(pattern: &str, key: &str) -> bool {
    let segments: Vec<&str> = pattern.split('*').collect();
    if segments.len() == 1 {
        return pattern == key;
    }

    let mut rest = key;
    for (i, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            continue;
        }
        if i == 0 {
            match rest.strip_prefix(segment) {
                Some(r) => rest = r,
                None => return false,
            }
        } else if i == segments.len() - 1 {
            return rest.ends_with(segment);
        } else {
            match rest.find(segment) {
                Some(pos) => rest = &rest[pos + segment.len()..],
                None => return false,
            }
        }
    }
    true
}

#[async_trait::async_trait]
impl StoreBackend for MemoryStore {
    async fn get_document(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.check_online()?;
        let inner = self.inner.read().expect("memory store lock poisoned");
        match inner.documents.get(key) {
            Some(doc) => Ok(Some(doc.clone())),
            // Keys held as plain strings are the wrong type for a document
            // read, same as the real backend reports.
            None if inner.strings.contains_key(key) => Err(StoreError::Command(format!(
                "key '{key}' does not hold a document"
            ))),
            None => Ok(None),
        }
    }

    async fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check_online()?;
        let inner = self.inner.read().expect("memory store lock poisoned");
        Ok(inner.strings.get(key).cloned())
    }

    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        self.check_online()?;
        let inner = self.inner.read().expect("memory store lock poisoned");
        let keys = inner
            .documents
            .keys()
            .chain(inner.strings.keys())
            .chain(inner.sets.keys())
            .filter(|key| key_matches(pattern, key))
            .cloned()
            .collect();
        Ok(keys)
    }

    async fn set_add(&self, key: &str, members: &[String]) -> Result<(), StoreError> {
        self.check_online()?;
        let mut inner = self.inner.write().expect("memory store lock poisoned");
        let set = inner.sets.entry(key.to_string()).or_default();
        set.extend(members.iter().cloned());
        Ok(())
    }

    async fn set_intersect(&self, keys: &[String]) -> Result<HashSet<String>, StoreError> {
        self.check_online()?;
        let inner = self.inner.read().expect("memory store lock poisoned");
        let mut iter = keys.iter();
        let mut result = match iter.next() {
            Some(key) => inner.sets.get(key).cloned().unwrap_or_default(),
            None => return Err(StoreError::Command("SINTER requires at least one key".to_string())),
        };
        for key in iter {
            let other = inner.sets.get(key);
            result.retain(|member| other.is_some_and(|s| s.contains(member)));
        }
        Ok(result)
    }

    async fn set_members(&self, key: &str) -> Result<HashSet<String>, StoreError> {
        self.check_online()?;
        let inner = self.inner.read().expect("memory store lock poisoned");
        Ok(inner.sets.get(key).cloned().unwrap_or_default())
    }

    async fn delete_keys(&self, keys: &[String]) -> Result<usize, StoreError> {
        self.check_online()?;
        let mut inner = self.inner.write().expect("memory store lock poisoned");
        let mut removed = 0;
        for key in keys {
            if inner.documents.remove(key).is_some() {
                removed += 1;
            } else if inner.strings.remove(key).is_some() {
                removed += 1;
            } else if inner.sets.remove(key).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_online()
    }
}
