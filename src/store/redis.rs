//! Redis-backed store implementation.
//!
//! Holds one long-lived [`ConnectionManager`] shared across request tasks.
//! Every command runs under a timeout with a bounded, jittered retry on
//! connectivity errors. Native document reads use the JSON module
//! (`JSON.GET`); raw reads use plain `GET`.

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, JsonAsyncCommands, RedisError};
use serde_json::Value;

use crate::store::{StoreBackend, StoreError};

/// Default per-command timeout.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(3);

/// Default retry budget for connectivity errors.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Base delay between retries; grows linearly per attempt.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(50);

/// Upper bound on the random jitter added to each retry delay.
const RETRY_JITTER_MS: u64 = 50;

/// Builder for [`RedisStore`].
pub struct RedisStoreBuilder {
    url: String,
    command_timeout: Duration,
    max_retries: u32,
}

impl RedisStoreBuilder {
    /// Set the per-command timeout.
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Set the retry budget for connectivity errors.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Connect to the store and verify it with a ping.
    pub async fn connect(self) -> Result<RedisStore, StoreError> {
        let client = redis::Client::open(self.url.as_str())
            .map_err(|e| StoreError::Unavailable(format!("invalid store url: {e}")))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let store = RedisStore {
            manager,
            command_timeout: self.command_timeout,
            max_retries: self.max_retries,
        };
        store.ping().await?;
        tracing::info!("Connected to store");
        Ok(store)
    }
}

/// Redis [`StoreBackend`] over a shared connection manager.
#[derive(Clone)]
pub struct RedisStore {
    manager: ConnectionManager,
    command_timeout: Duration,
    max_retries: u32,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("command_timeout", &self.command_timeout)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Start building a store for the given connection URL.
    pub fn builder(url: impl Into<String>) -> RedisStoreBuilder {
        RedisStoreBuilder {
            url: url.into(),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Run a command with timeout and jittered retry on connectivity errors.
    ///
    /// Command-level failures (wrong type, missing module) are not retried;
    /// the store already gave a definitive answer.
    async fn with_retry<T, F, Fut>(&self, op_name: &'static str, op: F) -> Result<T, StoreError>
    where
        F: Fn(ConnectionManager) -> Fut,
        Fut: Future<Output = redis::RedisResult<T>>,
    {
        let mut last = StoreError::Unavailable("no attempts made".to_string());
        for attempt in 0..=self.max_retries {
            match tokio::time::timeout(self.command_timeout, op(self.manager.clone())).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) if !is_retryable(&e) => {
                    return Err(StoreError::Command(e.to_string()));
                }
                Ok(Err(e)) => last = StoreError::Unavailable(e.to_string()),
                Err(_) => {
                    last = StoreError::Unavailable(format!(
                        "{op_name} timed out after {:?}",
                        self.command_timeout
                    ));
                }
            }
            if attempt < self.max_retries {
                let jitter = Duration::from_millis(rand::rng().random_range(0..RETRY_JITTER_MS));
                let delay = RETRY_BASE_DELAY * (attempt + 1) + jitter;
                tracing::warn!(
                    op = op_name,
                    attempt,
                    error = %last,
                    delay_ms = delay.as_millis() as u64,
                    "Store command failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
        Err(last)
    }
}

/// Connectivity errors are worth retrying; command errors are definitive.
fn is_retryable(e: &RedisError) -> bool {
    e.is_io_error() || e.is_timeout() || e.is_connection_refusal() || e.is_connection_dropped()
}

/// Unwrap a `JSON.GET $` reply into the stored document.
///
/// The `$` path wraps the document in a one-element array; legacy servers
/// may return the bare document.
fn parse_document_reply(raw: &str) -> Result<Option<Value>, StoreError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| StoreError::Command(format!("malformed document reply: {e}")))?;
    match value {
        Value::Array(items) => Ok(items.into_iter().next()),
        other => Ok(Some(other)),
    }
}

#[async_trait::async_trait]
impl StoreBackend for RedisStore {
    async fn get_document(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let reply: Option<String> = self
            .with_retry("JSON.GET", |mut con| async move {
                con.json_get(key, "$").await
            })
            .await?;
        match reply {
            None => Ok(None),
            Some(raw) => parse_document_reply(&raw),
        }
    }

    async fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.with_retry("GET", |mut con| async move { con.get(key).await })
            .await
    }

    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        self.with_retry("KEYS", |mut con| async move { con.keys(pattern).await })
            .await
    }

    async fn set_add(&self, key: &str, members: &[String]) -> Result<(), StoreError> {
        if members.is_empty() {
            return Ok(());
        }
        let _added: usize = self
            .with_retry("SADD", |mut con| async move {
                con.sadd(key, members).await
            })
            .await?;
        Ok(())
    }

    async fn set_intersect(&self, keys: &[String]) -> Result<HashSet<String>, StoreError> {
        if keys.is_empty() {
            return Err(StoreError::Command(
                "SINTER requires at least one key".to_string(),
            ));
        }
        self.with_retry("SINTER", |mut con| async move { con.sinter(keys).await })
            .await
    }

    async fn set_members(&self, key: &str) -> Result<HashSet<String>, StoreError> {
        self.with_retry("SMEMBERS", |mut con| async move {
            con.smembers(key).await
        })
        .await
    }

    async fn delete_keys(&self, keys: &[String]) -> Result<usize, StoreError> {
        if keys.is_empty() {
            return Ok(0);
        }
        self.with_retry("DEL", |mut con| async move { con.del(keys).await })
            .await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let _pong: String = self
            .with_retry("PING", |mut con| async move {
                redis::cmd("PING").query_async(&mut con).await
            })
            .await?;
        Ok(())
    }
}
