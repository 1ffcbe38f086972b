//! Store Adapter
//!
//! Uniform interface over the backing key-value store:
//! - [`StoreBackend`]: async trait every backend implements
//! - [`Store`]: adapter handle with the document-then-raw read policy
//! - [`RedisStore`]: production backend over a shared connection manager
//! - [`MemoryStore`]: embedded backend for tests and local development
//! - [`keys`]: the key-naming conventions both data structures share

mod adapter;
mod backend;
mod error;
pub mod keys;
mod memory;
mod redis;

pub use adapter::Store;
pub use backend::StoreBackend;
pub use error::StoreError;
pub use memory::MemoryStore;
pub use self::redis::{DEFAULT_COMMAND_TIMEOUT, DEFAULT_MAX_RETRIES, RedisStore, RedisStoreBuilder};
