//! Rosterd - Employee Roster Service Library
//!
//! Read-oriented HTTP API over employee records held in a Redis-compatible
//! key-value store, with a skill reverse-index search and health probes.
//! The `rosterd` binary runs the server and the index builder; the library
//! exposes the pieces for embedding and testing.
//!
//! # Architecture
//!
//! - **Store**: adapter over the key-value backend (Redis in production,
//!   in-memory for tests), including the key-naming conventions
//! - **Indexer**: batch rebuild of the skill → employees reverse index
//! - **Query**: record lookups, listings, and skill-intersection search
//! - **Health**: liveness, readiness, and detailed diagnostics
//! - **Server**: Axum router exposing the HTTP surface

pub mod config;
pub mod health;
pub mod indexer;
pub mod query;
pub mod server;
pub mod store;

pub use config::{AppConfig, ConfigError};
pub use health::HealthMonitor;
pub use indexer::{IndexReport, SKILL_VOCABULARY, SkillIndexer};
pub use query::{QueryError, QueryService};
pub use server::{AppState, create_router};
pub use store::{MemoryStore, RedisStore, Store, StoreBackend, StoreError};
