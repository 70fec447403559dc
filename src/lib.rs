//! Tiered Cache - a two-tier cache service
//!
//! A Redis primary tier backed by a bounded in-process tier that is always
//! written, so a primary outage degrades to local-only caching instead of
//! failing callers.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod remote;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheStats, HealthReport, HealthStatus, TieredCache};
pub use config::Config;
pub use error::{CacheError, Result};
pub use remote::{BackendState, RedisStore, RemoteStore};
pub use tasks::spawn_cleanup_task;
