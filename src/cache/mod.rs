//! Cache Module
//!
//! Key namespacing, the bounded local tier, statistics, and the tiered
//! orchestration that ties the local tier to the remote one.

mod entry;
mod health;
mod keys;
mod local;
mod lru;
mod pending;
pub mod pattern;
mod stats;
mod tiered;


// Re-export public types
pub use entry::CacheEntry;
pub use health::{HealthReport, HealthStatus, LocalHealth, PrimaryHealth};
pub use keys::{KeyNamespaces, Namespace, FALLBACK_PREFIX, FALLBACK_TTL};
pub use local::LocalStore;
pub use lru::LruTracker;
pub use pending::{PendingInvalidations, ReplayBatch};
pub use stats::{hit_rate_percent, StatsCollector, StatsSnapshot};
pub use tiered::{CacheStats, TieredCache};
