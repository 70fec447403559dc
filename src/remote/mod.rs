//! Remote Store Module
//!
//! The primary tier: a networked key-value store reached through the
//! [`RemoteStore`] trait, plus the connection state machine and the retry
//! policy that drive it.

mod redis_store;
mod retry;
mod state;

use async_trait::async_trait;

use crate::error::Result;

pub use redis_store::RedisStore;
pub use retry::RetryPolicy;
pub use state::{BackendState, StateCell};

// == Remote Store Trait ==
/// Commands the primary tier needs from a remote key-value store.
///
/// TTL sentinels follow Redis: `ttl` returns `-2` for a missing key and
/// `-1` for a key without expiry.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Establishes (or re-establishes) the connection and verifies it.
    async fn connect(&self) -> Result<()>;

    /// Drops the current connection, if any.
    async fn disconnect(&self);

    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// `SETEX key ttl value`
    async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()>;

    /// `DEL key [key ...]`, returns the number of keys removed.
    async fn del(&self, keys: &[String]) -> Result<u64>;

    /// `KEYS pattern`
    async fn keys(&self, pattern: &str) -> Result<Vec<String>>;

    async fn exists(&self, key: &str) -> Result<bool>;

    async fn ttl(&self, key: &str) -> Result<i64>;

    /// `EXPIRE key ttl`, false if the key does not exist.
    async fn expire(&self, key: &str, ttl_seconds: u64) -> Result<bool>;

    async fn ping(&self) -> Result<()>;
}
