//! Redis-backed primary tier.

use std::fmt::Debug;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, IntoConnectionInfo};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{CacheError, Result};
use crate::remote::RemoteStore;

/// Redis store over a single multiplexed connection.
///
/// The connection is only opened by [`RemoteStore::connect`]; commands
/// issued while disconnected fail fast with [`CacheError::Connection`]
/// instead of dialing on demand, so reconnection stays under the control
/// of the caller's retry policy.
pub struct RedisStore {
    client: Client,
    connection: RwLock<Option<MultiplexedConnection>>,
}

impl Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self.connection.try_read() {
            Ok(conn) if conn.is_some() => "connected",
            Ok(_) => "no_connection",
            Err(_) => "lock_busy",
        };
        f.debug_struct("RedisStore")
            .field("addr", &self.client.get_connection_info().addr)
            .field("connection", &status)
            .finish()
    }
}

impl RedisStore {
    /// Accepts a URL or a prepared `ConnectionInfo`; no network I/O happens here.
    pub fn open<T: IntoConnectionInfo>(info: T) -> Result<Self> {
        let client = Client::open(info)
            .map_err(|e| CacheError::Configuration(format!("invalid redis url: {}", e)))?;
        Ok(Self {
            client,
            connection: RwLock::new(None),
        })
    }

    async fn conn(&self) -> Result<MultiplexedConnection> {
        self.connection
            .read()
            .await
            .as_ref()
            .cloned()
            .ok_or_else(|| CacheError::Connection("redis is not connected".to_string()))
    }
}

#[async_trait]
impl RemoteStore for RedisStore {
    async fn connect(&self) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        debug!(reply = %pong, "redis connection established");
        *self.connection.write().await = Some(conn);
        Ok(())
    }

    async fn disconnect(&self) {
        self.connection.write().await.take();
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn().await?;
        Ok(conn.get(key).await?)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()> {
        let mut conn = self.conn().await?;
        let _: () = conn.set_ex(key, value, ttl_seconds.max(1)).await?;
        Ok(())
    }

    async fn del(&self, keys: &[String]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn().await?;
        Ok(conn.del(keys).await?)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.conn().await?;
        Ok(conn.keys(pattern).await?)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn().await?;
        Ok(conn.exists(key).await?)
    }

    async fn ttl(&self, key: &str) -> Result<i64> {
        let mut conn = self.conn().await?;
        Ok(conn.ttl(key).await?)
    }

    async fn expire(&self, key: &str, ttl_seconds: u64) -> Result<bool> {
        let mut conn = self.conn().await?;
        Ok(conn.expire(key, ttl_seconds.max(1) as i64).await?)
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
