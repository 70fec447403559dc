//! Shared test helpers: an in-memory stand-in for the Redis primary tier.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use tiered_cache::cache::pattern::glob_match;
use tiered_cache::{CacheError, Config, RemoteStore, Result, TieredCache};

/// In-memory remote store with switchable failure modes.
///
/// `fail` makes every command and connect attempt return a connection
/// error; `stall` makes them hang until the caller's timeout fires.
#[derive(Default)]
pub struct MemoryRemote {
    data: Mutex<HashMap<String, (String, Option<Instant>)>>,
    connected: AtomicBool,
    fail: AtomicBool,
    stall: AtomicBool,
    connects: AtomicU32,
}

impl MemoryRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    pub fn set_stalled(&self, stalled: bool) {
        self.stall.store(stalled, Ordering::SeqCst);
    }

    /// Number of successful connects so far.
    pub fn connects(&self) -> u32 {
        self.connects.load(Ordering::SeqCst)
    }

    /// Reads a live key directly, bypassing the connection state.
    pub fn raw_get(&self, key: &str) -> Option<String> {
        let data = self.data.lock();
        data.get(key)
            .filter(|(_, expires)| expires.map_or(true, |at| at > Instant::now()))
            .map(|(value, _)| value.clone())
    }

    /// Writes a key directly without expiry.
    pub fn raw_set(&self, key: &str, value: &str) {
        self.data
            .lock()
            .insert(key.to_string(), (value.to_string(), None));
    }

    pub fn len(&self) -> usize {
        self.data.lock().len()
    }

    async fn gate(&self) -> Result<()> {
        if self.stall.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(CacheError::Connection("connection refused".to_string()));
        }
        if !self.connected.load(Ordering::SeqCst) {
            return Err(CacheError::Connection("not connected".to_string()));
        }
        Ok(())
    }

    fn purge_expired(data: &mut HashMap<String, (String, Option<Instant>)>) {
        let now = Instant::now();
        data.retain(|_, (_, expires)| expires.map_or(true, |at| at > now));
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn connect(&self) -> Result<()> {
        if self.stall.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(CacheError::Connection("connection refused".to_string()));
        }
        self.connected.store(true, Ordering::SeqCst);
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.gate().await?;
        Ok(self.raw_get(key))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()> {
        self.gate().await?;
        let expires = Instant::now() + Duration::from_secs(ttl_seconds);
        self.data
            .lock()
            .insert(key.to_string(), (value.to_string(), Some(expires)));
        Ok(())
    }

    async fn del(&self, keys: &[String]) -> Result<u64> {
        self.gate().await?;
        let mut data = self.data.lock();
        Self::purge_expired(&mut data);
        Ok(keys.iter().filter(|k| data.remove(*k).is_some()).count() as u64)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        self.gate().await?;
        let mut data = self.data.lock();
        Self::purge_expired(&mut data);
        Ok(data
            .keys()
            .filter(|k| glob_match(pattern, k))
            .cloned()
            .collect())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.gate().await?;
        Ok(self.raw_get(key).is_some())
    }

    async fn ttl(&self, key: &str) -> Result<i64> {
        self.gate().await?;
        let mut data = self.data.lock();
        Self::purge_expired(&mut data);
        Ok(match data.get(key) {
            None => -2,
            Some((_, None)) => -1,
            Some((_, Some(at))) => {
                let remaining = at.saturating_duration_since(Instant::now());
                remaining.as_millis().div_ceil(1000) as i64
            }
        })
    }

    async fn expire(&self, key: &str, ttl_seconds: u64) -> Result<bool> {
        self.gate().await?;
        let mut data = self.data.lock();
        Self::purge_expired(&mut data);
        match data.get_mut(key) {
            Some((_, expires)) => {
                *expires = Some(Instant::now() + Duration::from_secs(ttl_seconds));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ping(&self) -> Result<()> {
        self.gate().await
    }
}

/// Configuration with short timeouts and fast retries.
pub fn fast_config() -> Config {
    Config {
        connect_timeout_ms: 100,
        command_timeout_ms: 100,
        health_timeout_ms: 300,
        max_retries: 2,
        retry_base_delay_ms: 10,
        retry_max_delay_ms: 20,
        ..Config::default()
    }
}

/// Configuration whose reconnect cycle spans roughly 700ms
/// (attempts at 0, 100, 300, 500 and 700ms), long enough for a short
/// outage to end inside it.
pub fn recovering_config() -> Config {
    Config {
        max_retries: 5,
        retry_base_delay_ms: 100,
        retry_max_delay_ms: 200,
        ..fast_config()
    }
}

/// A tiered cache over a fresh in-memory remote, already initialized.
pub async fn connected_cache() -> (TieredCache, Arc<MemoryRemote>) {
    connected_cache_with(fast_config()).await
}

pub async fn connected_cache_with(config: Config) -> (TieredCache, Arc<MemoryRemote>) {
    let remote = MemoryRemote::new();
    let cache = TieredCache::with_remote(&config, remote.clone());
    cache
        .initialize()
        .await
        .expect("in-memory remote should connect");
    (cache, remote)
}
