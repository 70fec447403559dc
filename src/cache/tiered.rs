//! Tiered Cache Module
//!
//! Read-through / write-through orchestration over the primary (remote) and
//! secondary (local) tiers. Consumer methods never return cache errors:
//! every primary failure degrades to local-only behavior and every
//! serialization failure reads as a miss.

use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::cache::health::{HealthReport, HealthStatus, LocalHealth, PrimaryHealth};
use crate::cache::pattern::escape_glob;
use crate::cache::{KeyNamespaces, LocalStore, PendingInvalidations, StatsCollector, StatsSnapshot};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::remote::{BackendState, RedisStore, RemoteStore, RetryPolicy, StateCell};

/// TTL of health probe entries, in seconds.
const PROBE_TTL: u64 = 10;

// == Cache Stats Report ==
/// Collector counters plus tier occupancy, as returned by [`TieredCache::stats`].
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    #[serde(flatten)]
    pub counters: StatsSnapshot,
    pub local_entries: usize,
    pub local_max_entries: usize,
    pub local_evictions: u64,
    /// Missed primary updates waiting for replay
    pub pending_invalidations: usize,
    pub primary: BackendState,
}

// == Primary Tier Handle ==
/// The remote store together with its connection state and bounds.
///
/// Cheap to clone so a reconnect cycle can run on its own task.
#[derive(Clone)]
struct Primary {
    store: Arc<dyn RemoteStore>,
    state: Arc<StateCell>,
    /// Updates the primary missed; deleted there before it serves reads again
    pending: Arc<Mutex<PendingInvalidations>>,
    /// Patterns covering every cache namespace, replayed on pending overflow
    flush_patterns: Arc<Vec<String>>,
    stats: Arc<StatsCollector>,
    policy: RetryPolicy,
    connect_timeout: Duration,
    command_timeout: Duration,
}

impl Primary {
    fn available(&self) -> bool {
        self.state.get().is_available()
    }

    async fn bounded<T, F>(&self, op: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.command_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout(format!(
                "{} exceeded {:?}",
                op, self.command_timeout
            ))),
        }
    }

    // == Bounded Call ==
    /// Runs one remote command under the command timeout.
    ///
    /// Connection-class failures demote the tier and start a background
    /// reconnect cycle; every failure is counted and logged.
    async fn call<T, F>(&self, op: &'static str, key: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let result = self.bounded(op, fut).await;

        if let Err(e) = &result {
            self.stats.record_error();
            if e.is_connection_failure() {
                self.on_connection_failure(op, key, e);
            } else {
                warn!(op, key = %key, error = %e, "primary command failed");
            }
        }
        result
    }

    /// Only the caller that moves the tier out of `Connected` starts a
    /// reconnect cycle; an exhausted cycle leaves it `Disconnected`, which
    /// nothing but [`TieredCache::reinitialize`] leaves again.
    fn on_connection_failure(&self, op: &str, key: &str, e: &CacheError) {
        if !self.state.transition(BackendState::Connected, BackendState::Error) {
            return;
        }
        warn!(op, key = %key, error = %e, "primary tier lost, serving from local tier");

        let primary = self.clone();
        tokio::spawn(async move {
            primary.store.disconnect().await;
            primary.connect_with_retry().await;
        });
    }

    // == Missed Updates ==
    fn miss_key(&self, key: &str) {
        self.pending.lock().record_key(key);
        self.replay_if_connected();
    }

    fn miss_pattern(&self, pattern: &str) {
        self.pending.lock().record_pattern(pattern);
        self.replay_if_connected();
    }

    /// Picks up updates recorded after a reconnect cycle took its snapshot.
    fn replay_if_connected(&self) {
        if !self.available() || self.pending.lock().is_empty() {
            return;
        }
        let primary = self.clone();
        tokio::spawn(async move {
            if let Err(e) = primary.replay_pending().await {
                warn!(error = %e, "replay of missed primary updates failed");
            }
        });
    }

    /// Deletes every pending key and pattern from the primary tier.
    ///
    /// Entries are forgotten only after all deletes succeeded.
    async fn replay_pending(&self) -> Result<()> {
        let batch = self.pending.lock().snapshot();
        if batch.is_empty() {
            return Ok(());
        }

        let mut patterns = batch.patterns.clone();
        if batch.flush_namespaces {
            patterns.extend(self.flush_patterns.iter().cloned());
        }

        let mut removed = 0;
        if !batch.keys.is_empty() {
            removed += self.bounded("DEL", self.store.del(&batch.keys)).await?;
        }
        for pattern in &patterns {
            let keys = self.bounded("KEYS", self.store.keys(pattern)).await?;
            if !keys.is_empty() {
                removed += self.bounded("DEL", self.store.del(&keys)).await?;
            }
        }

        self.pending.lock().acknowledge(&batch);
        info!(
            keys = batch.keys.len(),
            patterns = patterns.len(),
            flushed = batch.flush_namespaces,
            removed,
            "replayed missed primary updates"
        );
        Ok(())
    }

    // == Connect With Retry ==
    /// One bounded reconnect cycle: connect, then replay missed updates.
    /// Ends in `Connected`, or in `Disconnected` once the attempts are used up.
    async fn connect_with_retry(&self) -> bool {
        self.state.set(BackendState::Connecting);

        let timeout = self.connect_timeout;
        let result = self
            .policy
            .execute(|attempt| async move {
                debug!(attempt = attempt + 1, "connecting to primary tier");
                match tokio::time::timeout(timeout, self.store.connect()).await {
                    Ok(connected) => connected?,
                    Err(_) => {
                        return Err(CacheError::Timeout(format!(
                            "connect exceeded {:?}",
                            timeout
                        )))
                    }
                }
                self.replay_pending().await
            })
            .await;

        match result {
            Ok(()) => {
                self.state.set(BackendState::Connected);
                info!("primary tier connected");
                self.replay_if_connected();
                true
            }
            Err(e) => {
                self.state.set(BackendState::Disconnected);
                error!(
                    attempts = self.policy.max_attempts,
                    error = %e,
                    "primary tier unreachable, staying local-only until reinitialized"
                );
                false
            }
        }
    }
}

// == Tiered Cache ==
/// The cache service shared by every request handler of the host process.
pub struct TieredCache {
    primary: Option<Primary>,
    remote_required: bool,
    local: Arc<LocalStore>,
    stats: Arc<StatsCollector>,
    namespaces: KeyNamespaces,
    entity_namespaces: Vec<String>,
    health_timeout: Duration,
    probe_seq: AtomicU64,
}

impl TieredCache {
    // == Constructors ==
    /// A cache with no primary tier at all.
    pub fn local_only(config: &Config) -> Self {
        Self::build(config, None)
    }

    /// A cache over the given remote store. The tier stays `Disconnected`
    /// until [`TieredCache::initialize`] is called.
    pub fn with_remote(config: &Config, remote: Arc<dyn RemoteStore>) -> Self {
        Self::build(config, Some(remote))
    }

    /// Builds the cache from configuration, falling back to local-only mode
    /// unless the remote tier is required.
    pub fn from_config(config: &Config) -> Result<Self> {
        if !config.remote_enabled {
            if config.remote_required {
                return Err(CacheError::Configuration(
                    "remote tier is required but disabled".to_string(),
                ));
            }
            info!("remote tier disabled, running local-only");
            return Ok(Self::local_only(config));
        }

        let Some(info) = config.remote_connection_info() else {
            if config.remote_required {
                return Err(CacheError::Configuration(
                    "remote tier is required but REDIS_URL / REDIS_HOST is not set".to_string(),
                ));
            }
            warn!("no remote connection parameters, running local-only");
            return Ok(Self::local_only(config));
        };

        match info.and_then(RedisStore::open) {
            Ok(store) => Ok(Self::with_remote(config, Arc::new(store))),
            Err(e) if config.remote_required => Err(e),
            Err(e) => {
                warn!(error = %e, "remote tier misconfigured, running local-only");
                Ok(Self::local_only(config))
            }
        }
    }

    fn build(config: &Config, remote: Option<Arc<dyn RemoteStore>>) -> Self {
        let stats = Arc::new(StatsCollector::new());
        let namespaces = KeyNamespaces::with_overrides(&config.ttl_overrides);
        let primary = remote.map(|store| Primary {
            store,
            state: Arc::new(StateCell::new(BackendState::Disconnected)),
            pending: Arc::new(Mutex::new(PendingInvalidations::new(
                config.pending_max_entries,
            ))),
            flush_patterns: Arc::new(namespaces.flush_patterns()),
            stats: stats.clone(),
            policy: RetryPolicy::from_config(config),
            connect_timeout: config.connect_timeout(),
            command_timeout: config.command_timeout(),
        });

        Self {
            primary,
            remote_required: config.remote_required,
            local: Arc::new(LocalStore::new(
                config.local_max_entries,
                config.local_default_ttl,
            )),
            stats,
            namespaces,
            entity_namespaces: config.entity_namespaces.clone(),
            health_timeout: config.health_timeout(),
            probe_seq: AtomicU64::new(0),
        }
    }

    // == Lifecycle ==
    /// Connects the primary tier with the bounded retry policy.
    ///
    /// Fails only when the remote tier is required and stays unreachable.
    pub async fn initialize(&self) -> Result<BackendState> {
        let Some(primary) = &self.primary else {
            return Ok(BackendState::Disabled);
        };

        if primary.connect_with_retry().await {
            return Ok(BackendState::Connected);
        }
        if self.remote_required {
            return Err(CacheError::Connection(
                "required remote tier is unreachable".to_string(),
            ));
        }
        Ok(primary.state.get())
    }

    /// Drops the current connection and runs a fresh connect cycle,
    /// clearing a previous retry exhaustion.
    pub async fn reinitialize(&self) -> Result<BackendState> {
        if let Some(primary) = &self.primary {
            info!("reinitializing primary tier");
            primary.store.disconnect().await;
            primary.state.set(BackendState::Disconnected);
        }
        self.initialize().await
    }

    pub fn backend_state(&self) -> BackendState {
        self.primary
            .as_ref()
            .map(|p| p.state.get())
            .unwrap_or(BackendState::Disabled)
    }

    fn available_primary(&self) -> Option<&Primary> {
        self.primary.as_ref().filter(|p| p.available())
    }

    /// Records a key whose primary copy may now be stale.
    fn primary_missed_key(&self, key: &str) {
        if let Some(primary) = &self.primary {
            primary.miss_key(key);
        }
    }

    fn primary_missed_pattern(&self, pattern: &str) {
        if let Some(primary) = &self.primary {
            primary.miss_pattern(pattern);
        }
    }

    // == Get ==
    /// Returns the cached value, or None on a miss in both tiers.
    ///
    /// A primary value that fails to decode falls through to the local
    /// tier. Exactly one hit or miss is recorded per call.
    pub async fn get<T: DeserializeOwned>(
        &self,
        ty: &str,
        id: &str,
        suffix: Option<&str>,
    ) -> Option<T> {
        let key = self.namespaces.build_key(ty, id, suffix);

        if let Some(primary) = self.available_primary() {
            if let Ok(Some(raw)) = primary.call("GET", &key, primary.store.get(&key)).await {
                match serde_json::from_str(&raw) {
                    Ok(value) => {
                        debug!(key = %key, tier = "primary", "cache hit");
                        self.stats.record_hit();
                        return Some(value);
                    }
                    Err(e) => {
                        warn!(key = %key, tier = "primary", error = %e, "cached value could not be decoded");
                        self.stats.record_error();
                    }
                }
            }
        }

        let Some(raw) = self.local.get(&key) else {
            debug!(key = %key, "cache miss");
            self.stats.record_miss();
            return None;
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!(key = %key, tier = "local", "cache hit");
                self.stats.record_hit();
                Some(value)
            }
            Err(e) => {
                warn!(key = %key, tier = "local", error = %e, "cached value could not be decoded");
                self.stats.record_error();
                self.stats.record_miss();
                None
            }
        }
    }

    // == Set ==
    /// Stores a value in both tiers. `ttl` of None or 0 uses the type's default TTL.
    ///
    /// Returns false only when the value cannot be serialized.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        ty: &str,
        id: &str,
        value: &T,
        ttl: Option<u64>,
        suffix: Option<&str>,
    ) -> bool {
        let key = self.namespaces.build_key(ty, id, suffix);
        let ttl = ttl
            .filter(|t| *t > 0)
            .unwrap_or_else(|| self.namespaces.default_ttl(ty));

        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key = %key, error = %e, "value could not be serialized");
                self.stats.record_error();
                return false;
            }
        };

        let written = match self.available_primary() {
            Some(primary) => primary
                .call("SETEX", &key, primary.store.set_ex(&key, &payload, ttl))
                .await
                .is_ok(),
            None => false,
        };
        if !written {
            self.primary_missed_key(&key);
        }

        self.local.set(&key, payload, Some(ttl));
        self.stats.record_set();
        debug!(key = %key, ttl, "cache set");
        true
    }

    // == Delete ==
    /// Removes the key from both tiers; true if either tier had it.
    pub async fn delete(&self, ty: &str, id: &str, suffix: Option<&str>) -> bool {
        let key = self.namespaces.build_key(ty, id, suffix);

        let mut removed = false;
        let mut primary_done = false;
        if let Some(primary) = self.available_primary() {
            let keys = [key.clone()];
            if let Ok(count) = primary.call("DEL", &key, primary.store.del(&keys)).await {
                removed = count > 0;
                primary_done = true;
            }
        }
        if !primary_done {
            self.primary_missed_key(&key);
        }
        removed |= self.local.delete(&key);

        self.stats.record_delete();
        debug!(key = %key, removed, "cache delete");
        removed
    }

    // == Exists ==
    pub async fn exists(&self, ty: &str, id: &str, suffix: Option<&str>) -> bool {
        let key = self.namespaces.build_key(ty, id, suffix);

        if let Some(primary) = self.available_primary() {
            if let Ok(true) = primary.call("EXISTS", &key, primary.store.exists(&key)).await {
                return true;
            }
        }
        self.local.exists(&key)
    }

    // == Get TTL ==
    /// Remaining TTL in seconds; `-2` when no reachable tier has the key,
    /// `-1` when the key exists without a known expiry.
    pub async fn get_ttl(&self, ty: &str, id: &str, suffix: Option<&str>) -> i64 {
        let key = self.namespaces.build_key(ty, id, suffix);

        if let Some(primary) = self.available_primary() {
            match primary.call("TTL", &key, primary.store.ttl(&key)).await {
                Ok(ttl) if ttl >= -1 => return ttl,
                _ => {}
            }
        }
        self.local.ttl(&key).map(|t| t as i64).unwrap_or(-2)
    }

    // == Set TTL ==
    /// Resets the expiry in both tiers; true if either tier had the key.
    pub async fn set_ttl(&self, ty: &str, id: &str, ttl: u64, suffix: Option<&str>) -> bool {
        let key = self.namespaces.build_key(ty, id, suffix);
        let ttl = ttl.max(1);

        let primary_result = match self.available_primary() {
            Some(primary) => primary
                .call("EXPIRE", &key, primary.store.expire(&key, ttl))
                .await
                .ok(),
            None => None,
        };
        if primary_result.is_none() {
            self.primary_missed_key(&key);
        }
        let updated = self.local.expire(&key, ttl) | primary_result.unwrap_or(false);
        updated
    }

    // == Delete Pattern ==
    /// Deletes every key matching the glob in both tiers.
    ///
    /// Returns the number of distinct keys removed. A failure in one tier
    /// does not roll back the other.
    pub async fn delete_pattern(&self, pattern: &str) -> usize {
        let mut removed: HashSet<String> = HashSet::new();

        let mut primary_done = false;
        if let Some(primary) = self.available_primary() {
            if let Ok(keys) = primary.call("KEYS", pattern, primary.store.keys(pattern)).await {
                if keys.is_empty() {
                    primary_done = true;
                } else if primary
                    .call("DEL", pattern, primary.store.del(&keys))
                    .await
                    .is_ok()
                {
                    removed.extend(keys);
                    primary_done = true;
                }
            }
        }
        if !primary_done {
            self.primary_missed_pattern(pattern);
        }
        removed.extend(self.local.delete_pattern(pattern));

        self.stats.record_delete();
        info!(pattern = %pattern, removed = removed.len(), "pattern invalidation");
        removed.len()
    }

    // == Invalidate Entity ==
    /// Drops every key derived from `entity_id` across the entity namespaces:
    /// the bare key and all of its suffixed variants.
    pub async fn invalidate_entity(&self, entity_id: &str) -> usize {
        let id = escape_glob(entity_id);
        let mut total = 0;

        for ty in &self.entity_namespaces {
            let prefix = escape_glob(&self.namespaces.prefix(ty));
            total += self.delete_pattern(&format!("{}{}", prefix, id)).await;
            total += self.delete_pattern(&format!("{}{}:*", prefix, id)).await;
        }

        info!(entity = %entity_id, removed = total, "entity invalidated");
        total
    }

    // == Get Or Set ==
    /// Returns the cached value, or runs `loader`, caches its result and returns it.
    ///
    /// Loader errors are returned unchanged and nothing is cached.
    pub async fn get_or_set<T, F, Fut, E>(
        &self,
        ty: &str,
        id: &str,
        suffix: Option<&str>,
        ttl: Option<u64>,
        loader: F,
    ) -> std::result::Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        if let Some(cached) = self.get(ty, id, suffix).await {
            return Ok(cached);
        }
        let value = loader().await?;
        self.set(ty, id, &value, ttl, suffix).await;
        Ok(value)
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            counters: self.stats.snapshot(),
            local_entries: self.local.len(),
            local_max_entries: self.local.max_entries(),
            local_evictions: self.local.evictions(),
            pending_invalidations: self
                .primary
                .as_ref()
                .map(|p| p.pending.lock().len())
                .unwrap_or(0),
            primary: self.backend_state(),
        }
    }

    pub fn reset_stats(&self) {
        info!("cache statistics reset");
        self.stats.reset();
    }

    /// Flushes the local tier, returning how many entries were dropped.
    pub fn clear_local(&self) -> usize {
        let cleared = self.local.clear();
        info!(cleared, "local tier flushed");
        cleared
    }

    /// Handle to the local tier, for the background cleanup task.
    pub fn local_store(&self) -> Arc<LocalStore> {
        self.local.clone()
    }

    pub fn namespaces(&self) -> &KeyNamespaces {
        &self.namespaces
    }

    // == Health Check ==
    /// Writes a short-lived probe to each tier, reads it back and compares.
    ///
    /// The primary probe is bounded by the health timeout; a timeout counts
    /// as a failed round trip.
    pub async fn health_check(&self) -> HealthReport {
        let started = Instant::now();
        let seq = self.probe_seq.fetch_add(1, Ordering::Relaxed);
        let key = format!("health:probe:{}:{}", std::process::id(), seq);
        let probe = Probe {
            seq,
            at: Utc::now().timestamp_millis(),
        };

        let local_ok = self.probe_local(&key, &probe);

        let primary_ok = match &self.primary {
            None => None,
            Some(primary) if !primary.available() => Some(false),
            Some(primary) => Some(
                tokio::time::timeout(self.health_timeout, probe_primary(primary, &key, &probe))
                    .await
                    .unwrap_or(false),
            ),
        };

        let status = HealthStatus::evaluate(primary_ok, local_ok);
        if status != HealthStatus::Healthy {
            warn!(?status, ?primary_ok, local_ok, "cache health check");
        }

        HealthReport {
            status,
            primary: PrimaryHealth {
                state: self.backend_state(),
                round_trip: primary_ok,
            },
            local: LocalHealth {
                round_trip: local_ok,
                entries: self.local.len(),
                max_entries: self.local.max_entries(),
            },
            latency_ms: started.elapsed().as_millis() as u64,
            checked_at: Utc::now(),
        }
    }

    fn probe_local(&self, key: &str, probe: &Probe) -> bool {
        let Ok(payload) = serde_json::to_string(probe) else {
            return false;
        };
        let read_back = self
            .local
            .round_trip(key, payload, PROBE_TTL)
            .and_then(|raw| serde_json::from_str::<Probe>(&raw).ok());
        read_back.as_ref() == Some(probe)
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Probe {
    seq: u64,
    at: i64,
}

async fn probe_primary(primary: &Primary, key: &str, probe: &Probe) -> bool {
    let Ok(payload) = serde_json::to_string(probe) else {
        return false;
    };
    if primary
        .call("SETEX", key, primary.store.set_ex(key, &payload, PROBE_TTL))
        .await
        .is_err()
    {
        return false;
    }

    let read_back = primary.call("GET", key, primary.store.get(key)).await;
    let keys = [key.to_string()];
    let _ = primary.call("DEL", key, primary.store.del(&keys)).await;

    matches!(read_back, Ok(Some(raw)) if serde_json::from_str::<Probe>(&raw).ok().as_ref() == Some(probe))
}
