//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use redis::{ConnectionAddr, ConnectionInfo, IntoConnectionInfo, RedisConnectionInfo};

use crate::error::{CacheError, Result};

/// Prefix of the per-type TTL override variables, e.g. `CACHE_TTL_ANALYTICS=900`.
const TTL_OVERRIDE_PREFIX: &str = "CACHE_TTL_";

/// Cache service configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Full remote connection URL, takes precedence over the host/port fields
    pub redis_url: Option<String>,
    /// Remote host, used when no URL is given
    pub redis_host: Option<String>,
    /// Remote port
    pub redis_port: u16,
    /// Remote ACL user name
    pub redis_username: Option<String>,
    /// Remote password
    pub redis_password: Option<String>,
    /// Remote logical database index
    pub redis_db: u32,
    /// Whether the remote tier should be used at all
    pub remote_enabled: bool,
    /// Whether startup must fail when the remote tier cannot be set up
    pub remote_required: bool,
    /// Maximum number of entries the local tier can hold
    pub local_max_entries: usize,
    /// TTL in seconds for local entries written without one
    pub local_default_ttl: u64,
    /// Bound on establishing a remote connection, in milliseconds
    pub connect_timeout_ms: u64,
    /// Bound on a single remote command, in milliseconds
    pub command_timeout_ms: u64,
    /// Bound on a whole health probe, in milliseconds
    pub health_timeout_ms: u64,
    /// Connection attempts per (re)connect cycle
    pub max_retries: u32,
    /// First backoff delay, in milliseconds
    pub retry_base_delay_ms: u64,
    /// Backoff ceiling, in milliseconds
    pub retry_max_delay_ms: u64,
    /// Per-type TTL overrides in seconds, keyed by lowercase type tag
    pub ttl_overrides: HashMap<String, u64>,
    /// Types whose keys are dropped by `invalidate_entity`
    pub entity_namespaces: Vec<String>,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// Keys and patterns remembered for replay while the primary tier is down
    pub pending_max_entries: usize,
    /// HTTP port for the host binary
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `REDIS_URL` or `REDIS_HOST` / `REDIS_PORT` / `REDIS_USERNAME` / `REDIS_PASSWORD` / `REDIS_DB`
    /// - `CACHE_REMOTE_ENABLED` (default: true), `CACHE_REMOTE_REQUIRED` (default: false)
    /// - `CACHE_LOCAL_MAX_ENTRIES` (default: 1000), `CACHE_LOCAL_DEFAULT_TTL` (default: 300)
    /// - `CACHE_CONNECT_TIMEOUT_MS` (default: 2000), `CACHE_COMMAND_TIMEOUT_MS` (default: 1000)
    /// - `CACHE_HEALTH_TIMEOUT_MS` (default: 3000)
    /// - `CACHE_MAX_RETRIES` (default: 3), `CACHE_RETRY_BASE_DELAY_MS` (default: 200),
    ///   `CACHE_RETRY_MAX_DELAY_MS` (default: 5000)
    /// - `CACHE_TTL_<TYPE>` per-type TTL overrides
    /// - `CACHE_ENTITY_NAMESPACES` (default: user,session,analytics,booking)
    /// - `CACHE_PENDING_MAX_ENTRIES` (default: 1024)
    /// - `CACHE_CLEANUP_INTERVAL` (default: 60), `SERVER_PORT` (default: 3000)
    pub fn from_env() -> Self {
        Self::from_vars(env::vars())
    }

    /// Builds a Config from an explicit set of variables.
    pub fn from_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars.into_iter().collect();
        let defaults = Self::default();

        let text = |name: &str| {
            vars.get(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let flag = |name: &str, default: bool| match text(name).as_deref() {
            Some("1") | Some("true") | Some("yes") | Some("on") => true,
            Some("0") | Some("false") | Some("no") | Some("off") => false,
            _ => default,
        };

        let ttl_overrides = vars
            .iter()
            .filter_map(|(name, value)| {
                let ty = name.strip_prefix(TTL_OVERRIDE_PREFIX)?;
                let ttl = value.trim().parse::<u64>().ok().filter(|ttl| *ttl > 0)?;
                Some((ty.to_ascii_lowercase(), ttl))
            })
            .collect();

        let entity_namespaces = text("CACHE_ENTITY_NAMESPACES")
            .map(|list| {
                list.split(',')
                    .map(|s| s.trim().to_ascii_lowercase())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.entity_namespaces);

        Self {
            redis_url: text("REDIS_URL"),
            redis_host: text("REDIS_HOST"),
            redis_port: parse_or(&vars, "REDIS_PORT", defaults.redis_port),
            redis_username: text("REDIS_USERNAME"),
            redis_password: vars.get("REDIS_PASSWORD").filter(|v| !v.is_empty()).cloned(),
            redis_db: parse_or(&vars, "REDIS_DB", defaults.redis_db),
            remote_enabled: flag("CACHE_REMOTE_ENABLED", defaults.remote_enabled),
            remote_required: flag("CACHE_REMOTE_REQUIRED", defaults.remote_required),
            local_max_entries: parse_or(&vars, "CACHE_LOCAL_MAX_ENTRIES", defaults.local_max_entries)
                .max(1),
            local_default_ttl: parse_or(&vars, "CACHE_LOCAL_DEFAULT_TTL", defaults.local_default_ttl)
                .max(1),
            connect_timeout_ms: parse_or(&vars, "CACHE_CONNECT_TIMEOUT_MS", defaults.connect_timeout_ms),
            command_timeout_ms: parse_or(&vars, "CACHE_COMMAND_TIMEOUT_MS", defaults.command_timeout_ms),
            health_timeout_ms: parse_or(&vars, "CACHE_HEALTH_TIMEOUT_MS", defaults.health_timeout_ms),
            max_retries: parse_or(&vars, "CACHE_MAX_RETRIES", defaults.max_retries),
            retry_base_delay_ms: parse_or(&vars, "CACHE_RETRY_BASE_DELAY_MS", defaults.retry_base_delay_ms),
            retry_max_delay_ms: parse_or(&vars, "CACHE_RETRY_MAX_DELAY_MS", defaults.retry_max_delay_ms),
            ttl_overrides,
            entity_namespaces,
            cleanup_interval: parse_or(&vars, "CACHE_CLEANUP_INTERVAL", defaults.cleanup_interval)
                .max(1),
            pending_max_entries: parse_or(&vars, "CACHE_PENDING_MAX_ENTRIES", defaults.pending_max_entries)
                .max(1),
            server_port: parse_or(&vars, "SERVER_PORT", defaults.server_port),
        }
    }

    // == Remote Connection ==
    /// Resolves the remote connection parameters, or None when none were
    /// supplied.
    ///
    /// Host parts are passed to the client as structured fields, so
    /// credentials are never re-parsed as a URL.
    pub fn remote_connection_info(&self) -> Option<Result<ConnectionInfo>> {
        if let Some(url) = &self.redis_url {
            return Some(
                url.as_str()
                    .into_connection_info()
                    .map_err(|e| CacheError::Configuration(format!("invalid redis url: {}", e))),
            );
        }

        let host = self.redis_host.as_ref()?;
        Some(Ok(ConnectionInfo {
            addr: ConnectionAddr::Tcp(host.clone(), self.redis_port),
            redis: RedisConnectionInfo {
                db: i64::from(self.redis_db),
                username: self.redis_username.clone(),
                password: self.redis_password.clone(),
                ..Default::default()
            },
        }))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_millis(self.health_timeout_ms)
    }
}

fn parse_or<T: std::str::FromStr>(vars: &HashMap<String, String>, name: &str, default: T) -> T {
    vars.get(name)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: None,
            redis_host: None,
            redis_port: 6379,
            redis_username: None,
            redis_password: None,
            redis_db: 0,
            remote_enabled: true,
            remote_required: false,
            local_max_entries: 1000,
            local_default_ttl: 300,
            connect_timeout_ms: 2000,
            command_timeout_ms: 1000,
            health_timeout_ms: 3000,
            max_retries: 3,
            retry_base_delay_ms: 200,
            retry_max_delay_ms: 5000,
            ttl_overrides: HashMap::new(),
            entity_namespaces: ["user", "session", "analytics", "booking"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            cleanup_interval: 60,
            pending_max_entries: 1024,
            server_port: 3000,
        }
    }
}
