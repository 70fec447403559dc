//! Cache Entry Module
//!
//! A serialized value held by the local tier, always with an expiry.

use std::time::{SystemTime, UNIX_EPOCH};

// == Cache Entry ==
/// A single local-tier entry: the serialized payload plus its lifetime.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Serialized (JSON) payload
    pub value: String,
    /// Creation timestamp (Unix milliseconds)
    pub stored_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry expiring `ttl_seconds` from now.
    ///
    /// A zero TTL is raised to one second; entries never live forever
    /// and never start out expired.
    pub fn new(value: String, ttl_seconds: u64) -> Self {
        let now = current_timestamp_ms();
        Self {
            value,
            stored_at: now,
            expires_at: now + ttl_seconds.max(1) * 1000,
        }
    }

    // == Is Expired ==
    /// An entry is expired once the current time reaches its expiration time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }

    // == Expire ==
    /// Moves the expiration to `ttl_seconds` from now.
    pub fn set_ttl(&mut self, ttl_seconds: u64) {
        self.expires_at = current_timestamp_ms() + ttl_seconds.max(1) * 1000;
    }

    /// Remaining lifetime in milliseconds, 0 once expired.
    pub fn ttl_remaining_ms(&self) -> u64 {
        self.expires_at.saturating_sub(current_timestamp_ms())
    }

    /// Remaining lifetime in whole seconds, rounded up so a live entry never reports 0.
    pub fn ttl_remaining(&self) -> u64 {
        self.ttl_remaining_ms().div_ceil(1000)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
