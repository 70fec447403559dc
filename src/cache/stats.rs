//! Cache Statistics Module
//!
//! Process-wide counters for cache effectiveness. Counters are atomics so a
//! single collector can be shared by every request handler without locking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

// == Stats Snapshot ==
/// Point-in-time view of the collector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub errors: u64,
    /// Completed `get` calls; always `hits + misses`
    pub total_requests: u64,
    /// `hits / total_requests * 100`, rounded to two decimals
    pub hit_rate_percent: f64,
    pub uptime_seconds: u64,
    pub start_time: DateTime<Utc>,
}

// == Stats Collector ==
/// Monotonic counters; reset only through [`StatsCollector::reset`].
#[derive(Debug)]
pub struct StatsCollector {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
    errors: AtomicU64,
    started: Mutex<(Instant, DateTime<Utc>)>,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            sets: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            started: Mutex::new((Instant::now(), Utc::now())),
        }
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_set(&self) {
        self.sets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    // == Snapshot ==
    pub fn snapshot(&self) -> StatsSnapshot {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total_requests = hits + misses;
        let (started, start_time) = *self.started.lock();

        StatsSnapshot {
            hits,
            misses,
            sets: self.sets.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            total_requests,
            hit_rate_percent: hit_rate_percent(hits, total_requests),
            uptime_seconds: started.elapsed().as_secs(),
            start_time,
        }
    }

    // == Reset ==
    /// Zeroes every counter and restarts the uptime clock.
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.sets.store(0, Ordering::Relaxed);
        self.deletes.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
        *self.started.lock() = (Instant::now(), Utc::now());
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Hit rate as a percentage with two decimals; 0 when nothing was requested.
pub fn hit_rate_percent(hits: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (hits as f64 / total as f64 * 10_000.0).round() / 100.0
}
