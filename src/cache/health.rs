//! Health report types for the synthetic round-trip probe.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::remote::BackendState;

// == Health Status ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    /// Combines the probe outcomes of both tiers.
    ///
    /// `primary` is None when no primary tier is configured; local-only mode
    /// is a supported deployment, so a working local tier is then healthy.
    pub fn evaluate(primary: Option<bool>, local: bool) -> Self {
        match (primary, local) {
            (None, true) | (Some(true), true) => HealthStatus::Healthy,
            (Some(true), false) | (Some(false), true) => HealthStatus::Degraded,
            (_, false) => HealthStatus::Unhealthy,
        }
    }
}

/// Primary tier part of a [`HealthReport`].
#[derive(Debug, Clone, Serialize)]
pub struct PrimaryHealth {
    pub state: BackendState,
    /// None when no primary tier is configured; false when it is down
    pub round_trip: Option<bool>,
}

/// Local tier part of a [`HealthReport`].
#[derive(Debug, Clone, Serialize)]
pub struct LocalHealth {
    pub round_trip: bool,
    pub entries: usize,
    pub max_entries: usize,
}

// == Health Report ==
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub primary: PrimaryHealth,
    pub local: LocalHealth,
    pub latency_ms: u64,
    pub checked_at: DateTime<Utc>,
}
