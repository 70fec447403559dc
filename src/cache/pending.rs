//! Pending Invalidations
//!
//! Keys and patterns whose primary-tier write or delete did not happen
//! while the tier was down. They are replayed as deletes before the tier
//! is marked connected again, so the primary never serves a value the
//! local tier already replaced or dropped.

use std::collections::HashSet;

// == Replay Batch ==
/// A snapshot of the pending set, acknowledged once replayed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayBatch {
    pub keys: Vec<String>,
    pub patterns: Vec<String>,
    /// The set overflowed; every cache namespace must be flushed
    pub flush_namespaces: bool,
}

impl ReplayBatch {
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.patterns.is_empty() && !self.flush_namespaces
    }
}

// == Pending Invalidations ==
/// Bounded set of missed primary-tier updates.
///
/// Past `capacity` individual entries the set collapses into a single
/// "flush every namespace" marker.
#[derive(Debug)]
pub struct PendingInvalidations {
    keys: HashSet<String>,
    patterns: HashSet<String>,
    flush_namespaces: bool,
    capacity: usize,
}

impl PendingInvalidations {
    pub fn new(capacity: usize) -> Self {
        Self {
            keys: HashSet::new(),
            patterns: HashSet::new(),
            flush_namespaces: false,
            capacity: capacity.max(1),
        }
    }

    pub fn record_key(&mut self, key: &str) {
        if self.flush_namespaces || self.keys.contains(key) {
            return;
        }
        if self.len() >= self.capacity {
            self.overflow();
            return;
        }
        self.keys.insert(key.to_string());
    }

    pub fn record_pattern(&mut self, pattern: &str) {
        if self.flush_namespaces || self.patterns.contains(pattern) {
            return;
        }
        if self.len() >= self.capacity {
            self.overflow();
            return;
        }
        self.patterns.insert(pattern.to_string());
    }

    fn overflow(&mut self) {
        self.keys.clear();
        self.patterns.clear();
        self.flush_namespaces = true;
    }

    pub fn len(&self) -> usize {
        self.keys.len() + self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0 && !self.flush_namespaces
    }

    pub fn snapshot(&self) -> ReplayBatch {
        ReplayBatch {
            keys: self.keys.iter().cloned().collect(),
            patterns: self.patterns.iter().cloned().collect(),
            flush_namespaces: self.flush_namespaces,
        }
    }

    /// Forgets what `batch` replayed. Entries recorded after the snapshot stay.
    pub fn acknowledge(&mut self, batch: &ReplayBatch) {
        for key in &batch.keys {
            self.keys.remove(key);
        }
        for pattern in &batch.patterns {
            self.patterns.remove(pattern);
        }
        if batch.flush_namespaces {
            self.flush_namespaces = false;
        }
    }
}
