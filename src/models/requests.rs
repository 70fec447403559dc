//! Request DTOs for the host API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;
use serde_json::Value;

/// Maximum length of a type tag, identifier, suffix or pattern.
pub const MAX_SEGMENT_LENGTH: usize = 256;

/// Request body for `PUT /cache/:type/:id`
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// Any JSON value to cache
    pub value: Value,
    /// Optional TTL in seconds (type default when absent or 0)
    #[serde(default)]
    pub ttl: Option<u64>,
    #[serde(default)]
    pub suffix: Option<String>,
}

impl SetRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_suffix(self.suffix.as_deref())
    }
}

/// Optional `?suffix=` on single-key routes
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuffixQuery {
    #[serde(default)]
    pub suffix: Option<String>,
}

/// Request body for `POST /invalidate/pattern`
#[derive(Debug, Clone, Deserialize)]
pub struct PatternRequest {
    pub pattern: String,
}

impl PatternRequest {
    pub fn validate(&self) -> Option<String> {
        if self.pattern.trim().is_empty() {
            return Some("Pattern cannot be empty".to_string());
        }
        if self.pattern.len() > MAX_SEGMENT_LENGTH {
            return Some(format!(
                "Pattern exceeds maximum length of {} characters",
                MAX_SEGMENT_LENGTH
            ));
        }
        None
    }
}

/// Validates a path segment (type tag or identifier).
pub fn validate_segment(name: &str, segment: &str) -> Option<String> {
    if segment.is_empty() {
        return Some(format!("{} cannot be empty", name));
    }
    if segment.len() > MAX_SEGMENT_LENGTH {
        return Some(format!(
            "{} exceeds maximum length of {} characters",
            name, MAX_SEGMENT_LENGTH
        ));
    }
    None
}

pub fn validate_suffix(suffix: Option<&str>) -> Option<String> {
    match suffix {
        Some(s) if s.len() > MAX_SEGMENT_LENGTH => Some(format!(
            "Suffix exceeds maximum length of {} characters",
            MAX_SEGMENT_LENGTH
        )),
        _ => None,
    }
}
