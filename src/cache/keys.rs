//! Key Namespacer
//!
//! Maps a logical `(type, identifier, suffix)` triple to a flat key and
//! resolves the default TTL for each type.

use std::collections::HashMap;

use crate::cache::pattern::escape_glob;

/// Prefix used for types with no registered namespace.
pub const FALLBACK_PREFIX: &str = "cache:";

/// TTL in seconds for types with no registered namespace.
pub const FALLBACK_TTL: u64 = 3600;

const BUILTIN_NAMESPACES: &[(&str, &str, u64)] = &[
    ("user", "user:", 3600),
    ("session", "session:", 86400),
    ("analytics", "analytics:", 1800),
    ("booking", "booking:", 900),
    ("partner", "partner:", 3600),
    ("api", "api:", 300),
    ("dashboard", "dashboard:", 120),
];

// == Namespace ==
/// A registered key prefix and its default TTL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    pub prefix: String,
    pub ttl: u64,
}

// == Key Namespaces ==
/// Registry of type tags to namespaces.
#[derive(Debug, Clone)]
pub struct KeyNamespaces {
    table: HashMap<String, Namespace>,
}

impl KeyNamespaces {
    /// Creates a registry holding only the built-in types.
    pub fn new() -> Self {
        let table = BUILTIN_NAMESPACES
            .iter()
            .map(|(ty, prefix, ttl)| {
                (
                    ty.to_string(),
                    Namespace {
                        prefix: prefix.to_string(),
                        ttl: *ttl,
                    },
                )
            })
            .collect();
        Self { table }
    }

    /// Creates the built-in registry with TTL overrides applied.
    ///
    /// An override for an unknown type registers it with `<type>:` as prefix.
    pub fn with_overrides(overrides: &HashMap<String, u64>) -> Self {
        let mut namespaces = Self::new();
        for (ty, ttl) in overrides {
            let prefix = namespaces
                .get(ty)
                .map(|ns| ns.prefix.clone())
                .unwrap_or_else(|| format!("{}:", ty));
            namespaces.register(ty, &prefix, *ttl);
        }
        namespaces
    }

    /// Registers or replaces a namespace. A zero TTL is stored as the fallback TTL.
    pub fn register(&mut self, ty: &str, prefix: &str, ttl: u64) {
        let ttl = if ttl == 0 { FALLBACK_TTL } else { ttl };
        self.table.insert(
            ty.to_string(),
            Namespace {
                prefix: prefix.to_string(),
                ttl,
            },
        );
    }

    pub fn get(&self, ty: &str) -> Option<&Namespace> {
        self.table.get(ty)
    }

    // == Prefix ==
    /// Returns the key prefix for `ty`.
    ///
    /// Unregistered types get `cache:<type>:` so that two different
    /// unregistered types never share keys.
    pub fn prefix(&self, ty: &str) -> String {
        match self.table.get(ty) {
            Some(ns) => ns.prefix.clone(),
            None => format!("{}{}:", FALLBACK_PREFIX, ty),
        }
    }

    // == Build Key ==
    /// Builds the flat key for a logical entry.
    ///
    /// `suffix` is appended as `:suffix` only when non-empty.
    pub fn build_key(&self, ty: &str, identifier: &str, suffix: Option<&str>) -> String {
        let mut key = self.prefix(ty);
        key.push_str(identifier);
        if let Some(suffix) = suffix.filter(|s| !s.is_empty()) {
            key.push(':');
            key.push_str(suffix);
        }
        key
    }

    // == Default TTL ==
    /// Returns the registered TTL for `ty`, or [`FALLBACK_TTL`].
    pub fn default_ttl(&self, ty: &str) -> u64 {
        self.table.get(ty).map(|ns| ns.ttl).unwrap_or(FALLBACK_TTL)
    }
}

impl KeyNamespaces {
    /// Glob patterns covering every key this registry can build: one per
    /// registered prefix plus the fallback prefix.
    pub fn flush_patterns(&self) -> Vec<String> {
        let mut patterns: Vec<String> = self
            .table
            .values()
            .map(|ns| ns.prefix.as_str())
            .chain(std::iter::once(FALLBACK_PREFIX))
            .map(|prefix| format!("{}*", escape_glob(prefix)))
            .collect();
        patterns.sort();
        patterns.dedup();
        patterns
    }
}

impl Default for KeyNamespaces {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_key_registered() {
        let ns = KeyNamespaces::new();
        assert_eq!(ns.build_key("user", "42", None), "user:42");
        assert_eq!(ns.build_key("user", "42", Some("profile")), "user:42:profile");
        assert_eq!(ns.build_key("session", "abc", None), "session:abc");
    }

    #[test]
    fn test_empty_suffix_is_ignored() {
        let ns = KeyNamespaces::new();
        assert_eq!(ns.build_key("user", "42", Some("")), "user:42");
    }

    #[test]
    fn test_unregistered_type_uses_fallback() {
        let ns = KeyNamespaces::new();
        assert_eq!(ns.build_key("invoice", "7", None), "cache:invoice:7");
        assert_eq!(ns.default_ttl("invoice"), FALLBACK_TTL);
        assert_ne!(
            ns.build_key("invoice", "7", None),
            ns.build_key("receipt", "7", None)
        );
    }

    #[test]
    fn test_default_ttls() {
        let ns = KeyNamespaces::new();
        assert_eq!(ns.default_ttl("analytics"), 1800);
        assert_eq!(ns.default_ttl("session"), 86400);
        assert_eq!(ns.default_ttl("dashboard"), 120);
    }

    #[test]
    fn test_overrides() {
        let mut overrides = HashMap::new();
        overrides.insert("analytics".to_string(), 600);
        overrides.insert("report".to_string(), 45);

        let ns = KeyNamespaces::with_overrides(&overrides);
        assert_eq!(ns.default_ttl("analytics"), 600);
        assert_eq!(ns.build_key("analytics", "u1", None), "analytics:u1");
        assert_eq!(ns.default_ttl("report"), 45);
        assert_eq!(ns.build_key("report", "q3", None), "report:q3");
    }

    #[test]
    fn test_register_zero_ttl_uses_fallback() {
        let mut ns = KeyNamespaces::new();
        ns.register("quota", "quota:", 0);
        assert_eq!(ns.default_ttl("quota"), FALLBACK_TTL);
    }

    #[test]
    fn test_flush_patterns_cover_built_keys() {
        let namespaces = KeyNamespaces::new();
        let patterns = namespaces.flush_patterns();
        assert_eq!(patterns.len(), BUILTIN_NAMESPACES.len() + 1);

        for key in [
            namespaces.build_key("user", "1", None),
            namespaces.build_key("dashboard", "u1", Some("weekly")),
            namespaces.build_key("unregistered", "9", None),
        ] {
            assert!(
                patterns
                    .iter()
                    .any(|p| crate::cache::pattern::glob_match(p, &key)),
                "no flush pattern covers {}",
                key
            );
        }
    }
}
