//! # Generation Cache
//!
//! Fingerprint table keyed by relative artifact path. An artifact is only
//! rewritten when the hash of the inputs that produce it changes; entries
//! are only recorded for writes that actually completed, so a failed build
//! retries exactly the artifacts that did not land.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationCache {
    entries: BTreeMap<String, String>,
}

impl GenerationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a persisted cache; a missing or unreadable file is an empty
    /// cache, never an error (worst case everything regenerates).
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(source) => serde_json::from_str(&source).unwrap_or_else(|e| {
                tracing::warn!("discarding malformed generation cache: {e}");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut text = serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string());
        text.push('\n');
        std::fs::write(path, text)
    }

    pub fn matches(&self, artifact: &str, fingerprint: &str) -> bool {
        self.entries.get(artifact).map(String::as_str) == Some(fingerprint)
    }

    /// Record a confirmed write
    pub fn record(&mut self, artifact: &str, fingerprint: String) {
        self.entries.insert(artifact.to_string(), fingerprint);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Sha-256 over an ordered list of inputs, hex-encoded. Inputs are length-
/// delimited so adjacent fields cannot alias each other.
pub(crate) fn fingerprint(inputs: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for input in inputs {
        hasher.update((input.len() as u64).to_le_bytes());
        hasher.update(input);
    }
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_deterministic() {
        let a = fingerprint(&[b"ast", b"styles"]);
        let b = fingerprint(&[b"ast", b"styles"]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_inputs_do_not_alias() {
        assert_ne!(fingerprint(&[b"ab", b"c"]), fingerprint(&[b"a", b"bc"]));
    }

    #[test]
    fn test_cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".pagecraft/cache.json");

        let mut cache = GenerationCache::new();
        cache.record("src/pages/Home.vue", "abc123".to_string());
        cache.save(&path).unwrap();

        let loaded = GenerationCache::load(&path);
        assert!(loaded.matches("src/pages/Home.vue", "abc123"));
        assert!(!loaded.matches("src/pages/Home.vue", "other"));
        assert!(!loaded.matches("unknown", "abc123"));
    }

    #[test]
    fn test_missing_cache_file_is_empty() {
        let cache = GenerationCache::load(Path::new("/nonexistent/cache.json"));
        assert!(cache.is_empty());
    }
}
