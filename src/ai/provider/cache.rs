//! Response Cache
//!
//! Session-lifetime cache of provider payloads keyed by a deterministic
//! fingerprint of the request parameters. Entries are never evicted; `clear`
//! drops everything at once.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::types::Result;

/// SHA-256 over a request kind and its serialized parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint `params` under `kind`.
    ///
    /// Two calls with the same kind and equal parameters always produce the
    /// same value; the kind keeps text, model-listing and speech entries apart.
    pub fn of<P: Serialize + ?Sized>(kind: &str, params: &P) -> Result<Self> {
        let payload = serde_json::to_vec(params)?;

        let mut hasher = Sha256::new();
        hasher.update(kind.as_bytes());
        hasher.update([0u8]);
        hasher.update(&payload);

        Ok(Self(format!("{:x}", hasher.finalize())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", &self.0[..12.min(self.0.len())])
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    /// Cache hit rate (0.0 - 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

pub struct ResponseCache<V> {
    entries: DashMap<Fingerprint, V>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone> Default for ResponseCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> ResponseCache<V> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up a cached payload. A miss is `None`, never an error.
    pub fn get(&self, key: &Fingerprint) -> Option<V> {
        match self.entries.get(key) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.value().clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn insert(&self, key: Fingerprint, value: V) {
        self.entries.insert(key, value);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Serialize)]
    struct Params<'a> {
        prompt: &'a str,
        model: &'a str,
        temperature: f32,
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let a = Fingerprint::of("text", &Params { prompt: "hi", model: "m", temperature: 0.5 }).unwrap();
        let b = Fingerprint::of("text", &Params { prompt: "hi", model: "m", temperature: 0.5 }).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn test_fingerprint_differs_by_param_and_kind() {
        let base = Fingerprint::of("text", &Params { prompt: "hi", model: "m", temperature: 0.5 }).unwrap();
        let other_temp =
            Fingerprint::of("text", &Params { prompt: "hi", model: "m", temperature: 0.7 }).unwrap();
        let other_kind =
            Fingerprint::of("speech", &Params { prompt: "hi", model: "m", temperature: 0.5 }).unwrap();

        assert_ne!(base, other_temp);
        assert_ne!(base, other_kind);
    }

    #[test]
    fn test_cache_hit_and_miss_stats() {
        let cache: ResponseCache<String> = ResponseCache::new();
        let key = Fingerprint::of("models", "https://example.test/models").unwrap();

        assert!(cache.get(&key).is_none());
        cache.insert(key.clone(), "payload".to_string());
        assert_eq!(cache.get(&key).as_deref(), Some("payload"));

        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clear_drops_entries() {
        let cache: ResponseCache<Vec<u8>> = ResponseCache::new();
        let key = Fingerprint::of("speech", &("hello", "voice")).unwrap();
        cache.insert(key.clone(), vec![1, 2, 3]);

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get(&key).is_none());
    }

    proptest! {
        #[test]
        fn prop_fingerprint_stable_for_equal_inputs(prompt in ".{0,64}", voice in "[a-zA-Z0-9]{1,20}") {
            let a = Fingerprint::of("speech", &(prompt.as_str(), voice.as_str())).unwrap();
            let b = Fingerprint::of("speech", &(prompt.clone(), voice.clone())).unwrap();
            prop_assert_eq!(a, b);
        }
    }
}
