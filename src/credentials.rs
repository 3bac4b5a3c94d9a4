//! Short-lived Credential Store
//!
//! Holds provider API keys for the lifetime of one session. Every entry
//! carries an expiry; a read past it evicts the entry and reports nothing,
//! never the stale value.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, TimeDelta, Utc};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use crate::clock::{Clock, SharedClock, SystemClock};

/// Credential capability shared by the session and both provider clients
pub trait CredentialStore: Send + Sync {
    /// Store `value` under `name`, replacing any existing entry
    fn set(&self, name: &str, value: SecretString, ttl_hours: u32);

    /// Current value, or `None` if never set or expired (expired entries are evicted)
    fn get(&self, name: &str) -> Option<SecretString>;

    /// Remove the entry if present
    fn clear(&self, name: &str);

    /// Expiry of the stored entry, if any
    fn expiration_of(&self, name: &str) -> Option<DateTime<Utc>>;
}

pub type SharedCredentials = Arc<dyn CredentialStore>;

struct CredentialEntry {
    value: SecretString,
    expires_at: DateTime<Utc>,
}

/// In-memory store with an injectable clock
pub struct InMemoryCredentialStore {
    entries: RwLock<HashMap<String, CredentialEntry>>,
    clock: SharedClock,
}

impl std::fmt::Debug for InMemoryCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self
            .entries
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .keys()
            .cloned()
            .collect();
        f.debug_struct("InMemoryCredentialStore")
            .field("keys", &names)
            .field("values", &"[REDACTED]")
            .finish()
    }
}

impl Default for InMemoryCredentialStore {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl InMemoryCredentialStore {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn set(&self, name: &str, value: SecretString, ttl_hours: u32) {
        let expires_at = self.clock.now() + TimeDelta::hours(i64::from(ttl_hours));
        let mut entries = self.entries.write().unwrap_or_else(|p| p.into_inner());
        entries.insert(name.to_string(), CredentialEntry { value, expires_at });
        info!("Stored credential {} (expires {})", name, expires_at);
    }

    fn get(&self, name: &str) -> Option<SecretString> {
        let now = self.clock.now();
        let mut entries = self.entries.write().unwrap_or_else(|p| p.into_inner());

        let expired = match entries.get(name) {
            None => return None,
            Some(entry) => now > entry.expires_at,
        };

        if expired {
            entries.remove(name);
            debug!("Credential {} expired and was evicted", name);
            return None;
        }

        entries
            .get(name)
            .map(|entry| SecretString::from(entry.value.expose_secret().to_owned()))
    }

    fn clear(&self, name: &str) {
        let mut entries = self.entries.write().unwrap_or_else(|p| p.into_inner());
        if entries.remove(name).is_some() {
            info!("Cleared credential {}", name);
        }
    }

    fn expiration_of(&self, name: &str) -> Option<DateTime<Utc>> {
        self.entries
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(name)
            .map(|entry| entry.expires_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::constants::credentials as cred_constants;
    use std::time::Duration;

    fn store() -> (Arc<ManualClock>, InMemoryCredentialStore) {
        let clock = Arc::new(ManualClock::starting_now());
        let store = InMemoryCredentialStore::new(clock.clone());
        (clock, store)
    }

    fn secret(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    #[test]
    fn test_set_and_get() {
        let (_clock, store) = store();
        store.set("LLM_API_KEY", secret("sk-test"), 48);

        let value = store.get("LLM_API_KEY").unwrap();
        assert_eq!(value.expose_secret(), "sk-test");
    }

    #[test]
    fn test_missing_key_is_absent() {
        let (_clock, store) = store();
        assert!(store.get("TTS_API_KEY").is_none());
        assert!(store.expiration_of("TTS_API_KEY").is_none());
    }

    #[test]
    fn test_expired_key_is_evicted() {
        let (clock, store) = store();
        store.set("LLM_API_KEY", secret("sk-test"), 1);

        clock.advance(Duration::from_secs(2 * 3600));

        assert!(store.get("LLM_API_KEY").is_none());
        assert!(store.expiration_of("LLM_API_KEY").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_key_valid_at_exact_expiry() {
        let (clock, store) = store();
        store.set("LLM_API_KEY", secret("sk-test"), 1);

        clock.advance(Duration::from_secs(3600));
        assert!(store.get("LLM_API_KEY").is_some());
    }

    #[test]
    fn test_set_overwrites_and_extends() {
        let (clock, store) = store();
        store.set("LLM_API_KEY", secret("old"), 1);
        let first_expiry = store.expiration_of("LLM_API_KEY").unwrap();

        clock.advance(Duration::from_secs(1800));
        store.set("LLM_API_KEY", secret("new"), 1);

        assert_eq!(store.get("LLM_API_KEY").unwrap().expose_secret(), "new");
        assert!(store.expiration_of("LLM_API_KEY").unwrap() > first_expiry);
    }

    #[test]
    fn test_default_ttl_is_48_hours() {
        let (clock, store) = store();
        store.set("TTS_API_KEY", secret("xi-key"), cred_constants::DEFAULT_TTL_HOURS);

        let expected = clock.now() + TimeDelta::hours(48);
        assert_eq!(store.expiration_of("TTS_API_KEY"), Some(expected));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let (_clock, store) = store();
        store.set("LLM_API_KEY", secret("sk-test"), 48);

        store.clear("LLM_API_KEY");
        store.clear("LLM_API_KEY");
        store.clear("NEVER_SET");

        assert!(store.get("LLM_API_KEY").is_none());
    }

    #[test]
    fn test_debug_redacts_values() {
        let (_clock, store) = store();
        store.set("LLM_API_KEY", secret("sk-very-secret"), 48);

        let debug = format!("{:?}", store);
        assert!(debug.contains("LLM_API_KEY"));
        assert!(!debug.contains("sk-very-secret"));
    }
}
