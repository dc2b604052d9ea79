//! Key/value credential persistence with per-key expiry.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;

/// A stored value and, if it was written with a TTL, when it expires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredValue {
    pub value: String,
    pub expires_at_ms: Option<i64>,
}

/// Browser-storage style persistence used for tokens and PKCE state.
///
/// `get` never returns an entry whose expiry has passed.
pub trait CredentialStore: Send + Sync {
    fn get(&self, key: &str) -> Option<StoredValue>;
    fn set(&self, key: &str, value: String, ttl: Option<Duration>);
    fn remove(&self, key: &str);
}

/// In-process [`CredentialStore`]. Expired entries are evicted on read.
pub struct MemoryCredentialStore {
    entries: Mutex<HashMap<String, StoredValue>>,
    clock: Arc<dyn Clock>,
}

impl MemoryCredentialStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: &str) -> Option<StoredValue> {
        let now_ms = self.clock.now_ms();
        let mut entries = self.entries.lock();
        let expired = entries
            .get(key)?
            .expires_at_ms
            .is_some_and(|expires_at_ms| expires_at_ms <= now_ms);

        if expired {
            tracing::debug!(key, "Evicting expired storage entry");
            entries.remove(key);
            return None;
        }

        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: String, ttl: Option<Duration>) {
        let expires_at_ms = ttl.map(|ttl| self.clock.now_ms() + ttl.as_millis() as i64);
        self.entries.lock().insert(
            key.to_string(),
            StoredValue {
                value,
                expires_at_ms,
            },
        );
    }

    fn remove(&self, key: &str) {
        self.entries.lock().remove(key);
    }
}
