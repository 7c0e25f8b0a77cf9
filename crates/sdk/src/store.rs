use crate::reconciler::{LocalEvent, ReconcileError};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::warn;

/// Durable string storage on the client side. Modeled after the storage
/// primitives available on end-user devices, so reads and writes are
/// infallible and values are opaque strings.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn remove(&self, key: &str);
}

#[derive(Default)]
pub struct InMemoryKeyValueStore {
    values: Mutex<HashMap<String, String>>,
    writes: Mutex<usize>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set` calls performed, for asserting on write amplification
    pub fn write_count(&self) -> usize {
        *self.writes.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: String) {
        *self.writes.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        self.values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        self.values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
    }
}

/// The locally cached event list for one user, stored as a single json
/// document under a user scoped key.
pub struct LocalEventCache {
    store: std::sync::Arc<dyn KeyValueStore>,
    key: String,
}

impl LocalEventCache {
    pub fn new(store: std::sync::Arc<dyn KeyValueStore>, user_scope: &str) -> Self {
        Self {
            store,
            key: format!("tempo.events.{}", user_scope),
        }
    }

    /// A corrupt cache document is treated as empty rather than wedging the
    /// client, the next reconcile rebuilds it from the server.
    pub fn load(&self) -> Vec<LocalEvent> {
        let raw = match self.store.get(&self.key) {
            Some(raw) => raw,
            None => return Vec::new(),
        };
        match serde_json::from_str(&raw) {
            Ok(events) => events,
            Err(e) => {
                warn!("Discarding unreadable local event cache: {:?}", e);
                Vec::new()
            }
        }
    }

    pub fn persist(&self, events: &[LocalEvent]) -> Result<(), ReconcileError> {
        let raw = serde_json::to_string(events)
            .map_err(|e| ReconcileError::Storage(e.to_string()))?;
        self.store.set(&self.key, raw);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn cache_is_scoped_per_user() {
        let store = Arc::new(InMemoryKeyValueStore::new());
        let alice = LocalEventCache::new(store.clone(), "alice");
        let bob = LocalEventCache::new(store.clone(), "bob");

        let event = LocalEvent {
            id: "evt_1".into(),
            title: "Dentist".into(),
            date: "2025-03-10".into(),
            ..Default::default()
        };
        alice.persist(&[event]).unwrap();

        assert_eq!(alice.load().len(), 1);
        assert!(bob.load().is_empty());
    }

    #[test]
    fn corrupt_cache_reads_as_empty() {
        let store = Arc::new(InMemoryKeyValueStore::new());
        store.set("tempo.events.alice", "{not json".into());
        let cache = LocalEventCache::new(store, "alice");
        assert!(cache.load().is_empty());
    }
}
