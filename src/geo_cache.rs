use crate::records::GeoRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Storage key for the cached coordinate snapshot.
pub const CACHE_KEY: &str = "client_probe.geo";

/// Entries older than this are treated as absent.
pub const CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Errors crossing the storage boundary. The cache contains them; callers
/// never see one.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Minimal persistent key-value capability (the host's storage facility).
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// The persisted cache entry wrapping a coordinate payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedGeo {
    /// Write timestamp, epoch milliseconds.
    pub ts: i64,
    pub coords: GeoRecord,
    /// Resolved place name; reverse geocoding is disabled, so in practice
    /// always `None`.
    pub place: Option<String>,
}

/// TTL-bounded persistence for the last successful coordinate fetch.
///
/// Both operations degrade instead of raising: a storage or serialization
/// failure turns `read` into a miss and `write` into a no-op, so the
/// feature falls back to "always re-acquire".
pub struct GeoCache<S> {
    store: S,
}

impl<S: KeyValueStore> GeoCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The last coordinate payload, if one was written within the TTL.
    /// A stale entry is ignored, not deleted.
    pub fn read(&self) -> Option<CachedGeo> {
        let raw = match self.store.get(CACHE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!(error = %err, "geo cache read failed");
                return None;
            }
        };
        let entry: CachedGeo = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(error = %err, "geo cache entry unreadable");
                return None;
            }
        };
        let age_ms = now_ms() - entry.ts;
        if age_ms > CACHE_TTL.as_millis() as i64 {
            tracing::debug!(age_ms, "geo cache entry expired");
            return None;
        }
        tracing::debug!(ts = entry.ts, "geo cache hit");
        Some(entry)
    }

    /// Persists the payload unconditionally, overwriting any prior entry.
    pub fn write(&self, coords: &GeoRecord, place: Option<&str>) {
        let entry = CachedGeo {
            ts: now_ms(),
            coords: coords.clone(),
            place: place.map(str::to_string),
        };
        let raw = match serde_json::to_string(&entry) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(error = %err, "geo cache serialize failed");
                return;
            }
        };
        if let Err(err) = self.store.set(CACHE_KEY, &raw) {
            tracing::warn!(error = %err, "geo cache write failed");
            return;
        }
        tracing::debug!(ts = entry.ts, "geo cache write");
    }

    /// The underlying store, for embedders that share it.
    pub fn store(&self) -> &S {
        &self.store
    }
}

pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// In-memory store, for tests and embedders without durable storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl<S: KeyValueStore> KeyValueStore for &S {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        S::get(self, key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        S::set(self, key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords() -> GeoRecord {
        GeoRecord {
            lat: -23.55052,
            lon: -46.633308,
            accuracy: Some(15.0),
            altitude: None,
            altitude_accuracy: None,
            speed: None,
            heading: None,
            ts: 1_700_000_000_000,
            city: None,
        }
    }

    /// Store whose operations always fail.
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err("quota exceeded".into())
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err("quota exceeded".into())
        }
    }

    #[test]
    fn round_trip_within_ttl() {
        let cache = GeoCache::new(MemoryStore::new());
        cache.write(&coords(), None);
        let entry = cache.read().expect("fresh entry");
        assert_eq!(entry.coords, coords());
        assert_eq!(entry.place, None);
    }

    #[test]
    fn stale_entry_reads_as_absent_but_persists() {
        let store = MemoryStore::new();
        let stale = CachedGeo {
            ts: now_ms() - (25 * 60 * 60 * 1000),
            coords: coords(),
            place: None,
        };
        store
            .set(CACHE_KEY, &serde_json::to_string(&stale).unwrap())
            .unwrap();

        let cache = GeoCache::new(&store);
        assert!(cache.read().is_none());
        // Ignored, not deleted.
        assert!(store.get(CACHE_KEY).unwrap().is_some());
    }

    #[test]
    fn entry_just_inside_ttl_still_hits() {
        let store = MemoryStore::new();
        let fresh = CachedGeo {
            ts: now_ms() - (23 * 60 * 60 * 1000),
            coords: coords(),
            place: None,
        };
        store
            .set(CACHE_KEY, &serde_json::to_string(&fresh).unwrap())
            .unwrap();
        assert!(GeoCache::new(&store).read().is_some());
    }

    #[test]
    fn corrupt_entry_is_a_miss() {
        let store = MemoryStore::new();
        store.set(CACHE_KEY, "{not json").unwrap();
        assert!(GeoCache::new(&store).read().is_none());
    }

    #[test]
    fn storage_failures_never_raise() {
        let cache = GeoCache::new(BrokenStore);
        cache.write(&coords(), None);
        assert!(cache.read().is_none());
    }

    #[test]
    fn write_overwrites_wholesale() {
        let cache = GeoCache::new(MemoryStore::new());
        cache.write(&coords(), None);
        let mut moved = coords();
        moved.lat = 48.8584;
        moved.lon = 2.2945;
        cache.write(&moved, None);
        assert_eq!(cache.read().expect("entry").coords, moved);
    }
}
