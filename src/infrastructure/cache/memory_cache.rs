use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::application::ports::ResultCache;
use crate::domain::{ClassificationResult, Fingerprint};

struct CacheEntry {
    result: ClassificationResult,
    expires_at: Instant,
}

/// In-memory TTL cache behind a single mutex. Lookups evict lazily on
/// read; writers to the same key simply overwrite each other, which is
/// safe because equal fingerprints describe equivalent results.
pub struct MemoryResultCache {
    ttl: Duration,
    entries: Mutex<HashMap<Fingerprint, CacheEntry>>,
}

impl MemoryResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Drops every expired entry. Intended for a periodic housekeeping
    /// task; correctness never depends on it running.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.entries
            .lock()
            .expect("cache lock")
            .retain(|_, entry| entry.expires_at > now);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResultCache for MemoryResultCache {
    fn get(&self, key: &Fingerprint) -> Option<ClassificationResult> {
        let mut entries = self.entries.lock().expect("cache lock");
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.result.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn put(&self, key: Fingerprint, result: ClassificationResult) {
        let entry = CacheEntry {
            result,
            expires_at: Instant::now() + self.ttl,
        };
        self.entries.lock().expect("cache lock").insert(key, entry);
    }
}
