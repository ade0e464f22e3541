//! In-process TTL cache for search results.
//!
//! One entry per normalized query string. Entries expire after a fixed TTL
//! and the cache holds a bounded number of entries, evicting oldest-first.
//! The whole cache is lost on restart; that is acceptable for a read-only
//! scrape of slowly-changing inventory.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use lotscan_core::VehicleRecord;

struct CacheEntry {
    key: String,
    stored_at: Instant,
    records: Vec<VehicleRecord>,
}

/// Bounded TTL cache keyed by normalized query string.
#[derive(Clone)]
pub struct SearchCache {
    inner: Arc<Mutex<VecDeque<CacheEntry>>>,
    ttl: Duration,
    max_entries: usize,
}

impl SearchCache {
    #[must_use]
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::new())),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// Returns the cached records for `key` if a live entry exists.
    /// Expired entries are dropped on the way through.
    pub async fn get(&self, key: &str) -> Option<Vec<VehicleRecord>> {
        let mut entries = self.inner.lock().await;
        entries.retain(|entry| entry.stored_at.elapsed() < self.ttl);
        entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.records.clone())
    }

    /// Stores records under `key`, replacing any earlier entry for the same
    /// key and evicting the oldest entries past the size bound.
    pub async fn insert(&self, key: &str, records: Vec<VehicleRecord>) {
        let mut entries = self.inner.lock().await;
        entries.retain(|entry| entry.key != key);
        entries.push_back(CacheEntry {
            key: key.to_owned(),
            stored_at: Instant::now(),
            records,
        });
        while entries.len() > self.max_entries {
            entries.pop_front();
        }
    }
}
