//! Bounded, insertion-ordered cache of opened config records.
//!
//! Eviction is FIFO by first insertion: reads never move an entry, and
//! overwriting an existing key keeps its place in line. Entries never expire
//! on their own; freshness is decided at read time against the caller's TTL.
//!
//! Not synchronized. `ConfigService` keeps it behind a single mutex so that
//! lookup, insert and eviction each happen as one critical section.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use tokio::time::Instant;

use crate::types::{ConfigRecord, DEFAULT_CACHE_CAPACITY};

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub record: ConfigRecord,
    pub inserted_at: Instant,
}

impl CacheEntry {
    pub fn is_fresh_at(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted_at) < ttl
    }
}

#[derive(Debug)]
struct Slot {
    seq: u64,
    entry: CacheEntry,
}

#[derive(Debug)]
pub struct ConfigCache {
    capacity: usize,
    /// config key → slot
    entries: HashMap<String, Slot>,
    /// insertion sequence → config key; first entry is the oldest
    order: BTreeMap<u64, String>,
    next_seq: u64,
}

impl Default for ConfigCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl ConfigCache {
    /// Create a cache holding at most `capacity` keys (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: BTreeMap::new(),
            next_seq: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `key` is physically present, fresh or not.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Fresh entry for `key`, judged against `ttl` right now.
    pub fn get(&self, key: &str, ttl: Duration) -> Option<&CacheEntry> {
        self.get_at(key, ttl, Instant::now())
    }

    pub fn get_at(&self, key: &str, ttl: Duration, now: Instant) -> Option<&CacheEntry> {
        self.entries
            .get(key)
            .map(|slot| &slot.entry)
            .filter(|entry| entry.is_fresh_at(ttl, now))
    }

    /// Insert or overwrite `key`, timestamped now. Returns the evicted key, if any.
    pub fn put(&mut self, key: impl Into<String>, record: ConfigRecord) -> Option<String> {
        self.put_at(key, record, Instant::now())
    }

    pub fn put_at(
        &mut self,
        key: impl Into<String>,
        record: ConfigRecord,
        now: Instant,
    ) -> Option<String> {
        let key = key.into();
        let entry = CacheEntry {
            record,
            inserted_at: now,
        };

        if let Some(slot) = self.entries.get_mut(&key) {
            slot.entry = entry;
            return None;
        }

        let evicted = if self.entries.len() >= self.capacity {
            self.evict_oldest()
        } else {
            None
        };

        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, key.clone());
        self.entries.insert(key, Slot { seq, entry });
        evicted
    }

    /// Drop one entry, or everything when `key` is `None`.
    pub fn invalidate(&mut self, key: Option<&str>) {
        match key {
            Some(key) => {
                if let Some(slot) = self.entries.remove(key) {
                    self.order.remove(&slot.seq);
                }
            }
            None => {
                self.entries.clear();
                self.order.clear();
            }
        }
    }

    fn evict_oldest(&mut self) -> Option<String> {
        let (_, key) = self.order.pop_first()?;
        self.entries.remove(&key);
        Some(key)
    }
}
