//! MemoryConfigStore — a `ConfigStore` backed by an in-process map.
//!
//! Useful as a composition-root stand-in for the remote table and in tests.
//! Counts every fetch so callers can observe cache behaviour.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use super::traits::{ConfigStore, StoreError};
use crate::types::{ConfigRecord, ConfigType};

#[derive(Default)]
pub struct MemoryConfigStore {
    /// config key → record
    records: RwLock<HashMap<String, ConfigRecord>>,
    fetches: AtomicUsize,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load store rows from a JSON array (the remote table's column names).
    pub fn from_json_rows(json: &str) -> Result<Self, StoreError> {
        let rows: Vec<ConfigRecord> = serde_json::from_str(json)?;
        let store = Self::new();
        for row in rows {
            store.upsert(row);
        }
        Ok(store)
    }

    /// Insert or replace the record under its key. Returns the previous one.
    pub fn upsert(&self, record: ConfigRecord) -> Option<ConfigRecord> {
        self.records.write().insert(record.key.clone(), record)
    }

    /// Toggle `is_active`. Returns false if the key is unknown.
    pub fn set_active(&self, config_key: &str, active: bool) -> bool {
        let mut records = self.records.write();
        match records.get_mut(config_key) {
            Some(record) => {
                record.active = active;
                record.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, config_key: &str) -> Option<ConfigRecord> {
        self.records.write().remove(config_key)
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Number of fetch calls served so far (any method).
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn record_fetch(&self) {
        self.fetches.fetch_add(1, Ordering::SeqCst);
    }
}

fn visible(record: &ConfigRecord, active_only: bool) -> bool {
    !active_only || record.active
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn fetch_by_key(
        &self,
        config_key: &str,
        active_only: bool,
    ) -> Result<Option<ConfigRecord>, StoreError> {
        self.record_fetch();
        let records = self.records.read();
        Ok(records
            .get(config_key)
            .filter(|r| visible(r, active_only))
            .cloned())
    }

    async fn fetch_by_keys(
        &self,
        config_keys: &[String],
        active_only: bool,
    ) -> Result<Vec<ConfigRecord>, StoreError> {
        self.record_fetch();
        let records = self.records.read();
        let mut seen = std::collections::HashSet::new();
        Ok(config_keys
            .iter()
            .filter(|k| seen.insert(k.as_str()))
            .filter_map(|k| records.get(k))
            .filter(|r| visible(r, active_only))
            .cloned()
            .collect())
    }

    async fn fetch_by_type(
        &self,
        config_type: ConfigType,
        active_only: bool,
    ) -> Result<Vec<ConfigRecord>, StoreError> {
        self.record_fetch();
        let records = self.records.read();
        let mut matching: Vec<ConfigRecord> = records
            .values()
            .filter(|r| r.config_type == Some(config_type) && visible(r, active_only))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }
}
