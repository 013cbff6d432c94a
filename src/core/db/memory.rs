//! In-memory store backend
//!
//! Not durable. Used by tests and by hosts that keep the session for the
//! lifetime of the process only.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use super::store::{KeyValueStore, StoreError};

#[derive(Debug)]
pub struct MemoryStore {
    entries: DashMap<String, Value>,
    available: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate the backing storage becoming blocked or unavailable
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store is blocked".to_string()))
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn set(&self, key: &str, data: Value) -> Result<Value, StoreError> {
        self.check_available()?;
        self.entries.insert(key.to_string(), data.clone());
        Ok(data)
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.check_available()?;
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.check_available()?;
        self.entries.remove(key);
        Ok(true)
    }

    async fn get_all(&self) -> Result<Vec<Value>, StoreError> {
        self.check_available()?;
        Ok(self
            .entries
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn clear(&self) -> Result<bool, StoreError> {
        self.check_available()?;
        self.entries.clear();
        Ok(true)
    }
}
