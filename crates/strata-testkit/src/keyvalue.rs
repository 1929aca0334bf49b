//! In-memory key/value store standing in for browser local storage.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use strata_core::effects::KeyValueStore;
use strata_core::errors::Result;

#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value before a test runs.
    pub fn seed(&self, key: &str, value: &str) {
        self.items
            .lock()
            .unwrap()
            .insert(key.to_owned(), value.to_owned());
    }

    /// Synchronous peek for assertions.
    pub fn peek(&self, key: &str) -> Option<String> {
        self.items.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.lock().unwrap().get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items
            .lock()
            .unwrap()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        self.items.lock().unwrap().remove(key);
        Ok(())
    }
}
