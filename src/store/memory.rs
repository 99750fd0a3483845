use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use super::{RecordStore, StoreError};

/// In-process store. Used by tests, and as the secondary store behind the
/// status-history fallback path.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, JsonValue>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get(&self, namespace: &str) -> Result<Option<JsonValue>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))?;
        Ok(records.get(namespace).cloned())
    }

    async fn put(&self, namespace: &str, doc: JsonValue) -> Result<(), StoreError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))?;
        records.insert(namespace.to_string(), doc);
        Ok(())
    }

    async fn delete(&self, namespace: &str) -> Result<(), StoreError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))?;
        records.remove(namespace);
        Ok(())
    }
}
