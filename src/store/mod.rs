pub mod file;
pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("store database error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Namespaced JSON document store. Every persisted record in the system goes
/// through this contract; the concrete medium is picked by configuration.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, namespace: &str) -> Result<Option<JsonValue>, StoreError>;

    async fn put(&self, namespace: &str, doc: JsonValue) -> Result<(), StoreError>;

    async fn delete(&self, namespace: &str) -> Result<(), StoreError>;
}

pub type SharedStore = Arc<dyn RecordStore>;

pub async fn load_or_default<T>(store: &dyn RecordStore, namespace: &str) -> Result<T, StoreError>
where
    T: DeserializeOwned + Default,
{
    match store.get(namespace).await? {
        Some(doc) => Ok(serde_json::from_value(doc)?),
        None => Ok(T::default()),
    }
}

pub async fn save<T>(store: &dyn RecordStore, namespace: &str, value: &T) -> Result<(), StoreError>
where
    T: Serialize,
{
    store.put(namespace, serde_json::to_value(value)?).await
}

/// Stable namespace keys, one document per key.
pub mod ns {
    use uuid::Uuid;

    pub fn listings() -> String {
        "listings".to_string()
    }

    pub fn applications() -> String {
        "applications".to_string()
    }

    pub fn actions(user_id: Uuid) -> String {
        format!("actions/{}", user_id)
    }

    pub fn points(user_id: Uuid) -> String {
        format!("points/{}", user_id)
    }

    pub fn notifications(user_id: Uuid) -> String {
        format!("notifications/{}", user_id)
    }

    pub fn messages(application_id: Uuid) -> String {
        format!("messages/{}", application_id)
    }

    pub fn status_history(application_id: Uuid) -> String {
        format!("status-history/{}", application_id)
    }
}
