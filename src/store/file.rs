use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tokio::fs;

use super::{RecordStore, StoreError};

/// One JSON file per namespace under a configured directory. This is the
/// durable analog of the original app's local-storage records.
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path_for(&self, namespace: &str) -> PathBuf {
        // Namespaces are internal (prefix plus UUID); anything unexpected is
        // flattened to keep the file name safe.
        let file: String = namespace
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{}.json", file))
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn get(&self, namespace: &str) -> Result<Option<JsonValue>, StoreError> {
        let path = self.path_for(namespace);
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn put(&self, namespace: &str, doc: JsonValue) -> Result<(), StoreError> {
        let path = self.path_for(namespace);
        let bytes = serde_json::to_vec(&doc)?;
        fs::write(&path, bytes).await?;
        Ok(())
    }

    async fn delete(&self, namespace: &str) -> Result<(), StoreError> {
        let path = self.path_for(namespace);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
