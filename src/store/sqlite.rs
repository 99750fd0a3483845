use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value as JsonValue;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};

use super::{RecordStore, StoreError};

/// SQL-backed record store, the analog of the original app's hosted
/// database. Documents are stored as JSON text keyed by namespace.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connects and creates the records table if needed. A single connection
    /// is used so `sqlite::memory:` URLs refer to one database.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                namespace TEXT PRIMARY KEY,
                doc TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn get(&self, namespace: &str) -> Result<Option<JsonValue>, StoreError> {
        let row = sqlx::query("SELECT doc FROM records WHERE namespace = ?1")
            .bind(namespace)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let doc: String = row.try_get("doc")?;
                Ok(Some(serde_json::from_str(&doc)?))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, namespace: &str, doc: JsonValue) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO records (namespace, doc, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(namespace) DO UPDATE
            SET doc = excluded.doc, updated_at = excluded.updated_at
            "#,
        )
        .bind(namespace)
        .bind(serde_json::to_string(&doc)?)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, namespace: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM records WHERE namespace = ?1")
            .bind(namespace)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
