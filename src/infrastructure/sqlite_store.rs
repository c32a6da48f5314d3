use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{sqlite::SqliteConnectOptions, sqlite::SqlitePoolOptions, SqlitePool};

use crate::application::{AppError, AppResult, DocumentStore};

/// Documents as rows of a single key-value table.
pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    /// db_url examples
    /// - "sqlite:/data/state.db" (docker volume)
    /// - "sqlite:./state.db"
    /// - "sqlite::memory:"
    pub async fn new(db_url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(db_url)
            .map_err(|e| AppError::Storage(e.to_string()))?
            .create_if_missing(true);

        // one connection: an in-memory database is private to its connection
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> AppResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
              key TEXT PRIMARY KEY,
              body TEXT NOT NULL,
              updated_at INTEGER NOT NULL
            );
          "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn read(&self, key: &str) -> AppResult<Option<String>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT body FROM documents WHERE key = ? LIMIT 1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| AppError::Storage(e.to_string()))?;

        Ok(row.map(|r| r.0))
    }

    async fn write(&self, key: &str, body: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO documents(key, body, updated_at) VALUES(?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET body=excluded.body, updated_at=excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(body)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upserts_documents() {
        let store = SqliteDocumentStore::new("sqlite::memory:").await.unwrap();
        assert_eq!(store.read("db").await.unwrap(), None);

        store.write("db", "{}").await.unwrap();
        store.write("db", r#"{"watches":[]}"#).await.unwrap();
        store.write("other", "[]").await.unwrap();

        assert_eq!(
            store.read("db").await.unwrap().as_deref(),
            Some(r#"{"watches":[]}"#)
        );
        assert_eq!(store.read("other").await.unwrap().as_deref(), Some("[]"));
    }
}
