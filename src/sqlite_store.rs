//! SQLite-backed [`DocumentBackend`] implementation.
//!
//! Every collection lives in the shared `documents` table created by
//! [`migrate`](crate::migrate), scoped by the logical database name. Bodies
//! are stored as JSON text. Every call is bounded by the configured timeout;
//! a timeout, a lost connection, or a missing schema all surface as
//! [`StoreError::Unavailable`].

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use startupmate_core::store::{DocumentBackend, DocumentId, RawDocument, StoreError};

use crate::config::DbConfig;
use crate::{db, migrate};

/// SQLite implementation of the [`DocumentBackend`] trait.
pub struct SqliteBackend {
    pool: SqlitePool,
    database: String,
    timeout: Duration,
}

impl SqliteBackend {
    pub fn new(pool: SqlitePool, database: impl Into<String>, timeout: Duration) -> Self {
        Self {
            pool,
            database: database.into(),
            timeout,
        }
    }

    /// Connects to the configured database and makes sure the schema exists.
    pub async fn connect(config: &DbConfig) -> Result<Self> {
        let database = config
            .name
            .clone()
            .ok_or_else(|| anyhow::anyhow!("db.name is not set (DATABASE_NAME)"))?;
        let pool = db::connect(config).await?;
        migrate::migrate_pool(&pool).await?;
        Ok(Self::new(pool, database, config.timeout()))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    async fn bounded<T, F>(&self, op: &str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(StoreError::Unavailable(format!("{} failed: {}", op, e))),
            Err(_) => Err(StoreError::Unavailable(format!(
                "{} timed out after {}s",
                op,
                self.timeout.as_secs_f32()
            ))),
        }
    }
}

#[async_trait]
impl DocumentBackend for SqliteBackend {
    async fn insert(
        &self,
        collection: &str,
        fields: &Map<String, Value>,
    ) -> Result<DocumentId, StoreError> {
        let id = Uuid::new_v4().to_string();
        let body = Value::Object(fields.clone()).to_string();
        let now = chrono::Utc::now().timestamp();

        self.bounded(
            "insert",
            sqlx::query(
                r#"
                INSERT INTO documents (id, database_name, collection, body, created_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(&id)
            .bind(&self.database)
            .bind(collection)
            .bind(&body)
            .bind(now)
            .execute(&self.pool),
        )
        .await?;

        Ok(id)
    }

    async fn list(&self, collection: &str, limit: usize) -> Result<Vec<RawDocument>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = self
            .bounded(
                "list",
                sqlx::query(
                    r#"
                    SELECT id, body FROM documents
                    WHERE database_name = ? AND collection = ?
                    ORDER BY seq DESC
                    LIMIT ?
                    "#,
                )
                .bind(&self.database)
                .bind(collection)
                .bind(limit)
                .fetch_all(&self.pool),
            )
            .await?;

        rows.iter()
            .map(|row| {
                let id: String = row.get("id");
                let body: String = row.get("body");
                match serde_json::from_str::<Map<String, Value>>(&body) {
                    Ok(fields) => Ok(RawDocument { id, fields }),
                    Err(e) => Err(StoreError::Decode {
                        collection: collection.to_string(),
                        id,
                        reason: e.to_string(),
                    }),
                }
            })
            .collect()
    }

    async fn collection_names(&self) -> Result<Vec<String>, StoreError> {
        let rows = self
            .bounded(
                "collection_names",
                sqlx::query(
                    "SELECT DISTINCT collection FROM documents WHERE database_name = ? ORDER BY collection",
                )
                .bind(&self.database)
                .fetch_all(&self.pool),
            )
            .await?;

        Ok(rows.iter().map(|row| row.get("collection")).collect())
    }
}
