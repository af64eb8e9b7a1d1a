//! SQLite store backend.
//!
//! One `documents` table holds every collection; document fields live in
//! a JSON `data` column and equality filters go through `json_extract`.
//! This is the offline/dev backend; the hosted REST store is the
//! production one.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::store::{Document, DocumentStore, Filter};

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if missing) the database file and ensures the
    /// `documents` table exists.
    pub async fn connect(path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite://{}", path);
        info!(%db_url, "opening document store");

        let options = SqliteConnectOptions::from_str(&db_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                collection TEXT NOT NULL,
                data TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_documents_collection
                ON documents(collection);
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }

    fn decode_row(id: String, data: String) -> Option<Document> {
        match serde_json::from_str(&data) {
            Ok(value) => Some(Document { id, data: value }),
            Err(err) => {
                warn!(document = %id, error = %err, "skipping undecodable document row");
                None
            }
        }
    }
}

/// Filter fields are interpolated into the `json_extract` path, so only
/// plain identifiers are allowed through.
fn validate_field(field: &str) -> Result<(), AppError> {
    if !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Ok(())
    } else {
        Err(AppError::Store(format!("invalid filter field: {}", field)))
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn list(&self, collection: &str, filters: &[Filter]) -> Result<Vec<Document>, AppError> {
        let mut sql =
            String::from("SELECT id, data FROM documents WHERE collection = ?");
        let mut bindings: Vec<String> = Vec::new();
        let mut limit: Option<usize> = None;

        for filter in filters {
            match filter {
                Filter::Equal { field, value } => {
                    validate_field(field)?;
                    sql.push_str(&format!(" AND json_extract(data, '$.{}') = ?", field));
                    bindings.push(value.clone());
                }
                Filter::Limit(count) => {
                    limit = Some(limit.map_or(*count, |current| current.min(*count)));
                }
            }
        }

        sql.push_str(" ORDER BY created_at ASC, id ASC");
        if limit.is_some() {
            sql.push_str(" LIMIT ?");
        }

        let mut query = sqlx::query_as::<_, (String, String)>(&sql).bind(collection);
        for value in &bindings {
            query = query.bind(value);
        }
        if let Some(limit) = limit {
            query = query.bind(limit as i64);
        }

        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .filter_map(|(id, data)| Self::decode_row(id, data))
            .collect())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError> {
        let row = sqlx::query_as::<_, (String, String)>(
            "SELECT id, data FROM documents WHERE collection = ? AND id = ?",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.and_then(|(id, data)| Self::decode_row(id, data)))
    }

    async fn create(&self, collection: &str, data: Value) -> Result<Document, AppError> {
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now().timestamp();
        let encoded = serde_json::to_string(&data)?;

        sqlx::query(
            "INSERT INTO documents (id, collection, data, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(collection)
        .bind(&encoded)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(Document { id, data })
    }

    async fn update(&self, collection: &str, id: &str, data: Value) -> Result<Document, AppError> {
        let encoded = serde_json::to_string(&data)?;
        let result = sqlx::query(
            "UPDATE documents SET data = ? WHERE collection = ? AND id = ?",
        )
        .bind(&encoded)
        .bind(collection)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Store(format!("document not found: {}", id)));
        }
        Ok(Document {
            id: id.to_string(),
            data,
        })
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Store(format!("document not found: {}", id)));
        }
        Ok(())
    }
}
