//! In-memory store backend for tests, demos and seeding experiments.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::AppError;
use crate::store::{apply_filters, Document, DocumentStore, Filter};

/// Mutex'd map of collection name to documents, in insertion order.
#[derive(Default)]
pub struct InMemoryStore {
    collections: Mutex<HashMap<String, Vec<Document>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn list(&self, collection: &str, filters: &[Filter]) -> Result<Vec<Document>, AppError> {
        let collections = self.collections.lock().await;
        let documents = collections.get(collection).cloned().unwrap_or_default();
        Ok(apply_filters(documents, filters))
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError> {
        let collections = self.collections.lock().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| doc.id == id))
            .cloned())
    }

    async fn create(&self, collection: &str, data: Value) -> Result<Document, AppError> {
        let document = Document {
            id: Uuid::new_v4().to_string(),
            data,
        };
        let mut collections = self.collections.lock().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(document.clone());
        Ok(document)
    }

    async fn update(&self, collection: &str, id: &str, data: Value) -> Result<Document, AppError> {
        let mut collections = self.collections.lock().await;
        let documents = collections
            .get_mut(collection)
            .ok_or_else(|| AppError::Store(format!("unknown collection: {}", collection)))?;
        let document = documents
            .iter_mut()
            .find(|doc| doc.id == id)
            .ok_or_else(|| AppError::Store(format!("document not found: {}", id)))?;
        document.data = data;
        Ok(document.clone())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError> {
        let mut collections = self.collections.lock().await;
        let documents = collections
            .get_mut(collection)
            .ok_or_else(|| AppError::Store(format!("unknown collection: {}", collection)))?;
        let before = documents.len();
        documents.retain(|doc| doc.id != id);
        if documents.len() == before {
            return Err(AppError::Store(format!("document not found: {}", id)));
        }
        Ok(())
    }
}
