//! Document store boundary.
//!
//! The corpora, responses, settings and logs live in an external
//! key-value/document store. This module defines the `DocumentStore`
//! trait the service depends on and three backends: the hosted REST
//! store, a local SQLite file, and an in-memory map for tests and demos.

pub mod http;
pub mod memory;
pub mod sqlite;

pub use http::HttpDocumentStore;
pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AppError;

/// A single stored document: its id plus its JSON fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

/// Constraints a `list` call can push down to the backend.
#[derive(Debug, Clone)]
pub enum Filter {
    /// Keep documents whose string field equals the value.
    Equal { field: String, value: String },
    /// Cap the number of returned documents.
    Limit(usize),
}

impl Filter {
    pub fn equal(field: &str, value: &str) -> Self {
        Filter::Equal {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub fn limit(count: usize) -> Self {
        Filter::Limit(count)
    }
}

/// CRUD surface over one database of named collections.
///
/// Absence is data, not an exception: `get` returns `None` for a missing
/// document, and only whole-operation failures become errors.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Lists documents in a collection, applying equality filters and an
    /// optional limit. Ordering is stable for a given store state.
    async fn list(&self, collection: &str, filters: &[Filter]) -> Result<Vec<Document>, AppError>;

    /// Fetches one document by id.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError>;

    /// Creates a document with a generated id and returns it.
    async fn create(&self, collection: &str, data: Value) -> Result<Document, AppError>;

    /// Replaces a document's data. Missing documents are an error.
    async fn update(&self, collection: &str, id: &str, data: Value) -> Result<Document, AppError>;

    /// Deletes a document. Missing documents are an error.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError>;
}

#[async_trait]
impl<T> DocumentStore for std::sync::Arc<T>
where
    T: DocumentStore + ?Sized,
{
    async fn list(&self, collection: &str, filters: &[Filter]) -> Result<Vec<Document>, AppError> {
        (**self).list(collection, filters).await
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError> {
        (**self).get(collection, id).await
    }

    async fn create(&self, collection: &str, data: Value) -> Result<Document, AppError> {
        (**self).create(collection, data).await
    }

    async fn update(&self, collection: &str, id: &str, data: Value) -> Result<Document, AppError> {
        (**self).update(collection, id, data).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError> {
        (**self).delete(collection, id).await
    }
}

/// Applies `Equal` filters and the tightest `Limit` to an already-loaded
/// document list. Shared by backends that filter client-side.
pub(crate) fn apply_filters(documents: Vec<Document>, filters: &[Filter]) -> Vec<Document> {
    let mut result: Vec<Document> = documents
        .into_iter()
        .filter(|doc| {
            filters.iter().all(|filter| match filter {
                Filter::Equal { field, value } => doc
                    .data
                    .get(field)
                    .and_then(Value::as_str)
                    .map(|v| v == value)
                    .unwrap_or(false),
                Filter::Limit(_) => true,
            })
        })
        .collect();

    let limit = filters
        .iter()
        .filter_map(|filter| match filter {
            Filter::Limit(count) => Some(*count),
            _ => None,
        })
        .min();
    if let Some(limit) = limit {
        result.truncate(limit);
    }
    result
}
