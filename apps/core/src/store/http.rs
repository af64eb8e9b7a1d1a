//! Hosted document-store backend.
//!
//! Thin client for the hosted backend's REST dialect: collections of
//! documents under a named database, project/key headers on every call,
//! list responses wrapped in a `{total, documents}` envelope with ids in
//! a `$id` field.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;

use crate::config::StoreSettings;
use crate::error::AppError;
use crate::store::{Document, DocumentStore, Filter};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub struct HttpDocumentStore {
    client: Client,
    endpoint: String,
    project_id: String,
    api_key: String,
    database_id: String,
}

#[derive(Deserialize)]
struct RawDocument {
    #[serde(rename = "$id")]
    id: String,
    #[serde(flatten)]
    data: Map<String, Value>,
}

impl From<RawDocument> for Document {
    fn from(raw: RawDocument) -> Self {
        Document {
            id: raw.id,
            data: Value::Object(raw.data),
        }
    }
}

#[derive(Deserialize)]
struct ListEnvelope {
    #[allow(dead_code)]
    total: u64,
    documents: Vec<RawDocument>,
}

impl HttpDocumentStore {
    pub fn new(settings: &StoreSettings) -> Result<Self, AppError> {
        let endpoint = settings
            .endpoint
            .as_deref()
            .ok_or_else(|| AppError::Config("store endpoint is not configured".to_string()))?;
        url::Url::parse(endpoint)?;

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Store(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            project_id: settings.project_id.clone(),
            api_key: settings.api_key.clone(),
            database_id: settings.database_id.clone(),
        })
    }

    fn documents_url(&self, collection: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.endpoint, self.database_id, collection
        )
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("X-Project-Id", &self.project_id)
            .header("X-Api-Key", &self.api_key)
    }

    async fn check(response: Response) -> Result<Response, AppError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AppError::Store(format!(
            "store request failed with status {}: {}",
            status, body
        )))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, AppError> {
        let response = request
            .send()
            .await
            .map_err(|e| AppError::Store(format!("store request failed: {}", e)))?;
        Self::check(response).await
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn list(&self, collection: &str, filters: &[Filter]) -> Result<Vec<Document>, AppError> {
        let mut request = self.request(Method::GET, &self.documents_url(collection));
        for filter in filters {
            request = match filter {
                Filter::Equal { field, value } => {
                    request.query(&[("field", field.as_str()), ("value", value.as_str())])
                }
                Filter::Limit(count) => request.query(&[("limit", count.to_string())]),
            };
        }

        let envelope: ListEnvelope = self
            .send(request)
            .await?
            .json()
            .await
            .map_err(|e| AppError::Store(format!("unreadable list response: {}", e)))?;

        Ok(envelope.documents.into_iter().map(Document::from).collect())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError> {
        let url = format!("{}/{}", self.documents_url(collection), id);
        let response = self
            .request(Method::GET, &url)
            .send()
            .await
            .map_err(|e| AppError::Store(format!("store request failed: {}", e)))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let raw: RawDocument = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| AppError::Store(format!("unreadable document response: {}", e)))?;
        Ok(Some(raw.into()))
    }

    async fn create(&self, collection: &str, data: Value) -> Result<Document, AppError> {
        let request = self
            .request(Method::POST, &self.documents_url(collection))
            .json(&serde_json::json!({ "documentId": "unique()", "data": data }));

        let raw: RawDocument = self
            .send(request)
            .await?
            .json()
            .await
            .map_err(|e| AppError::Store(format!("unreadable create response: {}", e)))?;
        Ok(raw.into())
    }

    async fn update(&self, collection: &str, id: &str, data: Value) -> Result<Document, AppError> {
        let url = format!("{}/{}", self.documents_url(collection), id);
        let request = self
            .request(Method::PATCH, &url)
            .json(&serde_json::json!({ "data": data }));

        let raw: RawDocument = self
            .send(request)
            .await?
            .json()
            .await
            .map_err(|e| AppError::Store(format!("unreadable update response: {}", e)))?;
        Ok(raw.into())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError> {
        let url = format!("{}/{}", self.documents_url(collection), id);
        self.send(self.request(Method::DELETE, &url)).await?;
        Ok(())
    }
}
