//! Embedding provider boundary.
//!
//! The provider is an external black box: text in, fixed-length float
//! vector out, deterministic per model version. This module defines the
//! trait the resolver depends on, the hosted HTTP implementation, and an
//! LRU decorator that spares repeated queries a round trip.

use async_trait::async_trait;
use lru::LruCache;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde_json::Value;
use std::num::NonZeroUsize;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::EmbeddingSettings;
use crate::error::AppError;

/// Maps text to a fixed-length vector for one named model.
///
/// The model identity travels with every stored embedding so the scorer
/// can refuse cross-model comparisons.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Identity of the model this provider embeds with.
    fn model_id(&self) -> &str;

    /// Embeds one text. Any failure (network, status, payload shape,
    /// timeout) comes back as `AppError::Provider`.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError>;
}

#[async_trait]
impl<T> EmbeddingProvider for std::sync::Arc<T>
where
    T: EmbeddingProvider + ?Sized,
{
    fn model_id(&self) -> &str {
        (**self).model_id()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        (**self).embed(text).await
    }
}

/// Client for a hosted feature-extraction endpoint
/// (`POST {"inputs": text}` with bearer auth).
pub struct HostedEmbeddingClient {
    client: Client,
    api_url: String,
    model_id: String,
    api_token: Option<String>,
}

impl HostedEmbeddingClient {
    pub fn new(settings: &EmbeddingSettings) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| AppError::Provider(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: settings.api_url.clone(),
            model_id: settings.model_id.clone(),
            api_token: settings.api_token.clone(),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for HostedEmbeddingClient {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        let mut request = self
            .client
            .post(&self.api_url)
            .json(&serde_json::json!({ "inputs": text }));
        if let Some(token) = &self.api_token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("embedding request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Provider(format!(
                "embedding request failed with status {}: {}",
                status, body
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("unreadable embedding response: {}", e)))?;

        parse_vector(payload)
    }
}

/// Accepts both response shapes hosted endpoints produce for a single
/// input: a flat `[f32, ...]` vector or a nested `[[f32, ...]]` batch of
/// one row.
fn parse_vector(payload: Value) -> Result<Vec<f32>, AppError> {
    let Value::Array(items) = payload else {
        return Err(AppError::Provider(
            "embedding response is not an array".to_string(),
        ));
    };

    let flat = match items.first() {
        Some(Value::Array(_)) => match items.into_iter().next() {
            Some(row) => row,
            None => Value::Array(Vec::new()),
        },
        _ => Value::Array(items),
    };

    let Value::Array(values) = flat else {
        return Err(AppError::Provider(
            "embedding response row is not an array".to_string(),
        ));
    };

    if values.is_empty() {
        return Err(AppError::Provider("embedding response is empty".to_string()));
    }

    values
        .into_iter()
        .map(|entry| {
            entry
                .as_f64()
                .map(|v| v as f32)
                .ok_or_else(|| AppError::Provider("embedding entries must be numbers".to_string()))
        })
        .collect()
}

/// LRU decorator keyed by query text. The cache is the one structure
/// shared across requests, guarded by a mutex; a hit skips the provider
/// entirely.
pub struct CachedProvider<P> {
    inner: P,
    cache: Mutex<LruCache<String, Vec<f32>>>,
}

impl<P: EmbeddingProvider> CachedProvider<P> {
    pub fn new(inner: P, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }
}

#[async_trait]
impl<P: EmbeddingProvider> EmbeddingProvider for CachedProvider<P> {
    fn model_id(&self) -> &str {
        self.inner.model_id()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        {
            let mut cache = self.cache.lock().await;
            if let Some(vector) = cache.get(text) {
                debug!("embedding cache hit");
                return Ok(vector.clone());
            }
        }

        let vector = self.inner.embed(text).await?;
        self.cache
            .lock()
            .await
            .put(text.to_string(), vector.clone());
        Ok(vector)
    }
}
