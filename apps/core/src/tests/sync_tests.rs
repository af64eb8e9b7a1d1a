//! Backfill and corpus-import tests.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{AppConfig, Collections, EmbeddingSettings, MatchingSettings, StoreSettings};
use crate::embedding::EmbeddingProvider;
use crate::error::AppError;
use crate::models::{IntentDef, ResponseDoc};
use crate::store::{DocumentStore, InMemoryStore};
use crate::sync::{backfill_embeddings, import_corpus, CorpusFile, CorpusPattern};

const MODEL: &str = "test-model";

fn test_config() -> AppConfig {
    AppConfig {
        store: StoreSettings {
            endpoint: None,
            project_id: String::new(),
            api_key: String::new(),
            database_id: "faq_chatbot".to_string(),
            sqlite_path: String::new(),
            collections: Collections::default(),
        },
        embedding: EmbeddingSettings {
            api_url: "http://localhost/unused".to_string(),
            model_id: MODEL.to_string(),
            api_token: None,
            timeout_secs: 5,
            cache_capacity: 8,
        },
        matching: MatchingSettings {
            semantic_threshold: 0.5,
            lexical_threshold: 0.7,
            corpus_limit: 5000,
        },
    }
}

struct StubProvider {
    vector: Option<Vec<f32>>,
}

#[async_trait]
impl EmbeddingProvider for StubProvider {
    fn model_id(&self) -> &str {
        MODEL
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>, AppError> {
        match &self.vector {
            Some(vector) => Ok(vector.clone()),
            None => Err(AppError::Provider("provider is down".to_string())),
        }
    }
}

async fn seed_pattern(store: &impl DocumentStore, text: &str, tag: &str) {
    store
        .create("patterns", json!({ "text": text, "intent_tag": tag }))
        .await
        .unwrap();
}

#[tokio::test]
async fn backfill_creates_records_only_for_missing_patterns() {
    let store = Arc::new(InMemoryStore::new());
    seed_pattern(&store, "registration deadline", "admission_dates").await;
    seed_pattern(&store, "hostel fees", "accommodation").await;
    // One pattern already has an embedding record.
    store
        .create(
            "embeddings",
            json!({
                "intent_tag": "admission_dates",
                "pattern_text": "registration deadline",
                "embedding": "[1.0,0.0]",
                "model": MODEL,
            }),
        )
        .await
        .unwrap();

    let provider = StubProvider {
        vector: Some(vec![0.5, 0.5]),
    };
    let report = backfill_embeddings(&store, &provider, &test_config(), Duration::ZERO)
        .await
        .unwrap();

    assert_eq!(report.created, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.failed, 0);

    let records = store.list("embeddings", &[]).await.unwrap();
    assert_eq!(records.len(), 2);
    let new_record = records
        .iter()
        .find(|doc| doc.data.get("pattern_text") == Some(&Value::String("hostel fees".into())))
        .expect("missing pattern must now have a record");
    assert_eq!(
        new_record.data.get("model").and_then(Value::as_str),
        Some(MODEL)
    );
    let encoded = new_record
        .data
        .get("embedding")
        .and_then(Value::as_str)
        .unwrap();
    let vector: Vec<f32> = serde_json::from_str(encoded).unwrap();
    assert_eq!(vector, vec![0.5, 0.5]);
}

#[tokio::test]
async fn backfill_is_idempotent() {
    let store = Arc::new(InMemoryStore::new());
    seed_pattern(&store, "registration deadline", "admission_dates").await;
    seed_pattern(&store, "hostel fees", "accommodation").await;

    let provider = StubProvider {
        vector: Some(vec![0.5, 0.5]),
    };
    let config = test_config();

    let first = backfill_embeddings(&store, &provider, &config, Duration::ZERO)
        .await
        .unwrap();
    assert_eq!(first.created, 2);

    let second = backfill_embeddings(&store, &provider, &config, Duration::ZERO)
        .await
        .unwrap();
    assert_eq!(second.created, 0);
    assert_eq!(second.skipped, 2);
    assert_eq!(store.list("embeddings", &[]).await.unwrap().len(), 2);
}

#[tokio::test]
async fn backfill_counts_provider_failures_without_aborting() {
    let store = Arc::new(InMemoryStore::new());
    seed_pattern(&store, "registration deadline", "admission_dates").await;
    seed_pattern(&store, "hostel fees", "accommodation").await;

    let provider = StubProvider { vector: None };
    let report = backfill_embeddings(&store, &provider, &test_config(), Duration::ZERO)
        .await
        .unwrap();

    assert_eq!(report.created, 0);
    assert_eq!(report.failed, 2);
    assert!(store.list("embeddings", &[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn backfill_counts_malformed_pattern_documents() {
    let store = Arc::new(InMemoryStore::new());
    store
        .create("patterns", json!({ "text": "missing the tag field" }))
        .await
        .unwrap();
    seed_pattern(&store, "hostel fees", "accommodation").await;

    let provider = StubProvider {
        vector: Some(vec![0.5, 0.5]),
    };
    let report = backfill_embeddings(&store, &provider, &test_config(), Duration::ZERO)
        .await
        .unwrap();

    assert_eq!(report.created, 1);
    assert_eq!(report.failed, 1);
}

#[tokio::test]
async fn import_corpus_populates_all_three_collections() {
    let store = Arc::new(InMemoryStore::new());
    let corpus = CorpusFile {
        intents: vec![IntentDef {
            tag: "admission_dates".to_string(),
            description: "Questions about registration and deadlines".to_string(),
        }],
        patterns: vec![
            CorpusPattern {
                text: "registration deadline".to_string(),
                intent_tag: "admission_dates".to_string(),
            },
            CorpusPattern {
                text: "when does registration close".to_string(),
                intent_tag: "admission_dates".to_string(),
            },
        ],
        responses: vec![ResponseDoc {
            intent_tag: "admission_dates".to_string(),
            text: "Registration closes on 30 September.".to_string(),
        }],
    };

    let created = import_corpus(&store, &test_config(), corpus).await.unwrap();
    assert_eq!(created, 4);
    assert_eq!(store.list("intents", &[]).await.unwrap().len(), 1);
    assert_eq!(store.list("patterns", &[]).await.unwrap().len(), 2);
    assert_eq!(store.list("responses", &[]).await.unwrap().len(), 1);
}
