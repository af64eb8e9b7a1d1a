//! Corpus maintenance: embedding backfill and corpus import.
//!
//! `backfill_embeddings` keeps the embedding collection in step with the
//! pattern collection: every pattern gets exactly one embedding record,
//! existing records are left alone, and per-pattern provider failures are
//! counted rather than fatal.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::embedding::EmbeddingProvider;
use crate::error::AppError;
use crate::models::{IntentDef, Pattern, ResponseDoc};
use crate::store::{DocumentStore, Filter};

/// Outcome counters for one backfill run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Embedding records created this run.
    pub created: usize,
    /// Patterns that already had a record.
    pub skipped: usize,
    /// Patterns where embedding or storing failed.
    pub failed: usize,
}

/// Creates an embedding record for every pattern that lacks one.
///
/// `pause` spaces out provider calls (hosted free tiers rate-limit);
/// pass `Duration::ZERO` to disable.
pub async fn backfill_embeddings<S, P>(
    store: &S,
    provider: &P,
    config: &AppConfig,
    pause: Duration,
) -> Result<SyncReport, AppError>
where
    S: DocumentStore,
    P: EmbeddingProvider,
{
    let collections = &config.store.collections;
    let limit = Filter::limit(config.matching.corpus_limit);

    let pattern_docs = store.list(&collections.patterns, &[limit.clone()]).await?;
    let embedding_docs = store.list(&collections.embeddings, &[limit]).await?;

    let existing: HashSet<&str> = embedding_docs
        .iter()
        .filter_map(|doc| doc.data.get("pattern_text").and_then(Value::as_str))
        .collect();
    info!(
        patterns = pattern_docs.len(),
        existing = existing.len(),
        "starting embedding backfill"
    );

    let mut report = SyncReport::default();
    for doc in &pattern_docs {
        let pattern = match Pattern::from_document(doc) {
            Ok(pattern) => pattern,
            Err(err) => {
                warn!(document = %doc.id, error = %err, "skipping malformed pattern document");
                report.failed += 1;
                continue;
            }
        };

        if existing.contains(pattern.text.as_str()) {
            report.skipped += 1;
            continue;
        }

        match provider.embed(&pattern.text).await {
            Ok(vector) => {
                let data = serde_json::json!({
                    "intent_tag": pattern.intent_tag,
                    "pattern_text": pattern.text,
                    "embedding": serde_json::to_string(&vector)?,
                    "model": provider.model_id(),
                });
                match store.create(&collections.embeddings, data).await {
                    Ok(_) => {
                        info!(pattern = %pattern.text, "stored embedding");
                        report.created += 1;
                    }
                    Err(err) => {
                        warn!(pattern = %pattern.text, error = %err, "failed to store embedding");
                        report.failed += 1;
                    }
                }
            }
            Err(err) => {
                warn!(pattern = %pattern.text, error = %err, "embedding generation failed");
                report.failed += 1;
            }
        }

        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
    }

    info!(
        created = report.created,
        skipped = report.skipped,
        failed = report.failed,
        "embedding backfill complete"
    );
    Ok(report)
}

/// A corpus file: intents, their patterns and their responses, as
/// authored offline and imported into an empty store.
#[derive(Debug, Default, Deserialize)]
pub struct CorpusFile {
    #[serde(default)]
    pub intents: Vec<IntentDef>,
    #[serde(default)]
    pub patterns: Vec<CorpusPattern>,
    #[serde(default)]
    pub responses: Vec<ResponseDoc>,
}

/// A pattern as it appears in a corpus file (no document id yet).
#[derive(Debug, Deserialize)]
pub struct CorpusPattern {
    pub text: String,
    pub intent_tag: String,
}

/// Loads a corpus file into the store. Returns the number of documents
/// created. Embeddings are not generated here; run the backfill after.
pub async fn import_corpus<S>(
    store: &S,
    config: &AppConfig,
    corpus: CorpusFile,
) -> Result<usize, AppError>
where
    S: DocumentStore,
{
    let collections = &config.store.collections;
    let mut created = 0;

    for intent in &corpus.intents {
        store
            .create(&collections.intents, serde_json::to_value(intent)?)
            .await?;
        created += 1;
    }
    for pattern in &corpus.patterns {
        let data = serde_json::json!({
            "text": pattern.text,
            "intent_tag": pattern.intent_tag,
        });
        store.create(&collections.patterns, data).await?;
        created += 1;
    }
    for response in &corpus.responses {
        store
            .create(&collections.responses, serde_json::to_value(response)?)
            .await?;
        created += 1;
    }

    info!(created, "corpus import complete");
    Ok(created)
}
