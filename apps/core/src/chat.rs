//! The caller-facing classification operation.
//!
//! `ChatService::classify` ties the pieces together: validate the
//! message, read the per-request threshold override, load both corpora,
//! run the resolver, pick a canned response for the winner and record the
//! exchange. Everything it talks to arrives through its constructor.

use rand::seq::SliceRandom;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::embedding::EmbeddingProvider;
use crate::engine::IntentResolver;
use crate::error::AppError;
use crate::models::{
    ChatReply, EmbeddingRecord, MatchResult, Pattern, QueryLogEntry, ResponseDoc, SettingDoc,
};
use crate::store::{DocumentStore, Filter};

/// Shown when neither matcher clears its threshold.
pub const FALLBACK_MESSAGE: &str =
    "I'm sorry, I didn't quite understand that. Could you please rephrase your question?";

/// Shown when an intent matched but has no response documents.
pub const NO_RESPONSE_MESSAGE: &str =
    "I recognized your question but no answer is configured for it yet.";

pub struct ChatService<S, P> {
    store: S,
    provider: P,
    config: AppConfig,
}

impl<S, P> ChatService<S, P>
where
    S: DocumentStore,
    P: EmbeddingProvider,
{
    pub fn new(store: S, provider: P, config: AppConfig) -> Self {
        Self {
            store,
            provider,
            config,
        }
    }

    /// Classifies one user message and returns the response to show.
    ///
    /// An empty message is rejected before any store read. A failed
    /// corpus read surfaces as an error so callers can tell "checked and
    /// no match" from "couldn't check"; a failed settings read or log
    /// write only warns.
    pub async fn classify(&self, message: &str) -> Result<ChatReply, AppError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(AppError::InvalidInput("message is empty".to_string()));
        }

        let semantic_threshold = self.semantic_threshold().await;
        let embeddings = self.load_embeddings().await?;
        let patterns = self.load_patterns().await?;

        let resolver = IntentResolver::new(
            semantic_threshold,
            self.config.matching.lexical_threshold,
        );
        let outcome = resolver
            .resolve(message, &self.provider, &embeddings, &patterns)
            .await?;
        info!(
            method = %outcome.method,
            intent = outcome.intent_tag.as_deref().unwrap_or("none"),
            confidence = outcome.confidence,
            "intent resolved"
        );

        let (text, matched) = match outcome.intent_tag.as_deref() {
            Some(tag) => self.pick_response(tag).await?,
            None => (FALLBACK_MESSAGE.to_string(), false),
        };

        self.record_query(message, &text, &outcome, matched).await;

        Ok(ChatReply {
            message: text,
            intent: outcome.intent_tag,
            confidence: outcome.confidence,
            method: outcome.method,
        })
    }

    /// The stored `"threshold"` setting overrides the semantic bar for
    /// this request; the lexical bar stays at its configured value.
    /// Any failure here falls back to configuration, never the request.
    async fn semantic_threshold(&self) -> f32 {
        let configured = self.config.matching.semantic_threshold;
        let filters = [Filter::equal("key", "threshold"), Filter::limit(1)];
        match self
            .store
            .list(&self.config.store.collections.settings, &filters)
            .await
        {
            Ok(documents) => documents
                .first()
                .and_then(|doc| serde_json::from_value::<SettingDoc>(doc.data.clone()).ok())
                .and_then(|setting| setting.value.trim().parse().ok())
                .unwrap_or(configured),
            Err(err) => {
                warn!(error = %err, "settings fetch failed, using configured threshold");
                configured
            }
        }
    }

    async fn load_embeddings(&self) -> Result<Vec<EmbeddingRecord>, AppError> {
        let documents = self
            .store
            .list(
                &self.config.store.collections.embeddings,
                &[Filter::limit(self.config.matching.corpus_limit)],
            )
            .await?;

        let mut records = Vec::with_capacity(documents.len());
        for doc in &documents {
            match EmbeddingRecord::from_document(doc) {
                Ok(record) => records.push(record),
                Err(err) => {
                    warn!(document = %doc.id, error = %err, "skipping malformed embedding document");
                }
            }
        }
        Ok(records)
    }

    async fn load_patterns(&self) -> Result<Vec<Pattern>, AppError> {
        let documents = self
            .store
            .list(
                &self.config.store.collections.patterns,
                &[Filter::limit(self.config.matching.corpus_limit)],
            )
            .await?;

        let mut patterns = Vec::with_capacity(documents.len());
        for doc in &documents {
            match Pattern::from_document(doc) {
                Ok(pattern) => patterns.push(pattern),
                Err(err) => {
                    warn!(document = %doc.id, error = %err, "skipping malformed pattern document");
                }
            }
        }
        Ok(patterns)
    }

    /// Picks one response text for the tag at random. An intent with no
    /// responses is still a match for the caller, but flagged unmatched
    /// in the query log so authors notice the gap.
    async fn pick_response(&self, tag: &str) -> Result<(String, bool), AppError> {
        let filters = [
            Filter::equal("intent_tag", tag),
            Filter::limit(self.config.matching.corpus_limit),
        ];
        let documents = self
            .store
            .list(&self.config.store.collections.responses, &filters)
            .await?;

        let texts: Vec<String> = documents
            .iter()
            .filter_map(|doc| serde_json::from_value::<ResponseDoc>(doc.data.clone()).ok())
            .map(|response| response.text)
            .collect();

        match texts.choose(&mut rand::thread_rng()) {
            Some(text) => Ok((text.clone(), true)),
            None => {
                warn!(intent = tag, "intent matched but has no responses");
                Ok((NO_RESPONSE_MESSAGE.to_string(), false))
            }
        }
    }

    /// Best-effort audit trail; a failed write never fails the request.
    async fn record_query(&self, query: &str, response: &str, outcome: &MatchResult, matched: bool) {
        let entry = QueryLogEntry {
            query: query.to_string(),
            response: response.to_string(),
            intent_tag: outcome
                .intent_tag
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            matched,
        };
        let data = match serde_json::to_value(&entry) {
            Ok(data) => data,
            Err(err) => {
                warn!(error = %err, "failed to encode query log entry");
                return;
            }
        };
        if let Err(err) = self
            .store
            .create(&self.config.store.collections.logs, data)
            .await
        {
            warn!(error = %err, "failed to record query log");
        }
    }
}
