//! Intent resolution: the threshold-gated fallback chain.
//!
//! Semantic similarity is preferred (it survives paraphrase), but it is
//! only as good as embedding coverage; bag-of-words overlap is the safety
//! net when the embedding corpus is incomplete or the provider is down.
//! A semantic winner short-circuits: the lexical matcher never runs and
//! the two scores are never blended.

use tracing::{debug, warn};

use crate::embedding::EmbeddingProvider;
use crate::engine::{bow, semantic};
use crate::error::AppError;
use crate::models::{EmbeddingRecord, MatchResult, Pattern};

/// Two-tier matcher over an embedding corpus and a pattern corpus.
pub struct IntentResolver {
    semantic_threshold: f32,
    lexical_threshold: f32,
}

impl IntentResolver {
    /// The lexical threshold is deliberately the stricter of the two:
    /// term overlap is a noisier signal than embedding similarity.
    pub fn new(semantic_threshold: f32, lexical_threshold: f32) -> Self {
        Self {
            semantic_threshold,
            lexical_threshold,
        }
    }

    /// Resolves a query to a `MatchResult`.
    ///
    /// An empty query is the one input this surfaces as an error: it
    /// signals a malformed request, not an unmatched intent. A provider
    /// failure is recovered locally by skipping straight to the lexical
    /// tier. Neither tier clearing its bar is the defined `unmatched`
    /// outcome, never an error.
    pub async fn resolve<P>(
        &self,
        query: &str,
        provider: &P,
        embeddings: &[EmbeddingRecord],
        patterns: &[Pattern],
    ) -> Result<MatchResult, AppError>
    where
        P: EmbeddingProvider + ?Sized,
    {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput("message is empty".to_string()));
        }

        match provider.embed(query).await {
            Ok(query_vector) => {
                if let Some((tag, score)) = semantic::predict(
                    &query_vector,
                    provider.model_id(),
                    embeddings,
                    self.semantic_threshold,
                ) {
                    debug!(intent = %tag, score, "semantic match");
                    return Ok(MatchResult::semantic(tag, score));
                }
            }
            Err(err) => {
                warn!(error = %err, "embedding provider unavailable, falling back to lexical matching");
            }
        }

        if let Some((tag, score)) = bow::predict(query, patterns, self.lexical_threshold) {
            debug!(intent = %tag, score, "bag-of-words match");
            return Ok(MatchResult::bow(tag, score));
        }

        Ok(MatchResult::unmatched())
    }
}
