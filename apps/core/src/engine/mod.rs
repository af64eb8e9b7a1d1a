//! # Matching Engine
//!
//! Decides which intent (if any) a user utterance belongs to.
//!
//! ## Components
//! - `normalize`: tokenization + suffix-stripping stemming (shared term form)
//! - `bow`: lexical matching by bag-of-words term overlap
//! - `semantic`: cosine similarity over precomputed embedding vectors
//! - `resolver`: threshold-gated fallback chain between the two matchers
//!
//! Nothing in here touches the network or the store: corpora and query
//! vectors come in as plain data, scores come out. All state (vocabulary,
//! score vectors) is rebuilt per call, so concurrent requests share nothing.

pub mod bow;
pub mod normalize;
pub mod resolver;
pub mod semantic;

pub use resolver::IntentResolver;

use std::cmp::Ordering;

/// One scored candidate: an intent tag, the document it came from, and the
/// score the matcher assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub intent_tag: String,
    pub doc_id: String,
    pub score: f32,
}

/// Orders candidates by score descending, breaking ties on ascending
/// document id so the winner never depends on corpus iteration order.
pub(crate) fn rank(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.doc_id.cmp(&b.doc_id))
    });
}

/// Accepts the top-ranked candidate only if it clears the threshold
/// (inclusive: a score exactly at the threshold matches).
pub(crate) fn accept_top(candidates: &[Candidate], threshold: f32) -> Option<(String, f32)> {
    candidates
        .first()
        .filter(|c| c.score >= threshold)
        .map(|c| (c.intent_tag.clone(), c.score))
}
