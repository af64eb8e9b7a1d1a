//! Lexical intent matching with a binary bag-of-words model.
//!
//! The vocabulary is rebuilt from the full pattern corpus on every call:
//! the sorted set of unique stems across all patterns. Query and patterns
//! become binary presence vectors over that vocabulary, a pattern's raw
//! score is the dot product (count of shared terms), and the final score
//! divides by the number of normalized query tokens.

use std::collections::BTreeSet;

use crate::engine::normalize::normalize;
use crate::engine::{accept_top, rank, Candidate};
use crate::models::Pattern;

/// The sorted set of unique stems across all patterns. `BTreeSet`
/// iteration gives the lexicographic order the scorer's determinism
/// guarantee rests on.
pub fn build_vocabulary(patterns: &[Pattern]) -> Vec<String> {
    let mut terms = BTreeSet::new();
    for pattern in patterns {
        for term in normalize(&pattern.text) {
            terms.insert(term);
        }
    }
    terms.into_iter().collect()
}

/// Binary presence vector over the vocabulary: 1.0 where the term appears
/// anywhere in `tokens`, 0.0 otherwise. Repetition does not raise values.
fn presence_vector(tokens: &[String], vocabulary: &[String]) -> Vec<f32> {
    vocabulary
        .iter()
        .map(|term| {
            if tokens.iter().any(|token| token == term) {
                1.0
            } else {
                0.0
            }
        })
        .collect()
}

/// Scores the query against every pattern, ranked best-first. A query
/// that normalizes to zero tokens scores 0.0 everywhere (never a divide
/// by zero); an empty corpus produces an empty ranking.
pub fn score(query: &str, patterns: &[Pattern]) -> Vec<Candidate> {
    let vocabulary = build_vocabulary(patterns);
    let query_tokens = normalize(query);
    let query_vector = presence_vector(&query_tokens, &vocabulary);

    let mut candidates: Vec<Candidate> = patterns
        .iter()
        .map(|pattern| {
            let pattern_vector = presence_vector(&normalize(&pattern.text), &vocabulary);
            let overlap: f32 = query_vector
                .iter()
                .zip(&pattern_vector)
                .map(|(q, p)| q * p)
                .sum();
            let score = if query_tokens.is_empty() {
                0.0
            } else {
                overlap / query_tokens.len() as f32
            };
            Candidate {
                intent_tag: pattern.intent_tag.clone(),
                doc_id: pattern.id.clone(),
                score,
            }
        })
        .collect();

    rank(&mut candidates);
    candidates
}

/// Returns the winning `(intent_tag, score)` if the best candidate clears
/// the threshold (inclusive), `None` otherwise.
pub fn predict(query: &str, patterns: &[Pattern], threshold: f32) -> Option<(String, f32)> {
    accept_top(&score(query, patterns), threshold)
}
