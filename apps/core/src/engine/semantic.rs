//! Semantic intent matching via cosine similarity over stored embeddings.
//!
//! The query vector comes from the embedding provider upstream; this
//! module only compares it against the corpus of precomputed vectors.

use tracing::warn;

use crate::engine::{accept_top, rank, Candidate};
use crate::models::EmbeddingRecord;

/// Calculate cosine similarity between two vectors.
///
/// Mismatched lengths, empty vectors and zero magnitudes all return 0.0;
/// this never produces NaN or panics.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}

/// Scores the query vector against every usable record, ranked best-first.
///
/// Records from a different model or with a different dimensionality are
/// skipped with a warning: one malformed record must never prevent
/// matching against the rest, and cross-model similarities would be
/// meaningless anyway.
pub fn score(query_vector: &[f32], model_id: &str, records: &[EmbeddingRecord]) -> Vec<Candidate> {
    let mut candidates = Vec::with_capacity(records.len());
    for record in records {
        if record.model_id != model_id {
            warn!(
                record = %record.id,
                expected = model_id,
                actual = %record.model_id,
                "skipping embedding produced by a different model"
            );
            continue;
        }
        if record.embedding.len() != query_vector.len() {
            warn!(
                record = %record.id,
                expected = query_vector.len(),
                actual = record.embedding.len(),
                "skipping embedding with mismatched dimensionality"
            );
            continue;
        }
        candidates.push(Candidate {
            intent_tag: record.intent_tag.clone(),
            doc_id: record.id.clone(),
            score: cosine_similarity(query_vector, &record.embedding),
        });
    }

    rank(&mut candidates);
    candidates
}

/// Returns the winning `(intent_tag, score)` if the best candidate clears
/// the threshold (inclusive), `None` otherwise.
pub fn predict(
    query_vector: &[f32],
    model_id: &str,
    records: &[EmbeddingRecord],
    threshold: f32,
) -> Option<(String, f32)> {
    accept_top(&score(query_vector, model_id, records), threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = "test-model";

    fn record(id: &str, tag: &str, embedding: Vec<f32>) -> EmbeddingRecord {
        EmbeddingRecord {
            id: id.to_string(),
            intent_tag: tag.to_string(),
            pattern_text: String::new(),
            embedding,
            model_id: MODEL.to_string(),
        }
    }

    #[test]
    fn cosine_identical_direction_is_one() {
        let a = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-5);

        let scaled = vec![3.5, 0.0, 0.0];
        assert!((cosine_similarity(&a, &scaled) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn cosine_is_symmetric() {
        let a = vec![0.2, 0.7, -0.1];
        let b = vec![-0.4, 0.3, 0.9];
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    }

    #[test]
    fn cosine_orthogonal_is_zero() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!((cosine_similarity(&a, &b)).abs() < 1e-5);
    }

    #[test]
    fn cosine_zero_vector_is_zero_not_nan() {
        let a = vec![0.0, 0.0, 0.0];
        let b = vec![1.0, 2.0, 3.0];
        let similarity = cosine_similarity(&a, &b);
        assert_eq!(similarity, 0.0);
        assert!(!similarity.is_nan());
        assert_eq!(cosine_similarity(&a, &a), 0.0);
    }

    #[test]
    fn cosine_length_mismatch_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn predict_picks_the_closest_record() {
        let records = vec![
            record("e1", "greeting", vec![1.0, 0.0]),
            record("e2", "farewell", vec![0.0, 1.0]),
        ];
        let query = vec![0.9, 0.1];
        let (tag, score) = predict(&query, MODEL, &records, 0.5).expect("should match");
        assert_eq!(tag, "greeting");
        assert!(score > 0.9);
    }

    #[test]
    fn predict_rejects_below_threshold() {
        let records = vec![record("e1", "greeting", vec![1.0, 0.0])];
        let query = vec![0.0, 1.0];
        assert!(predict(&query, MODEL, &records, 0.5).is_none());
    }

    #[test]
    fn mismatched_dimensionality_skips_only_that_record() {
        let records = vec![
            record("e1", "broken", vec![1.0, 0.0, 0.0]),
            record("e2", "greeting", vec![1.0, 0.0]),
        ];
        let query = vec![1.0, 0.0];
        let candidates = score(&query, MODEL, &records);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].intent_tag, "greeting");
    }

    #[test]
    fn foreign_model_records_are_skipped() {
        let mut foreign = record("e1", "greeting", vec![1.0, 0.0]);
        foreign.model_id = "other-model".to_string();
        let records = vec![foreign, record("e2", "farewell", vec![0.0, 1.0])];
        let query = vec![1.0, 0.0];
        assert!(predict(&query, MODEL, &records, 0.5).is_none());
        let candidates = score(&query, MODEL, &records);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].intent_tag, "farewell");
    }

    #[test]
    fn duplicate_records_do_not_change_the_winner() {
        let records = vec![
            record("e1", "greeting", vec![1.0, 0.0]),
            record("e2", "greeting", vec![1.0, 0.0]),
            record("e3", "farewell", vec![0.0, 1.0]),
        ];
        let query = vec![1.0, 0.05];
        let (tag, _) = predict(&query, MODEL, &records, 0.5).expect("should match");
        assert_eq!(tag, "greeting");
    }
}
