use serde::{Deserialize, Serialize};
use std::fmt;

use crate::store::Document;

/// An example utterance belonging to exactly one intent.
///
/// Many patterns exist per intent. The store document id doubles as the
/// deterministic tie-break key when two patterns score identically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
    /// Store document id.
    pub id: String,
    /// The example phrase.
    pub text: String,
    /// Tag of the owning intent.
    pub intent_tag: String,
}

#[derive(Deserialize)]
struct PatternFields {
    text: String,
    intent_tag: String,
}

impl Pattern {
    /// Decodes a pattern from a raw store document. A document missing
    /// required fields yields an error so the caller can skip it.
    pub fn from_document(doc: &Document) -> Result<Self, serde_json::Error> {
        let fields: PatternFields = serde_json::from_value(doc.data.clone())?;
        Ok(Self {
            id: doc.id.clone(),
            text: fields.text,
            intent_tag: fields.intent_tag,
        })
    }
}

/// A cached semantic vector for one pattern, tagged with the model that
/// produced it. The stored document keeps the vector as a JSON-encoded
/// string; this is the decoded form the scorer works on.
#[derive(Debug, Clone)]
pub struct EmbeddingRecord {
    /// Store document id (tie-break key).
    pub id: String,
    /// Tag of the owning intent.
    pub intent_tag: String,
    /// Text of the pattern this vector was computed from.
    pub pattern_text: String,
    /// The embedding vector. Length is constant per model.
    pub embedding: Vec<f32>,
    /// Identity of the model that produced the vector.
    pub model_id: String,
}

#[derive(Deserialize)]
struct EmbeddingFields {
    intent_tag: String,
    pattern_text: String,
    embedding: String,
    #[serde(rename = "model")]
    model_id: String,
}

impl EmbeddingRecord {
    /// Decodes an embedding record, including the JSON-string vector field.
    /// Any decoding failure is reported so the caller can skip the single
    /// bad record instead of aborting the whole corpus read.
    pub fn from_document(doc: &Document) -> Result<Self, serde_json::Error> {
        let fields: EmbeddingFields = serde_json::from_value(doc.data.clone())?;
        let embedding: Vec<f32> = serde_json::from_str(&fields.embedding)?;
        Ok(Self {
            id: doc.id.clone(),
            intent_tag: fields.intent_tag,
            pattern_text: fields.pattern_text,
            embedding,
            model_id: fields.model_id,
        })
    }
}

/// A named category of user request. The tag is the join key used across
/// patterns, embeddings and responses; uniqueness is assumed upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentDef {
    pub tag: String,
    #[serde(default)]
    pub description: String,
}

/// One canned response text for an intent. Many may exist per intent; the
/// chat service picks one at random.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseDoc {
    pub intent_tag: String,
    pub text: String,
}

/// A scalar setting keyed by name (e.g., the `"threshold"` override).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingDoc {
    pub key: String,
    pub value: String,
}

/// Best-effort audit record written after each classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryLogEntry {
    pub query: String,
    pub response: String,
    pub intent_tag: String,
    pub matched: bool,
}

/// Which matching strategy produced the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMethod {
    /// Cosine similarity over stored embedding vectors.
    Semantic,
    /// Bag-of-words term overlap over the pattern corpus.
    Bow,
    /// Neither matcher cleared its threshold.
    None,
}

impl MatchMethod {
    pub fn label(&self) -> &'static str {
        match self {
            MatchMethod::Semantic => "semantic",
            MatchMethod::Bow => "bow",
            MatchMethod::None => "none",
        }
    }
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The sole output of the intent resolver. `intent_tag == None` means "no
/// confident match" and is a defined outcome, never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub intent_tag: Option<String>,
    pub confidence: f32,
    pub method: MatchMethod,
}

impl MatchResult {
    pub fn semantic(tag: String, score: f32) -> Self {
        Self {
            intent_tag: Some(tag),
            confidence: score,
            method: MatchMethod::Semantic,
        }
    }

    pub fn bow(tag: String, score: f32) -> Self {
        Self {
            intent_tag: Some(tag),
            confidence: score,
            method: MatchMethod::Bow,
        }
    }

    pub fn unmatched() -> Self {
        Self {
            intent_tag: None,
            confidence: 0.0,
            method: MatchMethod::None,
        }
    }
}

/// What the chat service hands back to the caller for one message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    /// The response text shown to the user (canned or fallback).
    pub message: String,
    /// Winning intent tag, if any matcher cleared its threshold.
    pub intent: Option<String>,
    /// Score of the winning candidate, 0.0 when unmatched.
    pub confidence: f32,
    /// Strategy that produced the match.
    pub method: MatchMethod,
}
