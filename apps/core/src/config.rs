//! Explicit configuration objects built from the environment.
//!
//! Everything the service needs travels through these structs; nothing
//! reads environment variables after startup.

use std::env;
use std::str::FromStr;
use validator::Validate;

use crate::error::AppError;

const DEFAULT_EMBED_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";
const DEFAULT_SEMANTIC_THRESHOLD: f32 = 0.5;
const DEFAULT_LEXICAL_THRESHOLD: f32 = 0.7;
const DEFAULT_CORPUS_LIMIT: usize = 5000;

/// Names of the store collections the service reads and writes.
#[derive(Debug, Clone)]
pub struct Collections {
    pub intents: String,
    pub patterns: String,
    pub responses: String,
    pub embeddings: String,
    pub settings: String,
    pub logs: String,
}

impl Default for Collections {
    fn default() -> Self {
        Self {
            intents: "intents".to_string(),
            patterns: "patterns".to_string(),
            responses: "responses".to_string(),
            embeddings: "embeddings".to_string(),
            settings: "settings".to_string(),
            logs: "logs".to_string(),
        }
    }
}

/// Document-store connection settings. When `endpoint` is set the hosted
/// REST backend is used; otherwise the service falls back to a local
/// SQLite file at `sqlite_path`.
#[derive(Debug, Clone, Validate)]
pub struct StoreSettings {
    #[validate(url)]
    pub endpoint: Option<String>,
    pub project_id: String,
    pub api_key: String,
    pub database_id: String,
    pub sqlite_path: String,
    pub collections: Collections,
}

/// Hosted embedding-provider settings.
#[derive(Debug, Clone, Validate)]
pub struct EmbeddingSettings {
    #[validate(url)]
    pub api_url: String,
    #[validate(length(min = 1))]
    pub model_id: String,
    pub api_token: Option<String>,
    pub timeout_secs: u64,
    pub cache_capacity: usize,
}

/// Thresholds and corpus bounds for the matching engine.
#[derive(Debug, Clone, Validate)]
pub struct MatchingSettings {
    /// Minimum cosine similarity for a semantic match. May be overridden
    /// per request by the stored `"threshold"` setting.
    #[validate(range(min = 0.0, max = 1.0))]
    pub semantic_threshold: f32,
    /// Minimum normalized term-overlap for a lexical match. Deliberately
    /// higher than the semantic bar: lexical overlap is the noisier signal.
    #[validate(range(min = 0.0, max = 1.0))]
    pub lexical_threshold: f32,
    /// Upper bound on corpus reads per request.
    #[validate(range(min = 1))]
    pub corpus_limit: usize,
}

#[derive(Debug, Clone, Validate)]
pub struct AppConfig {
    #[validate(nested)]
    pub store: StoreSettings,
    #[validate(nested)]
    pub embedding: EmbeddingSettings,
    #[validate(nested)]
    pub matching: MatchingSettings,
}

impl AppConfig {
    /// Builds and validates the configuration from environment variables.
    /// Call after `dotenv` so `.env` files are honored.
    pub fn from_env() -> Result<Self, AppError> {
        let model_id = env_or("FAQBOT_EMBED_MODEL", DEFAULT_EMBED_MODEL);
        let default_url = format!(
            "https://router.huggingface.co/hf-inference/models/{}",
            model_id
        );

        let config = Self {
            store: StoreSettings {
                endpoint: env::var("FAQBOT_STORE_ENDPOINT").ok(),
                project_id: env_or("FAQBOT_STORE_PROJECT_ID", ""),
                api_key: env_or("FAQBOT_STORE_API_KEY", ""),
                database_id: env_or("FAQBOT_STORE_DATABASE_ID", "faq_chatbot"),
                sqlite_path: env_or("FAQBOT_SQLITE_PATH", "./faqbot.sqlite"),
                collections: Collections::default(),
            },
            embedding: EmbeddingSettings {
                api_url: env_or("FAQBOT_EMBED_URL", &default_url),
                model_id,
                api_token: env::var("HF_API_TOKEN").ok(),
                timeout_secs: env_parse("FAQBOT_EMBED_TIMEOUT_SECS", 15u64)?,
                cache_capacity: env_parse("FAQBOT_EMBED_CACHE", 256usize)?,
            },
            matching: MatchingSettings {
                semantic_threshold: env_parse(
                    "FAQBOT_SEMANTIC_THRESHOLD",
                    DEFAULT_SEMANTIC_THRESHOLD,
                )?,
                lexical_threshold: env_parse(
                    "FAQBOT_LEXICAL_THRESHOLD",
                    DEFAULT_LEXICAL_THRESHOLD,
                )?,
                corpus_limit: env_parse("FAQBOT_CORPUS_LIMIT", DEFAULT_CORPUS_LIMIT)?,
            },
        };

        config.validate()?;
        Ok(config)
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| AppError::Config(format!("{} is not valid: {}", key, e))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        temp_env::with_vars_unset(
            [
                "FAQBOT_STORE_ENDPOINT",
                "FAQBOT_EMBED_URL",
                "FAQBOT_EMBED_MODEL",
                "FAQBOT_SEMANTIC_THRESHOLD",
                "FAQBOT_LEXICAL_THRESHOLD",
            ],
            || {
                let config = AppConfig::from_env().expect("default config should build");
                assert_eq!(config.matching.semantic_threshold, 0.5);
                assert_eq!(config.matching.lexical_threshold, 0.7);
                assert!(config.embedding.api_url.contains("all-MiniLM-L6-v2"));
                assert!(config.store.endpoint.is_none());
            },
        );
    }

    #[test]
    fn threshold_out_of_range_is_rejected() {
        temp_env::with_var("FAQBOT_SEMANTIC_THRESHOLD", Some("1.5"), || {
            let err = AppConfig::from_env().expect_err("1.5 is outside [0, 1]");
            assert!(matches!(err, AppError::Config(_)));
        });
    }

    #[test]
    fn unparseable_numeric_env_is_a_config_error() {
        temp_env::with_var("FAQBOT_EMBED_TIMEOUT_SECS", Some("soon"), || {
            let err = AppConfig::from_env().expect_err("non-numeric timeout");
            assert!(matches!(err, AppError::Config(_)));
        });
    }

    #[test]
    fn endpoint_must_be_a_url() {
        temp_env::with_var("FAQBOT_STORE_ENDPOINT", Some("not a url"), || {
            let err = AppConfig::from_env().expect_err("invalid endpoint");
            assert!(matches!(err, AppError::Config(_)));
        });
    }
}
