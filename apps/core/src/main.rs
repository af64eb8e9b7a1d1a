// FAQ Chatbot Backend Entry Point
// Classifies user messages against a labeled pattern corpus and replies
// with canned responses.

mod chat;
mod config;
mod embedding;
mod engine;
mod error;
mod models;
mod store;
mod sync;

#[cfg(test)]
mod tests;

use anyhow::Context;
use dotenv::dotenv;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

use chat::ChatService;
use config::AppConfig;
use embedding::{CachedProvider, EmbeddingProvider, HostedEmbeddingClient};
use error::AppError;
use store::{DocumentStore, HttpDocumentStore, SqliteStore};

/// Pause between provider calls during a backfill run; hosted free tiers
/// rate-limit aggressively.
const BACKFILL_PAUSE: Duration = Duration::from_millis(500);

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let formatting_layer = BunyanFormattingLayer::new("faqbot-core".into(), std::io::stdout);
    let subscriber = Registry::default()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(formatting_layer);
    tracing::subscriber::set_global_default(subscriber)
        .expect("failed to install tracing subscriber");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let args: Vec<String> = std::env::args().skip(1).collect();

    let provider = CachedProvider::new(
        HostedEmbeddingClient::new(&config.embedding)?,
        config.embedding.cache_capacity,
    );

    if config.store.endpoint.is_some() {
        let store = HttpDocumentStore::new(&config.store)?;
        info!("using hosted document store");
        run_command(store, provider, config, &args).await
    } else {
        let store = SqliteStore::connect(&config.store.sqlite_path).await?;
        info!(path = %config.store.sqlite_path, "using local document store");
        run_command(store, provider, config, &args).await
    }
}

async fn run_command<S, P>(
    store: S,
    provider: P,
    config: AppConfig,
    args: &[String],
) -> anyhow::Result<()>
where
    S: DocumentStore,
    P: EmbeddingProvider,
{
    match args.first().map(String::as_str) {
        Some("backfill") => {
            let report = sync::backfill_embeddings(&store, &provider, &config, BACKFILL_PAUSE)
                .await
                .context("embedding backfill failed")?;
            println!(
                "backfill: {} created, {} skipped, {} failed",
                report.created, report.skipped, report.failed
            );
            Ok(())
        }
        Some("seed") => {
            let path = args
                .get(1)
                .context("usage: faqbot-core seed <corpus.json>")?;
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read corpus file {}", path))?;
            let corpus = serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse corpus file {}", path))?;
            let created = sync::import_corpus(&store, &config, corpus).await?;
            println!("seed: {} documents created", created);
            Ok(())
        }
        Some("chat") | None => run_repl(store, provider, config).await,
        Some(other) => anyhow::bail!("unknown command: {}", other),
    }
}

/// Reads messages line by line from stdin and prints one reply per line
/// as JSON.
async fn run_repl<S, P>(store: S, provider: P, config: AppConfig) -> anyhow::Result<()>
where
    S: DocumentStore,
    P: EmbeddingProvider,
{
    let service = ChatService::new(store, provider, config);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("faqbot ready. Type a question, Ctrl-D to exit.");
    while let Some(line) = lines.next_line().await? {
        match service.classify(&line).await {
            Ok(reply) => println!("{}", serde_json::to_string(&reply)?),
            Err(err) => {
                if !matches!(err, AppError::InvalidInput(_)) {
                    error!(error = %err, "classification failed");
                }
                println!("{}", serde_json::json!({ "error": err.to_string() }));
            }
        }
    }
    Ok(())
}
