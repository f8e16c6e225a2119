use std::fs;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use prodfinder_core::config::{Config, EmbeddingStrategy};
use prodfinder_embed::OpenAiEmbedder;
use prodfinder_search::{BulkLoader, Vectorizer};
use prodfinder_store::{ensure_collection, CollectionSpec, DataApiClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load()?;
    let endpoint = config
        .store
        .endpoint
        .as_deref()
        .context("missing store endpoint (set APP_STORE__ENDPOINT)")?;
    let token = config
        .store
        .token
        .as_deref()
        .context("missing store token (set APP_STORE__TOKEN)")?;

    let client = DataApiClient::new(token)?;
    let database = client.database(endpoint, &config.store.keyspace);

    let spec = CollectionSpec::from_config(
        &config.store.collection,
        &config.loader.metric,
        &config.embedding,
    );
    ensure_collection(&database, &spec).await?;
    let collection = Arc::new(database.collection(&config.store.collection));

    let vectorizer = match config.embedding.strategy {
        EmbeddingStrategy::Client => {
            Vectorizer::Client(Arc::new(OpenAiEmbedder::from_config(&config.embedding)?))
        }
        EmbeddingStrategy::Server => Vectorizer::Server,
    };

    let raw = fs::read_to_string(&config.loader.data_path)
        .with_context(|| format!("reading {}", config.loader.data_path))?;
    let records = BulkLoader::parse_records(&raw)?;
    tracing::info!(count = records.len(), path = %config.loader.data_path, "loading products");

    let loader = BulkLoader::new(vectorizer, collection);
    let report = loader.load(records).await;
    tracing::info!(loaded = report.loaded, failed = report.failed, "load finished");

    if !report.is_clean() {
        anyhow::bail!(
            "{} of {} records failed to load",
            report.failed,
            report.failed + report.loaded
        );
    }
    Ok(())
}
