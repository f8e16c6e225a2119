//! Client-side embedding resolution.
//!
//! Wraps the external embeddings API behind the core [`Embedder`] trait. The
//! HTTP client is pooled and reused across requests; one embedder instance
//! serves both the loader and the query service.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use prodfinder_core::config::EmbeddingConfig;
use prodfinder_core::error::{Error, Result};
use prodfinder_core::traits::Embedder;

pub struct OpenAiEmbedder {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    dimension: usize,
}

impl std::fmt::Debug for OpenAiEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiEmbedder")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("dimension", &self.dimension)
            .finish()
    }
}

impl OpenAiEmbedder {
    pub fn new(api_url: &str, api_key: &str, model: &str, dimension: usize) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("prodfinder/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Initialization(format!("embedding client: {e}")))?;
        Ok(Self {
            http,
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            dimension,
        })
    }

    /// Fails with `Initialization` when no API key is configured; the server
    /// holds that error and answers 503 instead of crashing.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = config.api_key.as_deref().ok_or_else(|| {
            Error::Initialization(
                "missing embedding API key (set APP_EMBEDDING__API_KEY)".to_string(),
            )
        })?;
        Self::new(&config.api_url, api_key, &config.model, config.dimension)
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}

fn first_embedding(response: EmbeddingsResponse, dimension: usize) -> Result<Vec<f32>> {
    let mut data = response.data;
    if data.is_empty() {
        return Err(Error::Embedding("provider returned no data".to_string()));
    }
    let embedding = data.remove(0).embedding;
    if embedding.len() != dimension {
        return Err(Error::Embedding(format!(
            "expected a {dimension}-dimension vector, got {}",
            embedding.len()
        )));
    }
    Ok(embedding)
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        tracing::debug!(model = %self.model, chars = text.len(), "requesting embedding");
        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&json!({ "model": self.model, "input": text.trim() }))
            .send()
            .await
            .map_err(|e| Error::Embedding(e.to_string()))?;
        if !response.status().is_success() {
            return Err(Error::Embedding(format!(
                "provider returned {}",
                response.status()
            )));
        }
        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(e.to_string()))?;
        first_embedding(parsed, self.dimension)
    }
}
