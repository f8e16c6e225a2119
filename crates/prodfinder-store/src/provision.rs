//! Collection provisioning: guarantee the target collection exists with the
//! declared search configuration before any data is written.
//!
//! An existing collection is used as-is; there is no schema-compatibility
//! check. Creation errors propagate and abort the load.

use prodfinder_core::config::{EmbeddingConfig, EmbeddingStrategy};
use prodfinder_core::error::Result;

use crate::client::Database;

#[derive(Debug, Clone)]
pub struct VectorizeService {
    pub provider: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct RerankService {
    pub provider: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct CollectionSpec {
    pub name: String,
    pub dimension: usize,
    pub metric: String,
    pub lexical_analyzer: Option<String>,
    pub rerank: Option<RerankService>,
    pub vectorize: Option<VectorizeService>,
}

impl CollectionSpec {
    /// Client strategy gets a plain vector collection. Server strategy makes
    /// the store embed (`$vectorize`), lexically index and rerank, so the
    /// collection is created with those services enabled.
    pub fn from_config(name: &str, metric: &str, embedding: &EmbeddingConfig) -> Self {
        let base = Self {
            name: name.to_string(),
            dimension: embedding.dimension,
            metric: metric.to_string(),
            lexical_analyzer: None,
            rerank: None,
            vectorize: None,
        };
        match embedding.strategy {
            EmbeddingStrategy::Client => base,
            EmbeddingStrategy::Server => Self {
                lexical_analyzer: Some("standard".to_string()),
                rerank: Some(RerankService {
                    provider: "nvidia".to_string(),
                    model: "nvidia/llama-3.2-nv-rerankqa-1b-v2".to_string(),
                }),
                vectorize: Some(VectorizeService {
                    provider: "openai".to_string(),
                    model: embedding.model.clone(),
                }),
                ..base
            },
        }
    }
}

pub async fn ensure_collection(db: &Database, spec: &CollectionSpec) -> Result<()> {
    let names = db.list_collections().await?;
    if names.iter().any(|n| n == &spec.name) {
        tracing::info!(collection = %spec.name, "collection already exists, using as-is");
        return Ok(());
    }
    tracing::info!(
        collection = %spec.name,
        dimension = spec.dimension,
        metric = %spec.metric,
        "creating collection"
    );
    db.create_collection(spec).await
}
