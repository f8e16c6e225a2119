use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Filter, FindOptions, ProductRecord};

/// Turns free text into a fixed-length vector via an external model.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn dimension(&self) -> usize;
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// The slice of the managed collection the loader and query service need.
#[async_trait]
pub trait ProductCollection: Send + Sync {
    async fn find(&self, filter: &Filter, options: &FindOptions) -> Result<Vec<ProductRecord>>;
    async fn upsert(&self, record: &ProductRecord) -> Result<()>;
}
