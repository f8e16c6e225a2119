//! Configuration loader.
//!
//! Merges `config.toml` with `APP_`-prefixed environment variables
//! (`APP_STORE__TOKEN`, `APP_EMBEDDING__API_KEY`, ...). Secrets are expected
//! to arrive via the environment; every other field has a working default so
//! an empty config still produces a runnable demo setup.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Which side resolves text into a vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingStrategy {
    /// Call the embeddings API locally and write `$vector`.
    Client,
    /// Write `$vectorize` text and let the store embed and rerank.
    Server,
}

/// What a request with no query and no filters gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyRequestPolicy {
    /// An unfiltered listing sorted by document id (default; the front
    /// end's initial page load relies on it).
    Listing,
    /// A 400 requiring at least one query or filter term.
    Reject,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub endpoint: Option<String>,
    pub token: Option<String>,
    pub keyspace: String,
    pub collection: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            token: None,
            keyspace: "default_keyspace".to_string(),
            collection: "products".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub dimension: usize,
    pub strategy: EmbeddingStrategy,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1/embeddings".to_string(),
            api_key: None,
            model: "text-embedding-3-small".to_string(),
            dimension: 1536,
            strategy: EmbeddingStrategy::Client,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub default_limit: u32,
    pub empty_request: EmptyRequestPolicy,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            empty_request: EmptyRequestPolicy::Listing,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
    pub public_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:3000".to_string(),
            public_dir: "public".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub data_path: String,
    pub metric: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            data_path: "data/products.json".to_string(),
            metric: "cosine".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub embedding: EmbeddingConfig,
    pub search: SearchConfig,
    pub server: ServerConfig,
    pub loader: LoaderConfig,
}

impl Config {
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Toml::file("config.toml"))
            .merge(Env::prefixed("APP_").split("__"));
        Self::from_figment(figment)
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        figment.extract().map_err(|e| Error::Config(e.to_string()))
    }
}
