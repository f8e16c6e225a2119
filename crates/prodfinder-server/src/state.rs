//! Shared application state.
//!
//! The service context is built once at startup. A failed initialization
//! (missing endpoint, token or API key) is held instead of crashing the
//! process: the static front end still loads, and every `/search` answers
//! 503 with the held message until the configuration is fixed.

use std::sync::Arc;

use prodfinder_core::config::{Config, EmbeddingStrategy};
use prodfinder_core::error::{Error, Result};
use prodfinder_embed::OpenAiEmbedder;
use prodfinder_search::{SearchService, Vectorizer};
use prodfinder_store::DataApiClient;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<Result<SearchService>>,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        let built = build_service(config);
        if let Err(error) = &built {
            tracing::error!(%error, "initialization failed, serving 503s");
        }
        Self {
            inner: Arc::new(built),
        }
    }

    /// Wrap an already-built service; used by tests to inject fakes.
    pub fn from_service(service: SearchService) -> Self {
        Self {
            inner: Arc::new(Ok(service)),
        }
    }

    pub fn failed(error: Error) -> Self {
        Self {
            inner: Arc::new(Err(error)),
        }
    }

    pub fn service(&self) -> std::result::Result<&SearchService, &Error> {
        self.inner.as_ref().as_ref()
    }
}

fn build_service(config: &Config) -> Result<SearchService> {
    let endpoint = config.store.endpoint.as_deref().ok_or_else(|| {
        Error::Initialization("missing store endpoint (set APP_STORE__ENDPOINT)".to_string())
    })?;
    let token = config.store.token.as_deref().ok_or_else(|| {
        Error::Initialization("missing store token (set APP_STORE__TOKEN)".to_string())
    })?;

    let client = DataApiClient::new(token)?;
    let database = client.database(endpoint, &config.store.keyspace);
    let collection = Arc::new(database.collection(&config.store.collection));

    let vectorizer = match config.embedding.strategy {
        EmbeddingStrategy::Client => {
            Vectorizer::Client(Arc::new(OpenAiEmbedder::from_config(&config.embedding)?))
        }
        EmbeddingStrategy::Server => Vectorizer::Server,
    };

    tracing::info!(endpoint, collection = %config.store.collection, "initialized store clients");
    Ok(SearchService::new(
        vectorizer,
        collection,
        config.search.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_endpoint_is_held_as_an_initialization_error() {
        let state = AppState::from_config(&Config::default());
        let err = state.service().expect_err("should hold the error");
        assert!(matches!(err, Error::Initialization(_)));
    }

    #[test]
    fn missing_api_key_is_held_with_complete_store_config() {
        let mut config = Config::default();
        config.store.endpoint = Some("https://db.example.com".to_string());
        config.store.token = Some("secret".to_string());
        let state = AppState::from_config(&config);
        assert!(state.service().is_err());
    }

    #[test]
    fn server_strategy_needs_no_embedding_key() {
        let mut config = Config::default();
        config.store.endpoint = Some("https://db.example.com".to_string());
        config.store.token = Some("secret".to_string());
        config.embedding.strategy = EmbeddingStrategy::Server;
        let state = AppState::from_config(&config);
        assert!(state.service().is_ok());
    }
}
