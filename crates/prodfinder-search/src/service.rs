//! Plan execution against the injected collaborators.

use std::sync::Arc;

use prodfinder_core::config::SearchConfig;
use prodfinder_core::error::Result;
use prodfinder_core::traits::{Embedder, ProductCollection};
use prodfinder_core::types::{Filter, FindOptions, SearchRequest, SearchResponse, Sort};

use crate::plan::{build_plan, QueryPlan};

/// The two mutually exclusive vectorization strategies.
///
/// `Client` resolves query/record text into a vector through the embeddings
/// API; `Server` passes the text through and lets the store vectorize,
/// lexically match and rerank.
#[derive(Clone)]
pub enum Vectorizer {
    Client(Arc<dyn Embedder>),
    Server,
}

impl Vectorizer {
    pub(crate) async fn sort_for(&self, text: String) -> Result<Sort> {
        match self {
            Self::Client(embedder) => Ok(Sort::ByVector(embedder.embed(&text).await?)),
            Self::Server => Ok(Sort::Hybrid(text)),
        }
    }
}

/// Stateless request handler: plan, execute one collection read, window the
/// rows. Owns no state beyond the injected collaborators, so concurrent
/// requests need no coordination.
#[derive(Clone)]
pub struct SearchService {
    vectorizer: Vectorizer,
    collection: Arc<dyn ProductCollection>,
    config: SearchConfig,
}

impl std::fmt::Debug for SearchService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SearchService {
    pub fn new(
        vectorizer: Vectorizer,
        collection: Arc<dyn ProductCollection>,
        config: SearchConfig,
    ) -> Self {
        Self {
            vectorizer,
            collection,
            config,
        }
    }

    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let plan = build_plan(request, &self.config)?;
        let window = plan.window();
        tracing::debug!(?plan, "executing search plan");

        let (filter, sort) = match plan {
            QueryPlan::Vector { text, filter, .. } => {
                (filter, self.vectorizer.sort_for(text).await?)
            }
            QueryPlan::Filter { filter, .. } => (filter, Sort::ById),
            QueryPlan::Listing { .. } => (Filter::default(), Sort::ById),
        };

        let options = FindOptions {
            sort,
            skip: window.skip(),
            limit: window.fetch_limit(),
            include_vectors: false,
        };
        let rows = self.collection.find(&filter, &options).await?;
        let (results, has_next_page) = window.apply(rows);
        tracing::info!(
            page = window.page,
            returned = results.len(),
            has_next_page,
            "search completed"
        );

        Ok(SearchResponse {
            results,
            has_next_page,
            current_page: window.page,
        })
    }
}
