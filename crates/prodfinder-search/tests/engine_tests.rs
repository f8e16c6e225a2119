use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use prodfinder_core::config::SearchConfig;
use prodfinder_core::error::{Error, Result};
use prodfinder_core::traits::{Embedder, ProductCollection};
use prodfinder_core::types::{Filter, FindOptions, ProductRecord, SearchRequest, Sort};
use prodfinder_search::{BulkLoader, SearchService, Vectorizer};

struct FakeEmbedder {
    dim: usize,
    fail: bool,
}

#[async_trait]
impl Embedder for FakeEmbedder {
    fn dimension(&self) -> usize {
        self.dim
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.fail {
            return Err(Error::Embedding("quota exhausted".to_string()));
        }
        let mut vector = vec![0.0; self.dim];
        vector[0] = text.len() as f32;
        Ok(vector)
    }
}

/// In-memory stand-in for the managed collection: honors filter terms,
/// id-sort, skip and limit the way the store would.
#[derive(Default)]
struct FakeCollection {
    rows: Vec<ProductRecord>,
    finds: Mutex<Vec<FindOptions>>,
    upserts: Mutex<Vec<ProductRecord>>,
    fail_upsert_for: Option<String>,
}

impl FakeCollection {
    fn matches(filter: &Filter, record: &ProductRecord) -> bool {
        if let Some(category) = &filter.category {
            if &record.category != category {
                return false;
            }
        }
        if let Some(city) = &filter.city {
            if record.city.as_ref() != Some(city) {
                return false;
            }
        }
        if let Some(min) = filter.min_price {
            if record.price < min {
                return false;
            }
        }
        if let Some(max) = filter.max_price {
            if record.price > max {
                return false;
            }
        }
        true
    }
}

#[async_trait]
impl ProductCollection for FakeCollection {
    async fn find(&self, filter: &Filter, options: &FindOptions) -> Result<Vec<ProductRecord>> {
        self.finds.lock().expect("lock").push(options.clone());
        let mut rows: Vec<ProductRecord> = self
            .rows
            .iter()
            .filter(|r| Self::matches(filter, r))
            .cloned()
            .collect();
        if options.sort == Sort::ById {
            rows.sort_by(|a, b| a.product_id.cmp(&b.product_id));
        }
        Ok(rows
            .into_iter()
            .skip(options.skip as usize)
            .take(options.limit as usize)
            .collect())
    }

    async fn upsert(&self, record: &ProductRecord) -> Result<()> {
        if self.fail_upsert_for.as_deref() == Some(record.product_id.as_str()) {
            return Err(Error::StoreQuery("write rejected".to_string()));
        }
        self.upserts.lock().expect("lock").push(record.clone());
        Ok(())
    }
}

fn record(product_id: &str, price: f64, category: &str) -> ProductRecord {
    ProductRecord {
        id: Some(product_id.to_string()),
        product_id: product_id.to_string(),
        name: format!("Product {product_id}"),
        description: format!("Description of {product_id}"),
        price,
        currency: "USD".to_string(),
        category: category.to_string(),
        city: None,
        image_url: format!("images/{product_id}.jpg"),
        vector: None,
        vectorize: None,
    }
}

fn client_service(collection: Arc<FakeCollection>) -> SearchService {
    let embedder = Arc::new(FakeEmbedder {
        dim: 8,
        fail: false,
    });
    SearchService::new(
        Vectorizer::Client(embedder),
        collection,
        SearchConfig::default(),
    )
}

#[tokio::test]
async fn two_record_pagination_scenario() {
    let collection = Arc::new(FakeCollection {
        rows: vec![record("a", 10.0, "X"), record("b", 20.0, "X")],
        ..Default::default()
    });
    let service = client_service(collection.clone());

    let page1 = SearchRequest {
        category: Some("X".to_string()),
        limit: Some(1),
        page: Some(1),
        ..Default::default()
    };
    let response = service.search(&page1).await.expect("page 1");
    assert_eq!(response.results.len(), 1);
    assert_eq!(response.results[0].product_id, "a");
    assert!(response.has_next_page);
    assert_eq!(response.current_page, 1);

    let page2 = SearchRequest {
        page: Some(2),
        ..page1
    };
    let response = service.search(&page2).await.expect("page 2");
    assert_eq!(response.results.len(), 1);
    assert_eq!(response.results[0].product_id, "b");
    assert!(!response.has_next_page);
    assert_eq!(response.current_page, 2);
}

#[tokio::test]
async fn fetches_one_extra_row_and_never_returns_more_than_limit() {
    let rows: Vec<ProductRecord> = (0..12)
        .map(|i| record(&format!("p{i:02}"), 10.0 + f64::from(i), "Bulk"))
        .collect();
    let collection = Arc::new(FakeCollection {
        rows,
        ..Default::default()
    });
    let service = client_service(collection.clone());

    let request = SearchRequest {
        category: Some("Bulk".to_string()),
        limit: Some(5),
        ..Default::default()
    };
    let response = service.search(&request).await.expect("search");
    assert_eq!(response.results.len(), 5);
    assert!(response.has_next_page);

    let finds = collection.finds.lock().expect("lock");
    assert_eq!(finds.len(), 1);
    assert_eq!(finds[0].limit, 6);
    assert_eq!(finds[0].skip, 0);
    assert!(!finds[0].include_vectors);
}

#[tokio::test]
async fn filter_only_requests_sort_by_id_and_repeat_identically() {
    let collection = Arc::new(FakeCollection {
        rows: vec![
            record("c", 30.0, "X"),
            record("a", 10.0, "X"),
            record("b", 20.0, "X"),
        ],
        ..Default::default()
    });
    let service = client_service(collection.clone());
    let request = SearchRequest {
        category: Some("X".to_string()),
        limit: Some(2),
        ..Default::default()
    };

    let first = service.search(&request).await.expect("first");
    let second = service.search(&request).await.expect("second");
    assert_eq!(first.results, second.results);
    let ids: Vec<&str> = first.results.iter().map(|r| r.product_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);

    let finds = collection.finds.lock().expect("lock");
    assert!(finds.iter().all(|o| o.sort == Sort::ById));
}

#[tokio::test]
async fn vector_query_carries_filter_and_embedded_sort() {
    let collection = Arc::new(FakeCollection {
        rows: vec![record("a", 10.0, "X")],
        ..Default::default()
    });
    let service = client_service(collection.clone());
    let request = SearchRequest {
        query: Some("lamp".to_string()),
        category: Some("X".to_string()),
        min_price: Some(5.0),
        ..Default::default()
    };
    service.search(&request).await.expect("search");

    let finds = collection.finds.lock().expect("lock");
    match &finds[0].sort {
        Sort::ByVector(vector) => assert_eq!(vector.len(), 8),
        other => panic!("expected vector sort, got {other:?}"),
    }
}

#[tokio::test]
async fn server_strategy_delegates_ranking_to_the_store() {
    let collection = Arc::new(FakeCollection {
        rows: vec![record("a", 10.0, "X")],
        ..Default::default()
    });
    let service = SearchService::new(
        Vectorizer::Server,
        collection.clone(),
        SearchConfig::default(),
    );
    let request = SearchRequest {
        query: Some("red kettle".to_string()),
        ..Default::default()
    };
    service.search(&request).await.expect("search");

    let finds = collection.finds.lock().expect("lock");
    assert_eq!(finds[0].sort, Sort::Hybrid("red kettle".to_string()));
}

#[tokio::test]
async fn embedding_failure_surfaces_as_an_embedding_error() {
    let collection = Arc::new(FakeCollection::default());
    let embedder = Arc::new(FakeEmbedder { dim: 8, fail: true });
    let service = SearchService::new(
        Vectorizer::Client(embedder),
        collection,
        SearchConfig::default(),
    );
    let request = SearchRequest {
        query: Some("lamp".to_string()),
        ..Default::default()
    };
    let err = service.search(&request).await.expect_err("should fail");
    assert!(matches!(err, Error::Embedding(_)));
}

#[tokio::test]
async fn listing_fallback_reads_the_whole_collection_in_id_order() {
    let collection = Arc::new(FakeCollection {
        rows: vec![record("b", 20.0, "Y"), record("a", 10.0, "X")],
        ..Default::default()
    });
    let service = client_service(collection.clone());

    let response = service.search(&SearchRequest::default()).await.expect("listing");
    let ids: Vec<&str> = response.results.iter().map(|r| r.product_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert!(!response.has_next_page);
}

#[tokio::test]
async fn loader_attaches_vectors_under_the_client_strategy() {
    let collection = Arc::new(FakeCollection::default());
    let embedder = Arc::new(FakeEmbedder {
        dim: 4,
        fail: false,
    });
    let loader = BulkLoader::new(Vectorizer::Client(embedder), collection.clone());

    let report = loader
        .load(vec![record("a", 10.0, "X"), record("b", 20.0, "X")])
        .await;
    assert_eq!(report.loaded, 2);
    assert!(report.is_clean());

    let upserts = collection.upserts.lock().expect("lock");
    assert!(upserts.iter().all(|r| r.vector.as_ref().map(Vec::len) == Some(4)));
    assert!(upserts.iter().all(|r| r.vectorize.is_none()));
}

#[tokio::test]
async fn loader_marks_vectorize_text_under_the_server_strategy() {
    let collection = Arc::new(FakeCollection::default());
    let loader = BulkLoader::new(Vectorizer::Server, collection.clone());

    loader.load(vec![record("a", 10.0, "X")]).await;

    let upserts = collection.upserts.lock().expect("lock");
    assert_eq!(upserts[0].vectorize.as_deref(), Some("Description of a"));
    assert!(upserts[0].vector.is_none());
}

#[tokio::test]
async fn loader_continues_past_a_failing_record() {
    let collection = Arc::new(FakeCollection {
        fail_upsert_for: Some("b".to_string()),
        ..Default::default()
    });
    let loader = BulkLoader::new(Vectorizer::Server, collection.clone());

    let report = loader
        .load(vec![
            record("a", 10.0, "X"),
            record("b", 20.0, "X"),
            record("c", 30.0, "X"),
        ])
        .await;
    assert_eq!(report.loaded, 2);
    assert_eq!(report.failed, 1);
    assert!(!report.is_clean());

    let upserts = collection.upserts.lock().expect("lock");
    let ids: Vec<&str> = upserts.iter().map(|r| r.product_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "c"]);
}

#[tokio::test]
async fn loader_skips_vectors_for_empty_descriptions() {
    let collection = Arc::new(FakeCollection::default());
    let embedder = Arc::new(FakeEmbedder {
        dim: 4,
        fail: false,
    });
    let loader = BulkLoader::new(Vectorizer::Client(embedder), collection.clone());

    let mut blank = record("a", 10.0, "X");
    blank.description = "   ".to_string();
    let report = loader.load(vec![blank]).await;
    assert!(report.is_clean());

    let upserts = collection.upserts.lock().expect("lock");
    assert!(upserts[0].vector.is_none());
}

#[test]
fn malformed_product_data_is_a_validation_error() {
    let err = BulkLoader::parse_records("{not json").expect_err("should fail");
    assert!(matches!(err, Error::Validation(_)));
}
