//! JSON-over-HTTP client for the managed document/vector store.
//!
//! Every operation is a single-key command object POSTed to the keyspace URL
//! (database-level commands) or the collection URL (document commands). The
//! store reports failures in an `errors` array in the response body, which is
//! checked before the HTTP status.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use prodfinder_core::error::{Error, Result};
use prodfinder_core::traits::ProductCollection;
use prodfinder_core::types::{Filter, FindOptions, ProductRecord, Sort};

use crate::provision::CollectionSpec;

pub struct DataApiClient {
    http: reqwest::Client,
    token: String,
}

impl DataApiClient {
    pub fn new(token: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("prodfinder/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Initialization(format!("store client: {e}")))?;
        Ok(Self {
            http,
            token: token.to_string(),
        })
    }

    pub fn database(&self, endpoint: &str, keyspace: &str) -> Database {
        Database {
            http: self.http.clone(),
            token: self.token.clone(),
            base_url: format!("{}/api/json/v1/{}", endpoint.trim_end_matches('/'), keyspace),
        }
    }
}

#[derive(Clone)]
pub struct Database {
    http: reqwest::Client,
    token: String,
    base_url: String,
}

impl Database {
    pub fn collection(&self, name: &str) -> Collection {
        Collection {
            http: self.http.clone(),
            token: self.token.clone(),
            url: format!("{}/{}", self.base_url, name),
        }
    }

    pub async fn list_collections(&self) -> Result<Vec<String>> {
        let body = execute(&self.http, &self.base_url, &self.token, &find_collections_command()).await?;
        parse_collection_names(&body)
    }

    pub async fn create_collection(&self, spec: &CollectionSpec) -> Result<()> {
        execute(
            &self.http,
            &self.base_url,
            &self.token,
            &create_collection_command(spec),
        )
        .await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct Collection {
    http: reqwest::Client,
    token: String,
    url: String,
}

impl Collection {
    /// Plain insert, no idempotence. The loader prefers [`ProductCollection::upsert`];
    /// this stays for one-shot writes where duplicate keys should fail loudly.
    pub async fn insert_one(&self, record: &ProductRecord) -> Result<()> {
        execute(&self.http, &self.url, &self.token, &insert_one_command(record)?).await?;
        Ok(())
    }
}

#[async_trait]
impl ProductCollection for Collection {
    async fn find(&self, filter: &Filter, options: &FindOptions) -> Result<Vec<ProductRecord>> {
        let command = match &options.sort {
            Sort::Hybrid(text) => find_and_rerank_command(filter, text, options),
            _ => find_command(filter, options),
        };
        let body = execute(&self.http, &self.url, &self.token, &command).await?;
        parse_documents(&body)
    }

    async fn upsert(&self, record: &ProductRecord) -> Result<()> {
        execute(&self.http, &self.url, &self.token, &update_one_upsert_command(record)?).await?;
        Ok(())
    }
}

async fn execute(http: &reqwest::Client, url: &str, token: &str, command: &Value) -> Result<Value> {
    tracing::debug!(url, command = %command_name(command), "store command");
    let response = http
        .post(url)
        .header("Token", token)
        .json(command)
        .send()
        .await
        .map_err(|e| Error::StoreQuery(e.to_string()))?;
    let status = response.status();
    let body: Value = response
        .json()
        .await
        .map_err(|e| Error::StoreQuery(e.to_string()))?;
    if let Some(errors) = body.get("errors").and_then(Value::as_array) {
        if let Some(first) = errors.first() {
            let message = first
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown store error");
            return Err(Error::StoreQuery(message.to_string()));
        }
    }
    if !status.is_success() {
        return Err(Error::StoreQuery(format!("store returned {status}")));
    }
    Ok(body)
}

fn command_name(command: &Value) -> &str {
    command
        .as_object()
        .and_then(|o| o.keys().next())
        .map_or("unknown", String::as_str)
}

fn find_command(filter: &Filter, options: &FindOptions) -> Value {
    let mut inner = Map::new();
    inner.insert("filter".to_string(), filter.to_document());
    let sort = match &options.sort {
        Sort::ById => json!({ "_id": 1 }),
        Sort::ByVector(vector) => json!({ "$vector": vector }),
        // Hybrid goes through findAndRerank, never through find
        Sort::Hybrid(_) => json!({ "_id": 1 }),
    };
    inner.insert("sort".to_string(), sort);
    if !options.include_vectors {
        inner.insert(
            "projection".to_string(),
            json!({ "$vector": 0, "$vectorize": 0 }),
        );
    }
    inner.insert(
        "options".to_string(),
        json!({ "limit": options.limit, "skip": options.skip }),
    );
    json!({ "find": Value::Object(inner) })
}

fn find_and_rerank_command(filter: &Filter, query: &str, options: &FindOptions) -> Value {
    let mut inner = Map::new();
    inner.insert("filter".to_string(), filter.to_document());
    inner.insert("sort".to_string(), json!({ "$hybrid": query }));
    if !options.include_vectors {
        inner.insert(
            "projection".to_string(),
            json!({ "$vector": 0, "$vectorize": 0 }),
        );
    }
    inner.insert(
        "options".to_string(),
        json!({ "limit": options.limit, "skip": options.skip }),
    );
    json!({ "findAndRerank": Value::Object(inner) })
}

fn insert_one_command(record: &ProductRecord) -> Result<Value> {
    let document = serde_json::to_value(record).map_err(|e| Error::StoreQuery(e.to_string()))?;
    Ok(json!({ "insertOne": { "document": document } }))
}

fn update_one_upsert_command(record: &ProductRecord) -> Result<Value> {
    let mut document = serde_json::to_value(record).map_err(|e| Error::StoreQuery(e.to_string()))?;
    if let Value::Object(fields) = &mut document {
        // the key lives in the filter, not in $set
        fields.remove("_id");
    }
    Ok(json!({
        "updateOne": {
            "filter": { "_id": record.product_id },
            "update": { "$set": document },
            "options": { "upsert": true }
        }
    }))
}

fn find_collections_command() -> Value {
    json!({ "findCollections": { "options": { "explain": false } } })
}

fn create_collection_command(spec: &CollectionSpec) -> Value {
    let mut vector = json!({ "dimension": spec.dimension, "metric": spec.metric });
    if let Some(service) = &spec.vectorize {
        vector["service"] = json!({ "provider": service.provider, "modelName": service.model });
    }
    let mut options = Map::new();
    options.insert("vector".to_string(), vector);
    if let Some(analyzer) = &spec.lexical_analyzer {
        options.insert(
            "lexical".to_string(),
            json!({ "enabled": true, "analyzer": analyzer }),
        );
    }
    if let Some(rerank) = &spec.rerank {
        options.insert(
            "rerank".to_string(),
            json!({
                "enabled": true,
                "service": { "provider": rerank.provider, "modelName": rerank.model }
            }),
        );
    }
    json!({
        "createCollection": { "name": spec.name, "options": Value::Object(options) }
    })
}

fn parse_documents(body: &Value) -> Result<Vec<ProductRecord>> {
    let documents = body
        .pointer("/data/documents")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::StoreQuery("response carried no documents".to_string()))?;
    documents
        .iter()
        .map(|doc| {
            serde_json::from_value(doc.clone())
                .map_err(|e| Error::StoreQuery(format!("malformed document: {e}")))
        })
        .collect()
}

fn parse_collection_names(body: &Value) -> Result<Vec<String>> {
    let names = body
        .pointer("/status/collections")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::StoreQuery("response carried no collection list".to_string()))?;
    Ok(names
        .iter()
        .filter_map(Value::as_str)
        .map(String::from)
        .collect())
}
