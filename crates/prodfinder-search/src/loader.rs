//! One-shot bulk load: parse JSON records, resolve vectors, upsert by id.

use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};

use prodfinder_core::error::{Error, Result};
use prodfinder_core::traits::ProductCollection;
use prodfinder_core::types::ProductRecord;

use crate::service::Vectorizer;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub failed: usize,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

impl Vectorizer {
    /// Attach a `$vector` (client strategy) or mark the description for
    /// server-side vectorization. An empty description gets neither; the
    /// record still loads and participates in filter searches.
    pub(crate) async fn prepare(&self, record: &mut ProductRecord) -> Result<()> {
        if record.description.trim().is_empty() {
            return Ok(());
        }
        match self {
            Self::Client(embedder) => {
                record.vector = Some(embedder.embed(&record.description).await?);
            }
            Self::Server => {
                record.vectorize = Some(record.description.clone());
            }
        }
        Ok(())
    }
}

/// Sequential batch loader. Re-running it is idempotent: every write is an
/// upsert keyed on `productId`.
pub struct BulkLoader {
    vectorizer: Vectorizer,
    collection: Arc<dyn ProductCollection>,
}

impl BulkLoader {
    pub fn new(vectorizer: Vectorizer, collection: Arc<dyn ProductCollection>) -> Self {
        Self {
            vectorizer,
            collection,
        }
    }

    pub fn parse_records(raw: &str) -> Result<Vec<ProductRecord>> {
        serde_json::from_str(raw).map_err(|e| Error::Validation(format!("product data: {e}")))
    }

    /// Records are processed strictly one at a time, each fully awaiting its
    /// embedding call and write. A per-record failure is logged and counted;
    /// the run continues with the remaining records.
    pub async fn load(&self, records: Vec<ProductRecord>) -> LoadReport {
        let pb = ProgressBar::new(records.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} products ({percent}%) {msg}",
                )
                .unwrap()
                .progress_chars("#>-"),
        );

        let mut report = LoadReport::default();
        for mut record in records {
            pb.set_message(record.product_id.clone());
            match self.load_one(&mut record).await {
                Ok(()) => report.loaded += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(product = %record.product_id, error = %e, "record failed, continuing");
                }
            }
            pb.inc(1);
        }
        pb.finish_with_message(format!("{} loaded, {} failed", report.loaded, report.failed));
        report
    }

    async fn load_one(&self, record: &mut ProductRecord) -> Result<()> {
        self.vectorizer.prepare(record).await?;
        self.collection.upsert(record).await
    }
}
