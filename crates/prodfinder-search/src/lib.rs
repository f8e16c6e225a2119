#![deny(warnings)]
#![deny(unused_imports)]

pub mod loader;
pub mod plan;
pub mod service;

pub use loader::{BulkLoader, LoadReport};
pub use plan::{build_plan, PageWindow, QueryPlan};
pub use service::{SearchService, Vectorizer};
