//! HTTP surface for the product search demo.
//!
//! # Endpoints
//!
//! - `POST /search` - vector, filter or hybrid product search with
//!   skip-based pagination
//! - `GET /health` - liveness and version
//! - everything else - static front-end assets

pub mod routes;
pub mod state;

pub use routes::{create_router, serve};
pub use state::AppState;
