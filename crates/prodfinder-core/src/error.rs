use thiserror::Error;

/// Failure taxonomy shared by the loader and the query service.
///
/// The HTTP layer maps variants to status codes: `Validation` is a 400,
/// `Initialization` a 503, `Embedding` and `StoreQuery` are 500s with
/// distinguishable messages.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Server initialization failed: {0}")]
    Initialization(String),

    #[error("Failed to generate search embedding: {0}")]
    Embedding(String),

    #[error("Store query failed: {0}")]
    StoreQuery(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
