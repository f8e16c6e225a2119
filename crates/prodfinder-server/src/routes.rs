use std::net::SocketAddr;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use prodfinder_core::error::Error;
use prodfinder_core::types::SearchRequest;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

fn error_response(error: &Error) -> Response {
    let status = match error {
        Error::Validation(_) => StatusCode::BAD_REQUEST,
        Error::Initialization(_) | Error::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
        Error::Embedding(_) | Error::StoreQuery(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            message: error.to_string(),
        }),
    )
        .into_response()
}

/// POST /search
///
/// The body is pulled in as a raw JSON value first so that malformed field
/// types come back as a 400 validation error rather than the extractor's
/// default status.
async fn search(State(state): State<AppState>, Json(body): Json<serde_json::Value>) -> Response {
    let service = match state.service() {
        Ok(service) => service,
        Err(error) => return error_response(error),
    };
    let request: SearchRequest = match serde_json::from_value(body) {
        Ok(request) => request,
        Err(e) => return error_response(&Error::Validation(format!("malformed request: {e}"))),
    };
    match service.search(&request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(error) => {
            tracing::warn!(%error, "search failed");
            error_response(&error)
        }
    }
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub fn create_router(state: AppState, public_dir: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/search", post(search))
        .route("/health", get(health))
        .fallback_service(ServeDir::new(public_dir))
        .layer(cors)
        .with_state(state)
}

pub async fn serve(state: AppState, addr: SocketAddr, public_dir: &str) -> std::io::Result<()> {
    let router = create_router(state, public_dir);
    tracing::info!("listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await
}
