#![allow(clippy::missing_docs_in_private_items)]

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use api_state::ApiState;
use routes::{
    contract::{create_report, get_summary, upload_contract},
    health::health,
};

pub mod api_state;
pub mod error;
pub mod routes;

/// Router for the contract compliance API.
///
/// Upload bodies are capped by the configured limit; CORS is wide open, as
/// the service fronts a browser client on another origin.
pub fn contract_routes(app_state: &ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/contract", post(create_report))
        .route("/contract/upload", post(upload_contract))
        .route("/contract/summary", post(get_summary))
        .layer(DefaultBodyLimit::max(app_state.config.max_upload_bytes))
        .layer(CorsLayer::permissive())
        .with_state(app_state.clone())
}
