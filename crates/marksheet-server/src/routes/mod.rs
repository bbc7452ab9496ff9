//! Route definitions for the REST API.

mod extract;
mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower::limit::GlobalConcurrencyLimitLayer;

use crate::state::AppState;

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state
        .max_upload_bytes()
        .saturating_add(extract::BODY_LIMIT_HEADROOM);
    let max_concurrent = state.config.max_concurrent_extractions;

    let extraction = Router::new()
        .route("/extract", post(extract::extract_marksheet))
        .route("/extract/", post(extract::extract_marksheet))
        .route_layer(GlobalConcurrencyLimitLayer::new(max_concurrent))
        .layer(DefaultBodyLimit::max(body_limit));

    Router::new()
        // General
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        // Extraction
        .merge(extraction)
        // Attach state
        .with_state(state)
}

pub use extract::*;
pub use health::*;
