//! Middleware for the REST API server.

use axum::{extract::Request, middleware::Next, response::Response};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};

/// Create CORS middleware.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Request logging middleware.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let response = next.run(request).await;

    info!(
        method = %method,
        uri = %uri,
        status = response.status().as_u16(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Request completed"
    );

    response
}

/// Check an `Authorization` header value against the expected key.
fn token_matches(header: Option<&str>, expected_key: &str) -> bool {
    header
        .and_then(|h| h.strip_prefix("Bearer ").or_else(|| h.strip_prefix("Token ")))
        .is_some_and(|token| token == expected_key)
}

/// Reject the request unless auth is off, no key is set, or the header matches.
fn authorize(require_auth: bool, expected_key: &str, header: Option<&str>) -> ApiResult<()> {
    if !require_auth || expected_key.is_empty() || token_matches(header, expected_key) {
        return Ok(());
    }
    let message = match header {
        Some(_) => "Invalid API key",
        None => "Missing Authorization header",
    };
    Err(ApiError::unauthorized(message))
}

/// API key authentication middleware (optional).
pub async fn auth_middleware(request: Request, next: Next) -> ApiResult<Response> {
    // Only enforced when MARKSHEET_REQUIRE_AUTH is set and a key is configured
    let require_auth = std::env::var("MARKSHEET_REQUIRE_AUTH").is_ok();
    let expected_key = std::env::var("MARKSHEET_API_KEY").unwrap_or_default();
    let header = request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok());

    if let Err(err) = authorize(require_auth, &expected_key, header) {
        warn!(uri = %request.uri(), "Rejected unauthenticated request");
        return Err(err);
    }

    Ok(next.run(request).await)
}
