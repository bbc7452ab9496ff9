//! HTTP plumbing shared by the REST-based providers.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;

use marksheet_core::config::LlmProvider;
use marksheet_core::error::{ErrorCode, MarksheetError, MarksheetResult};
use marksheet_core::traits::LlmConfig;

/// Resolve the API key from config first, then the provider's env var.
pub(crate) fn resolve_api_key(provider: LlmProvider, config: &LlmConfig) -> MarksheetResult<String> {
    config
        .api_key
        .clone()
        .filter(|key| !key.trim().is_empty())
        .or_else(|| std::env::var(provider.api_key_env()).ok())
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| {
            MarksheetError::Configuration(format!(
                "{} API key not found. Set {} environment variable or provide api_key in config.",
                provider,
                provider.api_key_env()
            ))
        })
}

/// Build a client with JSON content type plus the given headers.
pub(crate) fn build_client(
    headers: &[(&'static str, &str)],
    timeout_secs: Option<u64>,
) -> MarksheetResult<Client> {
    let mut map = HeaderMap::new();
    map.insert(
        reqwest::header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    for (name, value) in headers {
        let value = HeaderValue::from_str(value).map_err(|_| {
            MarksheetError::Configuration(format!("Invalid value for header {}", name))
        })?;
        map.insert(HeaderName::from_static(name), value);
    }

    let mut builder = Client::builder().default_headers(map);
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder
        .build()
        .map_err(|e| MarksheetError::Configuration(format!("Failed to create HTTP client: {}", e)))
}

/// Map a transport failure to an invocation error.
pub(crate) fn send_error(provider: &str, err: reqwest::Error) -> MarksheetError {
    let code = if err.is_timeout() {
        ErrorCode::LlmTimeout
    } else {
        ErrorCode::LlmConnectionFailed
    };
    MarksheetError::llm_with_code(format!("{} API request failed: {}", provider, err), code)
}
