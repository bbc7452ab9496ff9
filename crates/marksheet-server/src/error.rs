//! Error handling for the REST API server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use marksheet_core::{ErrorCode, MarksheetError};
use serde::Serialize;
use serde_json::json;
use std::fmt;

/// API error type.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    // Common error constructors
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            ErrorCode::MediaTooLarge.as_str(),
            message,
        )
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.status, self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code,
                message: self.message,
                details: self.details,
            },
        };

        (self.status, Json(body)).into_response()
    }
}

/// Response status for a pipeline error.
pub fn status_for(err: &MarksheetError) -> StatusCode {
    match err {
        MarksheetError::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        MarksheetError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        MarksheetError::ExtractionFailure { .. } if err.is_client_error() => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        MarksheetError::EmptyDocument => StatusCode::UNPROCESSABLE_ENTITY,
        MarksheetError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        MarksheetError::ModelInvocation { .. }
        | MarksheetError::MalformedModelOutput { .. }
        | MarksheetError::SchemaValidation { .. } => StatusCode::BAD_GATEWAY,
        MarksheetError::ExtractionFailure { .. }
        | MarksheetError::Configuration(_)
        | MarksheetError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// Convert from marksheet-core errors
impl From<MarksheetError> for ApiError {
    fn from(err: MarksheetError) -> Self {
        let status = status_for(&err);
        let api = ApiError::new(status, err.code().as_str(), err.to_string());
        match err.suggestion() {
            Some(suggestion) => api.with_details(json!({ "suggestion": suggestion })),
            None => api,
        }
    }
}

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (MarksheetError::unsupported_media_type("image/gif"), 415),
            (MarksheetError::PayloadTooLarge { size: 2, limit: 1 }, 413),
            (MarksheetError::extraction("bad xref"), 422),
            (MarksheetError::EmptyDocument, 422),
            (MarksheetError::ModelUnavailable("no key".to_string()), 503),
            (MarksheetError::llm("reset"), 502),
            (MarksheetError::malformed("eof"), 502),
            (MarksheetError::schema("missing field `marks`"), 502),
            (MarksheetError::Configuration("bad".to_string()), 500),
        ];
        for (err, status) in cases {
            assert_eq!(status_for(&err).as_u16(), status, "{err}");
        }
    }

    #[test]
    fn test_engine_failure_is_internal() {
        let err = MarksheetError::ExtractionFailure {
            message: "tesseract not found".to_string(),
            code: ErrorCode::ExtEngineFailed,
            source: None,
        };
        assert_eq!(status_for(&err), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_api_error_carries_code_and_suggestion() {
        let api: ApiError = MarksheetError::EmptyDocument.into();
        assert_eq!(api.code, "EXT_003");
        assert!(api.details.unwrap()["suggestion"].is_string());
    }
}
