//! Error types for marksheet extraction.
//!
//! Every pipeline stage returns a [`MarksheetResult`]; the boundary layer
//! pattern matches on the variant (or [`MarksheetError::is_client_error`])
//! to pick a response status. Each variant carries a stable [`ErrorCode`]
//! for programmatic handling.

use std::time::Duration;

use marksheet_extractors::ExtractError;
use thiserror::Error;

/// Result type alias for marksheet operations.
pub type MarksheetResult<T> = Result<T, MarksheetError>;

/// Main error type for all marksheet operations.
#[derive(Error, Debug)]
pub enum MarksheetError {
    /// The declared media type is not one of the accepted formats.
    #[error("Unsupported media type: {media_type}")]
    UnsupportedMediaType { media_type: String },

    /// The upload exceeds the configured size bound.
    #[error("Payload too large: {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    /// The bytes could not be read as the declared type, or the engine failed.
    #[error("Extraction failed: {message}")]
    ExtractionFailure {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Extraction succeeded but recovered no text.
    #[error("Could not extract any text from the document")]
    EmptyDocument,

    /// No model handle is available.
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// The model call itself failed (network, auth, quota, timeout).
    #[error("Model invocation failed: {message}")]
    ModelInvocation {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The model replied, but not with parseable JSON.
    #[error("Malformed model output: {message}")]
    MalformedModelOutput { message: String, code: ErrorCode },

    /// The parsed JSON does not satisfy the data model.
    #[error("Schema validation failed: {message}")]
    SchemaValidation { message: String, code: ErrorCode },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Boundary (MEDIA_xxx)
    MediaUnsupported,
    MediaTooLarge,

    // Extraction (EXT_xxx)
    ExtDecodeFailed,
    ExtEngineFailed,
    ExtEmptyDocument,

    // LLM (LLM_xxx)
    LlmUnavailable,
    LlmConnectionFailed,
    LlmGenerationFailed,
    LlmTimeout,
    LlmAuthFailed,
    LlmRateLimited,

    // Parse (PARSE_xxx)
    ParseInvalidJson,

    // Validation (VAL_xxx)
    ValSchemaMismatch,
    ValConfidencePolicy,

    // Configuration (CFG_xxx)
    ConfigInvalid,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::MediaUnsupported => "MEDIA_001",
            ErrorCode::MediaTooLarge => "MEDIA_002",
            ErrorCode::ExtDecodeFailed => "EXT_001",
            ErrorCode::ExtEngineFailed => "EXT_002",
            ErrorCode::ExtEmptyDocument => "EXT_003",
            ErrorCode::LlmUnavailable => "LLM_001",
            ErrorCode::LlmConnectionFailed => "LLM_002",
            ErrorCode::LlmGenerationFailed => "LLM_003",
            ErrorCode::LlmTimeout => "LLM_004",
            ErrorCode::LlmAuthFailed => "LLM_005",
            ErrorCode::LlmRateLimited => "LLM_006",
            ErrorCode::ParseInvalidJson => "PARSE_001",
            ErrorCode::ValSchemaMismatch => "VAL_001",
            ErrorCode::ValConfidencePolicy => "VAL_002",
            ErrorCode::ConfigInvalid => "CFG_001",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl MarksheetError {
    /// Create an unsupported media type error.
    pub fn unsupported_media_type(media_type: impl Into<String>) -> Self {
        Self::UnsupportedMediaType {
            media_type: media_type.into(),
        }
    }

    /// Create an extraction error caused by unreadable input.
    pub fn extraction(message: impl Into<String>) -> Self {
        Self::ExtractionFailure {
            message: message.into(),
            code: ErrorCode::ExtDecodeFailed,
            source: None,
        }
    }

    /// Create a model invocation error.
    pub fn llm(message: impl Into<String>) -> Self {
        Self::ModelInvocation {
            message: message.into(),
            code: ErrorCode::LlmGenerationFailed,
            source: None,
        }
    }

    /// Create a model invocation error with a specific code.
    pub fn llm_with_code(message: impl Into<String>, code: ErrorCode) -> Self {
        Self::ModelInvocation {
            message: message.into(),
            code,
            source: None,
        }
    }

    /// Create a model timeout error.
    pub fn llm_timeout(after: Duration) -> Self {
        Self::llm_with_code(
            format!("Model did not respond within {}s", after.as_secs()),
            ErrorCode::LlmTimeout,
        )
    }

    /// Create a malformed output error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedModelOutput {
            message: message.into(),
            code: ErrorCode::ParseInvalidJson,
        }
    }

    /// Create a schema validation error.
    pub fn schema(message: impl Into<String>) -> Self {
        Self::SchemaValidation {
            message: message.into(),
            code: ErrorCode::ValSchemaMismatch,
        }
    }

    /// Create a validation-policy error.
    pub fn policy(message: impl Into<String>) -> Self {
        Self::SchemaValidation {
            message: message.into(),
            code: ErrorCode::ValConfidencePolicy,
        }
    }

    /// Map a non-success provider HTTP status to an invocation error.
    pub fn from_http_status(provider: &str, status: u16, body: &str) -> Self {
        let code = match status {
            401 | 403 => ErrorCode::LlmAuthFailed,
            429 => ErrorCode::LlmRateLimited,
            _ => ErrorCode::LlmGenerationFailed,
        };
        Self::llm_with_code(format!("{} API error ({}): {}", provider, status, body), code)
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedMediaType { .. } => ErrorCode::MediaUnsupported,
            Self::PayloadTooLarge { .. } => ErrorCode::MediaTooLarge,
            Self::ExtractionFailure { code, .. } => *code,
            Self::EmptyDocument => ErrorCode::ExtEmptyDocument,
            Self::ModelUnavailable(_) => ErrorCode::LlmUnavailable,
            Self::ModelInvocation { code, .. } => *code,
            Self::MalformedModelOutput { code, .. } => *code,
            Self::SchemaValidation { code, .. } => *code,
            Self::Configuration(_) => ErrorCode::ConfigInvalid,
            Self::Io(_) => ErrorCode::Internal,
        }
    }

    /// Whether the error was caused by the caller's input rather than the service.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::UnsupportedMediaType { .. } | Self::PayloadTooLarge { .. } | Self::EmptyDocument => {
                true
            }
            Self::ExtractionFailure { code, .. } => *code == ErrorCode::ExtDecodeFailed,
            _ => false,
        }
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::UnsupportedMediaType { .. } => Some("Please upload a JPG, PNG, or PDF file"),
            Self::PayloadTooLarge { .. } => Some("Please upload a smaller file"),
            Self::EmptyDocument => {
                Some("Please upload a clearer scan or a PDF with a text layer")
            }
            Self::ModelUnavailable(_) => Some("Please check your LLM provider API key"),
            Self::ModelInvocation { .. } => Some("Please check your LLM provider configuration"),
            _ => None,
        }
    }
}

impl From<ExtractError> for MarksheetError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::UnsupportedType(media_type) => Self::UnsupportedMediaType { media_type },
            ExtractError::Decode(message) => Self::ExtractionFailure {
                message,
                code: ErrorCode::ExtDecodeFailed,
                source: None,
            },
            other => Self::ExtractionFailure {
                message: other.to_string(),
                code: ErrorCode::ExtEngineFailed,
                source: Some(Box::new(other)),
            },
        }
    }
}
