//! Extraction error types.

use thiserror::Error;

/// Errors that can occur during text extraction.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Content type is not supported by any extractor.
    #[error("Unsupported content type: {0}")]
    UnsupportedType(String),

    /// The bytes could not be read as the declared document type.
    #[error("Could not decode document: {0}")]
    Decode(String),

    /// The extraction engine itself could not run (e.g. tesseract missing).
    #[error("Extraction engine failed: {0}")]
    Engine(String),

    /// Task join error from spawn_blocking.
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl ExtractError {
    /// Whether the failure was caused by the uploaded bytes rather than the host.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::UnsupportedType(_) | Self::Decode(_))
    }
}

/// Result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_classification() {
        assert!(ExtractError::Decode("bad xref".to_string()).is_input_error());
        assert!(ExtractError::UnsupportedType("text/plain".to_string()).is_input_error());
        assert!(!ExtractError::Engine("tesseract not found".to_string()).is_input_error());
    }
}
