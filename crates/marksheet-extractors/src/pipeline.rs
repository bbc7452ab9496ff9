//! Extraction pipeline for routing uploads to the right extractor.

use std::sync::Arc;

use tracing::debug;

use crate::error::{ExtractError, ExtractResult};
use crate::image::ImageExtractionConfig;
use crate::types::ExtractedContent;
use crate::Extractor;

/// Pipeline for extracting text using registered extractors.
///
/// Automatically routes content to the first extractor that supports the
/// MIME type.
pub struct ExtractionPipeline {
    extractors: Vec<Arc<dyn Extractor>>,
}

impl ExtractionPipeline {
    /// Create new empty pipeline.
    pub fn new() -> Self {
        Self {
            extractors: Vec::new(),
        }
    }

    /// Create pipeline with all available extractors.
    pub fn with_defaults() -> Self {
        Self {
            extractors: crate::ExtractorFactory::all(),
        }
    }

    /// Create pipeline with all available extractors and custom OCR settings.
    pub fn with_image_config(config: ImageExtractionConfig) -> Self {
        Self {
            extractors: crate::ExtractorFactory::all_with_config(config),
        }
    }

    /// Add an extractor to the pipeline.
    pub fn add_extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractors.push(extractor);
        self
    }

    /// Extract content using the appropriate extractor for the MIME type.
    pub async fn extract(
        &self,
        content: &[u8],
        mime_type: &str,
    ) -> ExtractResult<ExtractedContent> {
        let extractor = self
            .extractors
            .iter()
            .find(|e| e.supports(mime_type))
            .ok_or_else(|| ExtractError::UnsupportedType(mime_type.to_string()))?;

        debug!(
            extractor = extractor.name(),
            mime_type,
            size = content.len(),
            "Routing content to extractor"
        );
        extractor.extract(content).await
    }

    /// Check if pipeline can handle a given MIME type.
    pub fn supports(&self, mime_type: &str) -> bool {
        self.extractors.iter().any(|e| e.supports(mime_type))
    }

    /// List all supported MIME types.
    pub fn supported_types(&self) -> Vec<&str> {
        self.extractors
            .iter()
            .flat_map(|e| e.supported_types().iter().copied())
            .collect()
    }

    /// Get the number of registered extractors.
    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    /// Check if the pipeline has no registered extractors.
    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }
}

impl Default for ExtractionPipeline {
    fn default() -> Self {
        Self::with_defaults()
    }
}
