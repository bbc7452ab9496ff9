//! Factory for creating extractors.

use std::sync::Arc;

use crate::error::{ExtractError, ExtractResult};
use crate::image::{ImageExtractionConfig, ImageExtractor};
use crate::Extractor;

#[cfg(feature = "pdf")]
use crate::PdfExtractor;

/// Factory for creating text extractors.
pub struct ExtractorFactory;

impl ExtractorFactory {
    /// Create a PDF extractor.
    #[cfg(feature = "pdf")]
    pub fn pdf() -> Arc<dyn Extractor> {
        Arc::new(PdfExtractor::new())
    }

    /// Create an OCR extractor.
    pub fn image() -> Arc<dyn Extractor> {
        Arc::new(ImageExtractor::new())
    }

    /// Create an OCR extractor with custom configuration.
    pub fn image_with_config(config: ImageExtractionConfig) -> Arc<dyn Extractor> {
        Arc::new(ImageExtractor::with_config(config))
    }

    /// Create extractor for a given MIME type.
    pub fn for_mime_type(mime_type: &str) -> ExtractResult<Arc<dyn Extractor>> {
        match mime_type {
            #[cfg(feature = "pdf")]
            "application/pdf" => Ok(Self::pdf()),

            "image/png" | "image/jpeg" => Ok(Self::image()),

            _ => Err(ExtractError::UnsupportedType(mime_type.to_string())),
        }
    }

    /// Get all available extractors, with OCR using the given configuration.
    #[allow(clippy::vec_init_then_push)]
    pub fn all_with_config(config: ImageExtractionConfig) -> Vec<Arc<dyn Extractor>> {
        let mut extractors: Vec<Arc<dyn Extractor>> = Vec::new();

        #[cfg(feature = "pdf")]
        extractors.push(Self::pdf());

        extractors.push(Self::image_with_config(config));

        extractors
    }

    /// Get all available extractors.
    pub fn all() -> Vec<Arc<dyn Extractor>> {
        Self::all_with_config(ImageExtractionConfig::default())
    }
}
