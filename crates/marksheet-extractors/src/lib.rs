//! marksheet-extractors - Text extraction for uploaded marksheets.
//!
//! Turns the raw bytes of an upload into plain text: the embedded text
//! layer for PDFs, Tesseract OCR for scanned images. Every extractor sits
//! behind the [`Extractor`] trait and is routed by MIME type through an
//! [`ExtractionPipeline`].
//!
//! # Features
//!
//! - `pdf` (default) - PDF text extraction via pdf-extract
//! - `ocr` (default) - JPEG/PNG OCR via tesseract (requires tesseract installed)
//!
//! # Example
//!
//! ```ignore
//! use marksheet_extractors::{ExtractionPipeline, ExtractorFactory};
//!
//! // Route by MIME type
//! let pipeline = ExtractionPipeline::with_defaults();
//! let content = pipeline.extract(&pdf_bytes, "application/pdf").await?;
//!
//! // Or use a single extractor directly
//! let ocr = ExtractorFactory::image();
//! let content = ocr.extract(&png_bytes).await?;
//! ```

mod error;
mod factory;
mod pipeline;
mod types;

#[cfg(feature = "pdf")]
mod pdf;

pub mod image;

pub use error::{ExtractError, ExtractResult};
pub use factory::ExtractorFactory;
pub use image::{ImageExtractionConfig, ImageExtractor, ImageKind};
pub use pipeline::ExtractionPipeline;
pub use types::{ExtractedContent, Modality};

#[cfg(feature = "pdf")]
pub use pdf::PdfExtractor;

use async_trait::async_trait;

/// Core Extractor trait - all text extractors implement this.
///
/// Implementations must be safe to share across concurrent requests.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Extract text content from bytes.
    async fn extract(&self, content: &[u8]) -> ExtractResult<ExtractedContent>;

    /// Supported MIME types for this extractor.
    fn supported_types(&self) -> &[&str];

    /// Check if this extractor handles the given MIME type.
    fn supports(&self, mime_type: &str) -> bool {
        self.supported_types().contains(&mime_type)
    }

    /// Human-readable name for this extractor.
    fn name(&self) -> &str;
}
