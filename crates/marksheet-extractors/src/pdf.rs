//! PDF text extraction using pdf-extract.

use crate::error::{ExtractError, ExtractResult};
use crate::types::{ExtractedContent, Modality};
use crate::Extractor;
use async_trait::async_trait;
use tracing::debug;

/// PDF text extractor using the pdf-extract library.
///
/// Reads the embedded text layer page by page and concatenates the pages
/// in document order with no separator. The synchronous parser runs in
/// spawn_blocking; a parser panic on a malformed file is reported as a
/// decode failure instead of tearing down the request.
#[derive(Debug, Clone, Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    /// Create new PDF extractor.
    pub fn new() -> Self {
        Self
    }
}

fn extract_pages(bytes: &[u8]) -> ExtractResult<Vec<String>> {
    pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| ExtractError::Decode(format!("PDF could not be opened: {}", e)))
}

#[async_trait]
impl Extractor for PdfExtractor {
    async fn extract(&self, content: &[u8]) -> ExtractResult<ExtractedContent> {
        let content_len = content.len();
        let bytes = content.to_vec();

        let pages = match tokio::task::spawn_blocking(move || extract_pages(&bytes)).await {
            Ok(result) => result?,
            Err(e) if e.is_panic() => {
                return Err(ExtractError::Decode(
                    "PDF parser aborted on malformed input".to_string(),
                ))
            }
            Err(e) => return Err(e.into()),
        };

        let text = pages.concat();
        debug!(
            pages = pages.len(),
            text_len = text.len(),
            "Extracted PDF text layer"
        );

        let page_count = pages.len();
        Ok(ExtractedContent::new(text, Modality::Pdf)
            .with_pages(pages)
            .with_metadata("original_size", content_len)
            .with_metadata("page_count", page_count)
            .with_metadata("extraction_method", "pdf-text"))
    }

    fn supported_types(&self) -> &[&str] {
        &["application/pdf"]
    }

    fn name(&self) -> &str {
        "pdf-extract"
    }
}
