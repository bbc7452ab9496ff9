//! Core types for text extraction.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kind of document the text came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    /// PDF document with an embedded text layer.
    Pdf,
    /// Raster image read through OCR.
    Image {
        /// Image format (e.g., "png", "jpeg").
        format: String,
    },
}

/// Extracted text with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedContent {
    /// Extracted text, exactly as the engine produced it.
    pub text: String,

    /// Original content modality.
    pub modality: Modality,

    /// Per-page text, in document order (PDF only).
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub pages: Vec<String>,

    /// Additional metadata (format-specific).
    #[serde(skip_serializing_if = "HashMap::is_empty", default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl ExtractedContent {
    /// Create new extracted content.
    pub fn new(text: String, modality: Modality) -> Self {
        Self {
            text,
            modality,
            pages: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    /// Attach per-page text.
    pub fn with_pages(mut self, pages: Vec<String>) -> Self {
        self.pages = pages;
        self
    }

    /// Add metadata entry.
    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Check if extraction produced no meaningful text.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Get content length in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Number of pages, when the source is paginated.
    pub fn page_count(&self) -> Option<usize> {
        match self.modality {
            Modality::Pdf => Some(self.pages.len()),
            Modality::Image { .. } => None,
        }
    }
}
