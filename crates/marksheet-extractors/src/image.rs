//! Image text extraction via Tesseract OCR.
//!
//! Scanned marksheets arrive as JPEG or PNG. The bytes are sniffed, decoded
//! with the `image` crate, converted to grayscale and handed to Tesseract.
//! The transcript is returned exactly as Tesseract produced it.

use crate::error::{ExtractError, ExtractResult};
use crate::types::{ExtractedContent, Modality};
use crate::Extractor;
use async_trait::async_trait;
use tracing::debug;

/// Configuration for OCR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageExtractionConfig {
    /// Tesseract language pack (default: "eng").
    pub language: String,
    /// Source resolution hint passed to tesseract.
    pub dpi: Option<i32>,
    /// Page segmentation mode passed to tesseract.
    pub psm: Option<i32>,
}

impl Default for ImageExtractionConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            dpi: None,
            psm: None,
        }
    }
}

/// Raster formats accepted for OCR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
}

impl ImageKind {
    /// Detect image format from magic bytes.
    pub fn detect(content: &[u8]) -> ExtractResult<Self> {
        if content.len() < 8 {
            return Err(ExtractError::Decode("Image content too short".to_string()));
        }

        if content.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            Ok(Self::Png)
        } else if content.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Ok(Self::Jpeg)
        } else {
            Err(ExtractError::Decode(
                "Content is neither a PNG nor a JPEG image".to_string(),
            ))
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
        }
    }

    #[cfg(feature = "ocr")]
    fn image_format(&self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}

/// OCR extractor for JPEG and PNG marksheets.
#[derive(Debug, Clone, Default)]
pub struct ImageExtractor {
    config: ImageExtractionConfig,
}

impl ImageExtractor {
    /// Create image extractor with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create image extractor with custom configuration.
    pub fn with_config(config: ImageExtractionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ImageExtractionConfig {
        &self.config
    }

    #[cfg(feature = "ocr")]
    async fn run_ocr(&self, content: &[u8], kind: ImageKind) -> ExtractResult<String> {
        use rusty_tesseract::{Args, Image};

        let content = content.to_vec();
        let args = Args {
            lang: self.config.language.clone(),
            dpi: self.config.dpi,
            psm: self.config.psm,
            ..Args::default()
        };

        // Run Tesseract in blocking task to avoid blocking async runtime
        tokio::task::spawn_blocking(move || {
            let img = image::load_from_memory_with_format(&content, kind.image_format())
                .map_err(|e| ExtractError::Decode(format!("Invalid {} image: {}", kind.as_str(), e)))?;

            // Convert to grayscale format Tesseract expects
            let gray = image::DynamicImage::ImageLuma8(img.to_luma8());
            let tesseract_image = Image::from_dynamic_image(&gray)
                .map_err(|e| ExtractError::Engine(format!("Could not stage image for OCR: {}", e)))?;

            rusty_tesseract::image_to_string(&tesseract_image, &args)
                .map_err(|e| ExtractError::Engine(format!("Tesseract failed: {}", e)))
        })
        .await?
    }

    #[cfg(not(feature = "ocr"))]
    async fn run_ocr(&self, _content: &[u8], _kind: ImageKind) -> ExtractResult<String> {
        Err(ExtractError::Engine(
            "OCR support not enabled. Enable the 'ocr' feature.".to_string(),
        ))
    }
}

#[async_trait]
impl Extractor for ImageExtractor {
    async fn extract(&self, content: &[u8]) -> ExtractResult<ExtractedContent> {
        let content_len = content.len();
        let kind = ImageKind::detect(content)?;

        let text = self.run_ocr(content, kind).await?;
        debug!(
            format = kind.as_str(),
            text_len = text.len(),
            language = %self.config.language,
            "OCR completed"
        );

        Ok(ExtractedContent::new(
            text,
            Modality::Image {
                format: kind.as_str().to_string(),
            },
        )
        .with_metadata("original_size", content_len)
        .with_metadata("extraction_method", "ocr"))
    }

    fn supported_types(&self) -> &[&str] {
        &["image/png", "image/jpeg"]
    }

    fn name(&self) -> &str {
        "tesseract-ocr"
    }
}
