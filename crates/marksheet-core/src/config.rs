//! Configuration system for marksheet extraction.

use std::str::FromStr;
use std::time::Duration;

use marksheet_extractors::ImageExtractionConfig;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{MarksheetError, MarksheetResult};
use crate::traits::LlmConfig;
use crate::validation::ValidationPolicy;

/// Upload size bound applied at the boundary (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// LLM provider type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LlmProvider {
    #[default]
    Gemini,
    OpenAI,
    Anthropic,
}

impl LlmProvider {
    /// Model used when the configuration leaves it empty.
    pub fn default_model(&self) -> &'static str {
        match self {
            LlmProvider::Gemini => "gemini-1.5-flash",
            LlmProvider::OpenAI => "gpt-4o-mini",
            LlmProvider::Anthropic => "claude-3-5-sonnet-20240620",
        }
    }

    /// Environment variable holding the provider's API key.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            LlmProvider::Gemini => "GOOGLE_API_KEY",
            LlmProvider::OpenAI => "OPENAI_API_KEY",
            LlmProvider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

/// Provider configuration with type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmProviderConfig {
    /// Provider type.
    #[serde(default)]
    pub provider: LlmProvider,
    /// Provider-specific configuration.
    #[serde(flatten)]
    pub config: LlmConfig,
}

impl Default for LlmProviderConfig {
    fn default() -> Self {
        let provider = LlmProvider::default();
        Self {
            provider,
            config: LlmConfig {
                model: provider.default_model().to_string(),
                ..Default::default()
            },
        }
    }
}

/// Upload bounds and OCR settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    /// Largest accepted upload, in bytes.
    pub max_upload_bytes: usize,
    /// Tesseract language pack.
    pub ocr_language: String,
    /// Resolution hint for tesseract.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_dpi: Option<i32>,
    /// Tesseract page segmentation mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_psm: Option<i32>,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            ocr_language: "eng".to_string(),
            ocr_dpi: None,
            ocr_psm: None,
        }
    }
}

impl ExtractionSettings {
    /// OCR configuration for the image extractor.
    pub fn image_config(&self) -> ImageExtractionConfig {
        ImageExtractionConfig {
            language: self.ocr_language.clone(),
            dpi: self.ocr_dpi,
            psm: self.ocr_psm,
        }
    }
}

/// Main service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarksheetConfig {
    /// LLM configuration.
    pub llm: LlmProviderConfig,
    /// Upload and OCR settings.
    pub extraction: ExtractionSettings,
    /// Post-parse validation policy.
    pub validation: ValidationPolicy,
    /// Upper bound on one model call, in seconds.
    pub model_timeout_secs: u64,
    /// Extractions allowed to run at once.
    pub max_concurrent_extractions: usize,
}

impl Default for MarksheetConfig {
    fn default() -> Self {
        Self {
            llm: LlmProviderConfig::default(),
            extraction: ExtractionSettings::default(),
            validation: ValidationPolicy::default(),
            model_timeout_secs: 120,
            max_concurrent_extractions: 8,
        }
    }
}

fn parse_var<T: FromStr>(name: &str, raw: &str) -> MarksheetResult<T> {
    raw.trim().parse().map_err(|_| {
        MarksheetError::Configuration(format!("{} has an invalid value: {:?}", name, raw))
    })
}

impl MarksheetConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<std::path::Path>) -> MarksheetResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        let config: Self = match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| MarksheetError::Configuration(e.to_string()))?
            }
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| MarksheetError::Configuration(e.to_string()))?,
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| MarksheetError::Configuration(e.to_string()))?,
            _ => {
                return Err(MarksheetError::Configuration(
                    "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
                ))
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables over defaults.
    pub fn from_env() -> MarksheetResult<Self> {
        Self::default().with_env_overrides()
    }

    /// Apply `MARKSHEET_*` environment variables on top of this configuration.
    pub fn with_env_overrides(self) -> MarksheetResult<Self> {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides read through `lookup` (environment-style names).
    pub fn with_overrides_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> MarksheetResult<Self> {
        if let Some(raw) = lookup("MARKSHEET_LLM_PROVIDER") {
            let provider: LlmProvider = parse_var("MARKSHEET_LLM_PROVIDER", &raw)?;
            if provider != self.llm.provider {
                self.llm.provider = provider;
                self.llm.config.model = provider.default_model().to_string();
            }
        }
        if let Some(model) = lookup("MARKSHEET_LLM_MODEL") {
            self.llm.config.model = model;
        }
        if let Some(base_url) = lookup("MARKSHEET_LLM_BASE_URL") {
            self.llm.config.base_url = Some(base_url);
        }
        if let Some(api_key) = lookup("MARKSHEET_LLM_API_KEY") {
            self.llm.config.api_key = Some(api_key);
        }
        if let Some(raw) = lookup("MARKSHEET_MAX_UPLOAD_BYTES") {
            self.extraction.max_upload_bytes = parse_var("MARKSHEET_MAX_UPLOAD_BYTES", &raw)?;
        }
        if let Some(language) = lookup("MARKSHEET_OCR_LANGUAGE") {
            self.extraction.ocr_language = language;
        }
        if let Some(raw) = lookup("MARKSHEET_MODEL_TIMEOUT_SECS") {
            self.model_timeout_secs = parse_var("MARKSHEET_MODEL_TIMEOUT_SECS", &raw)?;
        }
        if let Some(raw) = lookup("MARKSHEET_MAX_CONCURRENT_EXTRACTIONS") {
            self.max_concurrent_extractions =
                parse_var("MARKSHEET_MAX_CONCURRENT_EXTRACTIONS", &raw)?;
        }
        if let Some(raw) = lookup("MARKSHEET_REJECT_NULL_WITH_CONFIDENCE") {
            self.validation.reject_null_with_confidence =
                parse_var("MARKSHEET_REJECT_NULL_WITH_CONFIDENCE", &raw)?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Reject values the service cannot run with.
    pub fn validate(&self) -> MarksheetResult<()> {
        if self.extraction.max_upload_bytes == 0 {
            return Err(MarksheetError::Configuration(
                "extraction.max_upload_bytes must be greater than zero".to_string(),
            ));
        }
        if self.model_timeout_secs == 0 {
            return Err(MarksheetError::Configuration(
                "model_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.max_concurrent_extractions == 0 {
            return Err(MarksheetError::Configuration(
                "max_concurrent_extractions must be greater than zero".to_string(),
            ));
        }
        if self.extraction.ocr_language.trim().is_empty() {
            return Err(MarksheetError::Configuration(
                "extraction.ocr_language must not be empty".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.llm.config.temperature) {
            return Err(MarksheetError::Configuration(format!(
                "llm.temperature {} is outside [0, 2]",
                self.llm.config.temperature
            )));
        }
        Ok(())
    }

    /// Model call timeout as a duration.
    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model_timeout_secs)
    }
}
