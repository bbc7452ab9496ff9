//! The extraction pipeline: bytes -> text -> prompt -> model -> validated result.

use std::sync::Arc;
use std::time::{Duration, Instant};

use marksheet_extractors::{ExtractedContent, ExtractionPipeline};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::MarksheetConfig;
use crate::error::{MarksheetError, MarksheetResult};
use crate::llm_output::parse_model_output;
use crate::prompt::build_prompt;
use crate::schema::ExtractionResponse;
use crate::traits::{GenerationOptions, Llm, ResponseFormat};
use crate::types::{MediaType, Message};
use crate::validation::{validate, ValidationPolicy};

/// Runtime settings for [`MarksheetPipeline`].
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Upper bound on one model call.
    pub model_timeout: Duration,
    /// Post-parse validation policy.
    pub validation: ValidationPolicy,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            model_timeout: Duration::from_secs(120),
            validation: ValidationPolicy::default(),
        }
    }
}

impl From<&MarksheetConfig> for PipelineSettings {
    fn from(config: &MarksheetConfig) -> Self {
        Self {
            model_timeout: config.model_timeout(),
            validation: config.validation.clone(),
        }
    }
}

/// Marksheet extraction pipeline.
///
/// Holds no per-request state, so one instance is shared behind an `Arc`
/// by every concurrent request. The model handle is optional: a service
/// started without credentials still runs and reports
/// [`MarksheetError::ModelUnavailable`] per request.
pub struct MarksheetPipeline {
    extractors: ExtractionPipeline,
    llm: Option<Arc<dyn Llm>>,
    settings: PipelineSettings,
}

impl MarksheetPipeline {
    /// Create a pipeline from its parts.
    pub fn new(
        extractors: ExtractionPipeline,
        llm: Option<Arc<dyn Llm>>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            extractors,
            llm,
            settings,
        }
    }

    /// Create a pipeline with the default extractors configured from `config`.
    pub fn from_config(config: &MarksheetConfig, llm: Option<Arc<dyn Llm>>) -> Self {
        Self::new(
            ExtractionPipeline::with_image_config(config.extraction.image_config()),
            llm,
            PipelineSettings::from(config),
        )
    }

    /// Whether a model handle is present.
    pub fn is_model_configured(&self) -> bool {
        self.llm.is_some()
    }

    /// Name of the configured model, if any.
    pub fn model(&self) -> Option<&str> {
        self.llm.as_deref().map(|llm| llm.model_name())
    }

    /// Pipeline settings.
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Run text extraction for the given media type.
    pub async fn extract_content(
        &self,
        bytes: &[u8],
        media_type: MediaType,
    ) -> MarksheetResult<ExtractedContent> {
        Ok(self.extractors.extract(bytes, media_type.as_mime()).await?)
    }

    /// Extract plain text from an upload.
    pub async fn extract_text(&self, bytes: &[u8], media_type: MediaType) -> MarksheetResult<String> {
        Ok(self.extract_content(bytes, media_type).await?.text)
    }

    /// Send the prompt to the model and parse its reply as JSON.
    pub async fn invoke_model(&self, prompt: &str) -> MarksheetResult<Value> {
        let llm = self.llm.as_ref().ok_or_else(|| {
            MarksheetError::ModelUnavailable(
                "no LLM provider is configured; set the provider API key".to_string(),
            )
        })?;

        let messages = vec![Message::user(prompt)];
        let options = llm.supports_json_mode().then(|| GenerationOptions {
            response_format: Some(ResponseFormat::Json),
            ..Default::default()
        });

        let started = Instant::now();
        let response = tokio::time::timeout(
            self.settings.model_timeout,
            llm.generate(&messages, options),
        )
        .await
        .map_err(|_| MarksheetError::llm_timeout(self.settings.model_timeout))??;

        debug!(
            model = llm.model_name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            reply_len = response.content_or_empty().len(),
            "Model replied"
        );

        parse_model_output(response.content_or_empty())
    }

    /// Run the full extraction for one upload.
    pub async fn process_document(
        &self,
        bytes: &[u8],
        media_type: MediaType,
    ) -> MarksheetResult<ExtractionResponse> {
        let started = Instant::now();

        let content = self.extract_content(bytes, media_type).await?;
        if content.is_empty() {
            warn!(%media_type, size = bytes.len(), "No text recovered from document");
            return Err(MarksheetError::EmptyDocument);
        }

        let prompt = build_prompt(&content.text);
        let value = self.invoke_model(&prompt).await?;
        let response = validate(value, &self.settings.validation)?;

        info!(
            %media_type,
            text_len = content.len(),
            marks = response.marks.len(),
            mean_confidence = response.mean_confidence().unwrap_or_default(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Marksheet extracted"
        );
        Ok(response)
    }

    /// Run the full extraction for an upload with a raw `Content-Type`.
    pub async fn process_upload(
        &self,
        bytes: &[u8],
        content_type: &str,
    ) -> MarksheetResult<ExtractionResponse> {
        let media_type = MediaType::parse(content_type)?;
        self.process_document(bytes, media_type).await
    }
}
