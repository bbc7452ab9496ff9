//! Factory for creating LLM providers.

use std::sync::Arc;

use marksheet_core::config::{LlmProvider, LlmProviderConfig};
use marksheet_core::error::MarksheetResult;
use marksheet_core::traits::{Llm, LlmConfig};
use tracing::info;

use crate::anthropic::AnthropicLlm;
use crate::gemini::GeminiLlm;
use crate::openai::OpenAIProvider;

/// Factory for creating LLM providers.
pub struct LlmFactory;

impl LlmFactory {
    /// Create an LLM provider from the given configuration.
    pub fn create(provider: LlmProvider, config: LlmConfig) -> MarksheetResult<Arc<dyn Llm>> {
        let llm: Arc<dyn Llm> = match provider {
            LlmProvider::Gemini => Arc::new(GeminiLlm::new(config)?),
            LlmProvider::OpenAI => Arc::new(OpenAIProvider::new(config)?),
            LlmProvider::Anthropic => Arc::new(AnthropicLlm::new(config)?),
        };
        info!(%provider, model = llm.model_name(), "LLM provider initialized");
        Ok(llm)
    }

    /// Create an LLM provider from the service's provider section.
    pub fn from_config(config: &LlmProviderConfig) -> MarksheetResult<Arc<dyn Llm>> {
        Self::create(config.provider, config.config.clone())
    }

    /// Create a Gemini LLM provider with default configuration.
    pub fn gemini() -> MarksheetResult<Arc<dyn Llm>> {
        Self::create(LlmProvider::Gemini, LlmConfig::default())
    }

    /// Create a Gemini LLM provider with a specific model.
    pub fn gemini_with_model(model: impl Into<String>) -> MarksheetResult<Arc<dyn Llm>> {
        let config = LlmConfig {
            model: model.into(),
            ..Default::default()
        };
        Self::create(LlmProvider::Gemini, config)
    }

    /// Create an OpenAI LLM provider with a specific model.
    pub fn openai_with_model(model: impl Into<String>) -> MarksheetResult<Arc<dyn Llm>> {
        let config = LlmConfig {
            model: model.into(),
            ..Default::default()
        };
        Self::create(LlmProvider::OpenAI, config)
    }

    /// Create an Anthropic LLM provider with a specific model.
    pub fn anthropic_with_model(model: impl Into<String>) -> MarksheetResult<Arc<dyn Llm>> {
        let config = LlmConfig {
            model: model.into(),
            ..Default::default()
        };
        Self::create(LlmProvider::Anthropic, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marksheet_core::MarksheetError;
    use tokio_test::assert_ok;

    fn keyed(model: &str) -> LlmConfig {
        LlmConfig {
            model: model.to_string(),
            api_key: Some("test-key".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_each_provider() {
        let llm = assert_ok!(LlmFactory::create(LlmProvider::Gemini, keyed("gemini-1.5-pro")));
        assert_eq!(llm.model_name(), "gemini-1.5-pro");
        assert!(llm.supports_json_mode());

        let llm = assert_ok!(LlmFactory::create(LlmProvider::Anthropic, keyed("")));
        assert_eq!(llm.model_name(), "claude-3-5-sonnet-20240620");
        assert!(!llm.supports_json_mode());

        let llm = LlmFactory::create(LlmProvider::OpenAI, keyed("gpt-4o")).unwrap();
        assert_eq!(llm.model_name(), "gpt-4o");
    }

    #[test]
    fn test_from_config() {
        let mut config = LlmProviderConfig::default();
        config.config.api_key = Some("test-key".to_string());
        let llm = LlmFactory::from_config(&config).unwrap();
        assert_eq!(llm.model_name(), "gemini-1.5-flash");
    }

    #[test]
    fn test_missing_key_is_configuration_error() {
        if std::env::var(LlmProvider::Anthropic.api_key_env()).is_ok() {
            return;
        }
        let err = LlmFactory::anthropic_with_model("claude-3-haiku-20240307")
            .err()
            .unwrap();
        assert!(matches!(err, MarksheetError::Configuration(_)));
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn test_blank_key_is_rejected() {
        if std::env::var(LlmProvider::Gemini.api_key_env()).is_ok() {
            return;
        }
        let config = LlmConfig {
            api_key: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(LlmFactory::create(LlmProvider::Gemini, config).is_err());
    }
}
