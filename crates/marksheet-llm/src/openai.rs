//! OpenAI LLM provider implementation.

use async_trait::async_trait;

use marksheet_core::config::LlmProvider;
use marksheet_core::error::{MarksheetError, MarksheetResult};
use marksheet_core::traits::{GenerationOptions, Llm, LlmConfig, LlmResponse};
use marksheet_core::types::Message;

#[cfg(feature = "openai")]
use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
        ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
        ResponseFormat as OpenAIResponseFormat,
    },
    Client,
};
#[cfg(feature = "openai")]
use marksheet_core::error::ErrorCode;
#[cfg(feature = "openai")]
use marksheet_core::traits::{ResponseFormat, TokenUsage};
#[cfg(feature = "openai")]
use marksheet_core::types::MessageRole;

use crate::http::resolve_api_key;

/// OpenAI LLM provider.
pub struct OpenAIProvider {
    #[cfg(feature = "openai")]
    client: Client<OpenAIConfig>,
    config: LlmConfig,
}

impl OpenAIProvider {
    /// Create a new OpenAI LLM provider.
    pub fn new(config: LlmConfig) -> MarksheetResult<Self> {
        let api_key = resolve_api_key(LlmProvider::OpenAI, &config)?;

        #[cfg(feature = "openai")]
        let openai_config = if let Some(ref base_url) = config.base_url {
            OpenAIConfig::new()
                .with_api_key(api_key)
                .with_api_base(base_url)
        } else {
            OpenAIConfig::new().with_api_key(api_key)
        };

        #[cfg(feature = "openai")]
        let client = Client::with_config(openai_config);

        #[cfg(not(feature = "openai"))]
        let _ = api_key;

        let mut config = config;
        if config.model.is_empty() {
            config.model = LlmProvider::OpenAI.default_model().to_string();
        }

        Ok(Self {
            #[cfg(feature = "openai")]
            client,
            config,
        })
    }

    /// Check if this is a reasoning model that doesn't support sampling params.
    #[cfg(feature = "openai")]
    fn is_reasoning_model(&self) -> bool {
        let model_lower = self.config.model.to_lowercase();
        ["o1", "o3", "o4"]
            .iter()
            .any(|m| model_lower.starts_with(m))
    }

    #[cfg(feature = "openai")]
    fn message_to_openai(msg: &Message) -> ChatCompletionRequestMessage {
        match msg.role {
            MessageRole::System => {
                ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                    content: ChatCompletionRequestSystemMessageContent::Text(msg.content.clone()),
                    name: None,
                })
            }
            MessageRole::User => {
                ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                    content: ChatCompletionRequestUserMessageContent::Text(msg.content.clone()),
                    name: None,
                })
            }
            MessageRole::Assistant => {
                ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                    content: Some(ChatCompletionRequestAssistantMessageContent::Text(
                        msg.content.clone(),
                    )),
                    ..Default::default()
                })
            }
        }
    }

    #[cfg(feature = "openai")]
    fn build_request(
        &self,
        messages: &[Message],
        options: GenerationOptions,
    ) -> CreateChatCompletionRequest {
        let mut request = CreateChatCompletionRequest {
            model: self.config.model.clone(),
            messages: messages.iter().map(Self::message_to_openai).collect(),
            ..Default::default()
        };

        // Only add temperature/top_p for non-reasoning models
        if !self.is_reasoning_model() {
            request.temperature = Some(options.temperature.unwrap_or(self.config.temperature));
            request.top_p = Some(options.top_p.unwrap_or(self.config.top_p));
            request.max_tokens = Some(options.max_tokens.unwrap_or(self.config.max_tokens));
        }

        if options.response_format == Some(ResponseFormat::Json) {
            request.response_format = Some(OpenAIResponseFormat::JsonObject);
        }

        request
    }
}

#[async_trait]
impl Llm for OpenAIProvider {
    #[cfg(feature = "openai")]
    async fn generate(
        &self,
        messages: &[Message],
        options: Option<GenerationOptions>,
    ) -> MarksheetResult<LlmResponse> {
        let request = self.build_request(messages, options.unwrap_or_default());

        let response = self.client.chat().create(request).await.map_err(|e| {
            let code = match &e {
                OpenAIError::Reqwest(_) => ErrorCode::LlmConnectionFailed,
                _ => ErrorCode::LlmGenerationFailed,
            };
            MarksheetError::llm_with_code(format!("OpenAI API error: {}", e), code)
        })?;

        let choice = response
            .choices
            .first()
            .ok_or_else(|| MarksheetError::llm("No response choices returned"))?;

        let content = choice.message.content.clone();

        let usage = response.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(LlmResponse { content, usage })
    }

    #[cfg(not(feature = "openai"))]
    async fn generate(
        &self,
        _messages: &[Message],
        _options: Option<GenerationOptions>,
    ) -> MarksheetResult<LlmResponse> {
        Err(MarksheetError::Configuration(
            "OpenAI feature not enabled. Enable the 'openai' feature.".to_string(),
        ))
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }

    fn supports_json_mode(&self) -> bool {
        cfg!(feature = "openai")
    }
}

#[cfg(all(test, feature = "openai"))]
mod tests {
    use super::*;

    fn provider(model: &str) -> OpenAIProvider {
        OpenAIProvider::new(LlmConfig {
            model: model.to_string(),
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_default_model() {
        assert_eq!(provider("").model_name(), "gpt-4o-mini");
    }

    #[test]
    fn test_json_mode_sets_response_format() {
        let request = provider("gpt-4o-mini").build_request(
            &[Message::user("Name: Jane Doe")],
            GenerationOptions {
                response_format: Some(ResponseFormat::Json),
                ..Default::default()
            },
        );
        assert!(matches!(
            request.response_format,
            Some(OpenAIResponseFormat::JsonObject)
        ));
        assert_eq!(request.temperature, Some(0.1));
    }

    #[test]
    fn test_reasoning_model_omits_sampling_params() {
        let request =
            provider("o3-mini").build_request(&[Message::user("x")], GenerationOptions::default());
        assert!(request.temperature.is_none());
        assert!(request.max_tokens.is_none());
        assert!(request.response_format.is_none());
    }
}
