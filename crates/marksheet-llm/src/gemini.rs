//! Google Gemini LLM provider implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use marksheet_core::config::LlmProvider;
use marksheet_core::error::{MarksheetError, MarksheetResult};
use marksheet_core::traits::{
    GenerationOptions, Llm, LlmConfig, LlmResponse, ResponseFormat, TokenUsage,
};
use marksheet_core::types::{split_system, Message, MessageRole};

use crate::http::{build_client, resolve_api_key, send_error};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";

/// Gemini LLM provider.
pub struct GeminiLlm {
    client: Client,
    config: LlmConfig,
    endpoint: Url,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

impl GeminiLlm {
    /// Create a new Gemini LLM provider.
    pub fn new(config: LlmConfig) -> MarksheetResult<Self> {
        let api_key = resolve_api_key(LlmProvider::Gemini, &config)?;
        let client = build_client(&[("x-goog-api-key", api_key.as_str())], config.timeout_secs)?;

        let mut config = config;
        if config.model.is_empty() {
            config.model = LlmProvider::Gemini.default_model().to_string();
        }

        let endpoint = Self::endpoint(config.base_url.as_deref(), &config.model)?;

        Ok(Self {
            client,
            config,
            endpoint,
        })
    }

    fn endpoint(base_url: Option<&str>, model: &str) -> MarksheetResult<Url> {
        let mut base = base_url.unwrap_or(GEMINI_API_URL).to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        Url::parse(&base)
            .and_then(|url| url.join(&format!("models/{}:generateContent", model)))
            .map_err(|e| MarksheetError::Configuration(format!("Invalid Gemini base URL: {}", e)))
    }

    fn build_request(&self, messages: &[Message], options: GenerationOptions) -> GeminiRequest {
        let (system, turns) = split_system(messages);

        let contents = turns
            .into_iter()
            .map(|m| GeminiContent {
                role: Some(
                    match m.role {
                        MessageRole::Assistant => "model",
                        _ => "user",
                    }
                    .to_string(),
                ),
                parts: vec![GeminiPart {
                    text: Some(m.content.clone()),
                }],
            })
            .collect();

        GeminiRequest {
            contents,
            system_instruction: system.map(|text| GeminiContent {
                role: None,
                parts: vec![GeminiPart { text: Some(text) }],
            }),
            generation_config: GenerationConfig {
                temperature: options.temperature.unwrap_or(self.config.temperature),
                top_p: options.top_p.unwrap_or(self.config.top_p),
                max_output_tokens: options.max_tokens.unwrap_or(self.config.max_tokens),
                response_mime_type: (options.response_format == Some(ResponseFormat::Json))
                    .then_some("application/json"),
            },
        }
    }
}

#[async_trait]
impl Llm for GeminiLlm {
    async fn generate(
        &self,
        messages: &[Message],
        options: Option<GenerationOptions>,
    ) -> MarksheetResult<LlmResponse> {
        let request = self.build_request(messages, options.unwrap_or_default());

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| send_error("Gemini", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| send_error("Gemini", e))?;

        if !status.is_success() {
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(MarksheetError::from_http_status(
                "Gemini",
                status.as_u16(),
                &message,
            ));
        }

        let response: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| MarksheetError::llm(format!("Failed to parse Gemini response: {}", e)))?;

        if response.candidates.is_empty() {
            let reason = response
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates returned".to_string());
            return Err(MarksheetError::llm(format!("Gemini returned no output: {}", reason)));
        }

        let content = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            });

        let usage = response.usage_metadata.map(|u| TokenUsage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        });

        Ok(LlmResponse { content, usage })
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }

    fn supports_json_mode(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn llm() -> GeminiLlm {
        GeminiLlm::new(LlmConfig {
            api_key: Some("test-key".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_default_model_and_endpoint() {
        let llm = llm();
        assert_eq!(llm.model_name(), "gemini-1.5-flash");
        assert_eq!(
            llm.endpoint.as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn test_custom_base_url_without_trailing_slash() {
        let url = GeminiLlm::endpoint(Some("http://127.0.0.1:9000/v1beta"), "gemini-pro").unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:9000/v1beta/models/gemini-pro:generateContent"
        );
    }

    #[test]
    fn test_request_shape() {
        let messages = vec![Message::system("Be precise."), Message::user("Name: Jane Doe")];
        let request = llm().build_request(
            &messages,
            GenerationOptions {
                response_format: Some(ResponseFormat::Json),
                ..Default::default()
            },
        );

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body["contents"],
            json!([{"role": "user", "parts": [{"text": "Name: Jane Doe"}]}])
        );
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Be precise.");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 4096);
    }

    #[test]
    fn test_plain_text_request_omits_mime_type() {
        let request = llm().build_request(&[Message::user("x")], GenerationOptions::default());
        let body = serde_json::to_value(&request).unwrap();
        assert!(body["generationConfig"].get("responseMimeType").is_none());
        assert!(body.get("systemInstruction").is_none());
    }
}
