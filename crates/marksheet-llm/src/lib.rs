//! marksheet-llm - LLM provider implementations for marksheet extraction.
//!
//! # Supported Providers
//!
//! - **Gemini** (default) - Google Generative Language REST API
//! - **OpenAI** (feature: `openai`) - GPT-4o and friends via async-openai
//! - **Anthropic** - Claude 3.5 via the Messages API
//!
//! API keys come from the config or the provider's environment variable
//! (`GOOGLE_API_KEY`, `OPENAI_API_KEY`, `ANTHROPIC_API_KEY`).
//!
//! # Example
//!
//! ```ignore
//! use marksheet_llm::LlmFactory;
//!
//! let llm = LlmFactory::gemini()?;
//!
//! // Or from the service configuration
//! let llm = LlmFactory::from_config(&config.llm)?;
//! ```

mod anthropic;
mod factory;
mod gemini;
mod http;
mod openai;

pub use anthropic::AnthropicLlm;
pub use factory::LlmFactory;
pub use gemini::GeminiLlm;
pub use openai::OpenAIProvider;

// Re-export core types for convenience
pub use marksheet_core::config::LlmProvider;
pub use marksheet_core::traits::{GenerationOptions, Llm, LlmConfig, LlmResponse, ResponseFormat};
