//! marksheet-core - Core library for marksheet extraction.
//!
//! Turns an uploaded marksheet (PDF, PNG or JPEG) into a validated,
//! confidence-annotated [`ExtractionResponse`]: text extraction, prompt
//! construction, one model call, output recovery and strict validation.
//!
//! # Example
//!
//! ```ignore
//! use marksheet_core::{MarksheetConfig, MarksheetPipeline, MediaType};
//!
//! let config = MarksheetConfig::from_env()?;
//! let pipeline = MarksheetPipeline::from_config(&config, Some(llm));
//!
//! let result = pipeline.process_document(&pdf_bytes, MediaType::Pdf).await?;
//! if let Some(Some(name)) = &result.candidate_details.name {
//!     println!("{:?} ({:.2})", name.value, name.confidence);
//! }
//! ```

pub mod config;
pub mod error;
pub mod llm_output;
pub mod pipeline;
pub mod prompt;
pub mod schema;
pub mod traits;
pub mod types;
pub mod validation;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export commonly used types
pub use config::{ExtractionSettings, LlmProvider, LlmProviderConfig, MarksheetConfig};
pub use error::{ErrorCode, MarksheetError, MarksheetResult};
pub use pipeline::{MarksheetPipeline, PipelineSettings};
pub use prompt::build_prompt;
pub use schema::{
    CandidateDetails, ConfidenceField, ExtractionResponse, OptionalField, SubjectMark,
};
pub use traits::{GenerationOptions, Llm, LlmConfig, LlmResponse, ResponseFormat, TokenUsage};
pub use types::{MediaType, Message, MessageRole};
pub use validation::{validate, ValidationPolicy};
