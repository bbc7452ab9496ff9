//! Core traits for marksheet providers.

mod llm;

pub use llm::*;
