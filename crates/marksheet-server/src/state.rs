//! Server state management.

use std::sync::Arc;

use marksheet_core::{MarksheetConfig, MarksheetPipeline};

/// Shared application state.
///
/// The pipeline is immutable after start-up, so handlers share it without
/// locking.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<MarksheetPipeline>,
    pub config: Arc<MarksheetConfig>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(pipeline: MarksheetPipeline, config: MarksheetConfig) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            config: Arc::new(config),
        }
    }

    /// Check if a model is configured.
    pub fn is_model_configured(&self) -> bool {
        self.pipeline.is_model_configured()
    }

    /// Largest accepted upload, in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        self.config.extraction.max_upload_bytes
    }
}
