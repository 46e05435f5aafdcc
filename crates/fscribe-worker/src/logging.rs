//! Structured per-upload logging.
//!
//! Provides consistent, structured logging for pipeline runs with the
//! upload id attached to every line.

use tracing::{error, info, warn};

use fscribe_models::UploadId;

/// Logger for one upload's pipeline run.
#[derive(Debug, Clone)]
pub struct JobLogger {
    upload_id: String,
}

impl JobLogger {
    /// Create a logger for an upload.
    pub fn new(upload_id: &UploadId) -> Self {
        Self {
            upload_id: upload_id.to_string(),
        }
    }

    /// Log the start of the pipeline.
    pub fn log_start(&self, message: &str) {
        info!(upload_id = %self.upload_id, "Pipeline started: {}", message);
    }

    /// Log entry into a stage.
    pub fn log_stage(&self, stage: &str, message: &str) {
        info!(upload_id = %self.upload_id, stage = %stage, "{}", message);
    }

    /// Log a warning during the run.
    pub fn log_warning(&self, message: &str) {
        warn!(upload_id = %self.upload_id, "Pipeline warning: {}", message);
    }

    /// Log a pipeline failure.
    pub fn log_error(&self, message: &str) {
        error!(upload_id = %self.upload_id, "Pipeline failed: {}", message);
    }

    /// Log successful completion.
    pub fn log_completion(&self, message: &str) {
        info!(upload_id = %self.upload_id, "Pipeline completed: {}", message);
    }
}
