//! Pipeline error types.
//!
//! Frame- and segment-level failures are absorbed inside their stages;
//! everything surfacing here is fatal for that one upload's pipeline and
//! results in a persisted error record, never a crashed worker pool.

use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Assembled video not found for upload {0}")]
    MissingVideo(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Upload {0} is already being processed")]
    AlreadyProcessing(String),

    #[error("Assembled video is {size} bytes, over the {max} byte limit")]
    VideoTooLarge { size: u64, max: u64 },

    #[error("Pipeline cancelled")]
    Cancelled,

    #[error("Storage error: {0}")]
    Storage(#[from] fscribe_storage::StorageError),

    #[error("Media error: {0}")]
    Media(#[from] fscribe_media::MediaError),

    #[error("Enrichment error: {0}")]
    Enrich(#[from] fscribe_enrich::EnrichError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn missing_video(upload_id: impl Into<String>) -> Self {
        Self::MissingVideo(upload_id.into())
    }

    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Check if this error should be rejected synchronously at submission,
    /// before any background work starts.
    pub fn is_submission_error(&self) -> bool {
        matches!(
            self,
            PipelineError::MissingVideo(_)
                | PipelineError::InvalidConfiguration(_)
                | PipelineError::AlreadyProcessing(_)
        )
    }

    /// Check if the pipeline stopped because cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineError::Cancelled)
    }
}
