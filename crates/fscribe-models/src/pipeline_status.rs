//! Pipeline status snapshots for progress polling.
//!
//! The orchestrator keeps one of these per upload in its in-memory status
//! registry; the API serves it verbatim from the polling endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::upload::UploadId;

/// Processing stage of one upload's pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Chunks still arriving, pipeline not yet started
    #[default]
    Receiving,
    /// Chunks being concatenated into the assembled video
    Assembling,
    /// Frames being sampled and OCR'd
    Extracting,
    /// Consecutive duplicate captions being removed
    Deduplicating,
    /// Segments being sent to the generative backend
    Enriching,
    /// Results persisted
    Done,
    /// Pipeline aborted; an error record was persisted
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Receiving => "receiving",
            PipelineStage::Assembling => "assembling",
            PipelineStage::Extracting => "extracting",
            PipelineStage::Deduplicating => "deduplicating",
            PipelineStage::Enriching => "enriching",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStage::Done | PipelineStage::Failed)
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of one upload's pipeline progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineStatus {
    /// Upload being processed
    pub upload_id: UploadId,
    /// Current stage
    pub stage: PipelineStage,
    /// Frames sampled so far
    pub frames_sampled: u32,
    /// Text units kept after deduplication
    pub units_kept: u32,
    /// Entries enriched so far
    pub entries_enriched: u32,
    /// Error message if the pipeline failed
    pub error_message: Option<String>,
    /// When processing started
    pub started_at: DateTime<Utc>,
    /// When the status was last updated
    pub updated_at: DateTime<Utc>,
    /// Sequence number for event ordering (monotonically increasing)
    pub event_seq: u64,
}

impl PipelineStatus {
    /// Create a fresh status for a newly submitted upload.
    pub fn new(upload_id: UploadId) -> Self {
        let now = Utc::now();
        Self {
            upload_id,
            stage: PipelineStage::Receiving,
            frames_sampled: 0,
            units_kept: 0,
            entries_enriched: 0,
            error_message: None,
            started_at: now,
            updated_at: now,
            event_seq: 0,
        }
    }

    /// Check if the pipeline reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.stage.is_terminal()
    }

    /// Advance to a new stage.
    pub fn set_stage(&mut self, stage: PipelineStage) {
        self.stage = stage;
        self.touch();
    }

    /// Mark the pipeline as successfully finished.
    pub fn complete(&mut self) {
        self.stage = PipelineStage::Done;
        self.touch();
    }

    /// Mark the pipeline as failed with an error message.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.stage = PipelineStage::Failed;
        self.error_message = Some(error.into());
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
        self.event_seq += 1;
    }
}
