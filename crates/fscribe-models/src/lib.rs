//! Shared data models for the FrameScribe backend.
//!
//! This crate provides Serde-serializable types for:
//! - Chunked upload sessions and their lifecycle
//! - Frame samples and OCR text units
//! - Enrichment insights and persisted result documents
//! - Pipeline status snapshots for polling

pub mod frame;
pub mod insight;
pub mod pipeline_status;
pub mod upload;

// Re-export common types
pub use frame::{FrameSample, TextUnit};
pub use insight::{EnrichedEntry, Insight, ResultDocument, ResultStatus};
pub use pipeline_status::{PipelineStage, PipelineStatus};
pub use upload::{ChunkPut, SessionStatus, UploadId, UploadIdError, UploadSession};
