//! Enrichment insight models and the persisted result document.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::upload::UploadId;

/// Structured insight returned by the generative backend for one segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    /// Overall sentiment of the segment
    pub sentiment: String,
    /// Top keywords, most important first
    pub keywords: Vec<String>,
    /// Concise summary of the segment
    pub summary: String,
    /// Text complexity label
    pub complexity: String,
}

impl Insight {
    /// Fallback insight substituted when enrichment permanently fails for a
    /// segment. Substituting this value never aborts the batch.
    pub fn sentinel() -> Self {
        Self {
            sentiment: "Unknown".to_string(),
            keywords: Vec::new(),
            summary: "Error processing chunk".to_string(),
            complexity: "N/A".to_string(),
        }
    }

    /// True if this is the permanent-failure sentinel.
    pub fn is_sentinel(&self) -> bool {
        self == &Self::sentinel()
    }
}

/// One enriched text unit: the original text plus per-segment insights.
///
/// `insights` preserves segment order and has exactly one element per
/// segment produced by the chunker for this entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedEntry {
    /// The original (pre-chunking) text
    pub original_text: String,
    /// Source frame image path
    pub frame_path: PathBuf,
    /// Estimated token count of the original text
    pub total_tokens: usize,
    /// One insight per segment, in segment order
    pub insights: Vec<Insight>,
}

/// Terminal outcome of a processing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Completed,
    Failed,
}

/// The JSON document persisted once per upload.
///
/// Written to the processed root under a name derived from the assembled
/// video's file name; fully overwritten on reprocessing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultDocument {
    /// Upload this document belongs to
    pub upload_id: UploadId,
    /// Assembled video file name the results were derived from
    pub video_file: String,
    /// Terminal status of the run
    pub status: ResultStatus,
    /// Error message when the run failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Ordered enriched entries (empty on failure)
    pub entries: Vec<EnrichedEntry>,
}

impl ResultDocument {
    /// Build a success document.
    pub fn completed(upload_id: UploadId, video_file: impl Into<String>, entries: Vec<EnrichedEntry>) -> Self {
        Self {
            upload_id,
            video_file: video_file.into(),
            status: ResultStatus::Completed,
            error: None,
            entries,
        }
    }

    /// Build an error record for a failed run.
    pub fn failed(upload_id: UploadId, video_file: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            upload_id,
            video_file: video_file.into(),
            status: ResultStatus::Failed,
            error: Some(error.into()),
            entries: Vec::new(),
        }
    }
}
