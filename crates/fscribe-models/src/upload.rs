//! Chunked upload session models.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a chunked upload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploadId(String);

/// Error returned when an upload ID fails validation.
#[derive(Debug, Error)]
#[error("Invalid upload ID: {0}")]
pub struct UploadIdError(pub String);

impl UploadId {
    /// Generate a new random upload ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Parse a caller-supplied upload ID.
    ///
    /// IDs become path components under the chunks root, so only
    /// alphanumerics, `-` and `_` are accepted.
    pub fn parse(s: impl Into<String>) -> Result<Self, UploadIdError> {
        let s = s.into();
        if s.is_empty() || s.len() > 128 {
            return Err(UploadIdError(s));
        }
        if !s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(UploadIdError(s));
        }
        Ok(Self(s))
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for UploadId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UploadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Upload session lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Chunks are still arriving
    #[default]
    Receiving,
    /// All chunks received, assembly not yet started
    Complete,
    /// Assembly in progress
    Assembling,
    /// Assembled video written
    Assembled,
    /// Assembly failed permanently
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Receiving => "receiving",
            SessionStatus::Complete => "complete",
            SessionStatus::Assembling => "assembling",
            SessionStatus::Assembled => "assembled",
            SessionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// State of one chunked upload.
///
/// Sequence numbers are 1-based and must be contiguous `1..=expected_total`
/// for the session to complete; a gap blocks completion but never fails it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSession {
    /// Upload identifier
    pub upload_id: UploadId,
    /// Total number of chunks the caller will send
    pub expected_total: u32,
    /// Sequence numbers received so far
    pub received: BTreeSet<u32>,
    /// Current lifecycle status
    pub status: SessionStatus,
    /// Path of the assembled video, once assembled
    pub video_path: Option<PathBuf>,
}

impl UploadSession {
    /// Create a new session on first chunk arrival.
    pub fn new(upload_id: UploadId, expected_total: u32) -> Self {
        Self {
            upload_id,
            expected_total,
            received: BTreeSet::new(),
            status: SessionStatus::Receiving,
            video_path: None,
        }
    }

    /// Number of distinct chunks received.
    pub fn received_count(&self) -> u32 {
        self.received.len() as u32
    }

    /// True once every sequence number in `1..=expected_total` has arrived.
    pub fn is_complete(&self) -> bool {
        self.received_count() == self.expected_total
    }
}

/// Outcome of storing one chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChunkPut {
    /// More chunks are still expected.
    Partial { received: u32, total: u32 },
    /// This chunk completed the session and assembly succeeded.
    Completed { video_path: PathBuf },
}

impl ChunkPut {
    /// True if this outcome completed the upload.
    pub fn is_completed(&self) -> bool {
        matches!(self, ChunkPut::Completed { .. })
    }
}
