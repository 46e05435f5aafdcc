//! Storage error types.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Unknown upload: {0}")]
    UnknownUpload(String),

    #[error("Invalid chunk: {0}")]
    InvalidChunk(String),

    #[error("Chunk write failed: {0}")]
    WriteFailed(String),

    #[error("Assembly failed: {0}")]
    AssemblyFailed(String),

    #[error("Result write failed: {0}")]
    ResultWriteFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StorageError {
    pub fn unknown_upload(id: impl Into<String>) -> Self {
        Self::UnknownUpload(id.into())
    }

    pub fn invalid_chunk(msg: impl Into<String>) -> Self {
        Self::InvalidChunk(msg.into())
    }

    pub fn write_failed(msg: impl Into<String>) -> Self {
        Self::WriteFailed(msg.into())
    }

    pub fn assembly_failed(msg: impl Into<String>) -> Self {
        Self::AssemblyFailed(msg.into())
    }

    /// Check if the caller can recover by re-sending the chunk.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StorageError::WriteFailed(_) | StorageError::AssemblyFailed(_) | StorageError::Io(_)
        )
    }
}
